use std::fmt;

use serde_json::Number as JsonNumber;

use crate::DecodeError;

/// Represents a JSON number using IEEE-754 double precision.
///
/// Every decoded number goes through `f64`, so `1` and `1.0` are the same
/// value and both print as `1`.
#[derive(Clone, Copy, Debug, PartialOrd)]
pub struct Number(f64);

impl Number {
    /// Creates a new [`Number`] after validating finiteness.
    ///
    /// ```
    /// # use jsondiff_core::Number;
    /// let num = Number::new(42.0)?;
    /// assert_eq!(num.get(), 42.0);
    /// assert!(Number::new(f64::NAN).is_err());
    /// # Ok::<(), jsondiff_core::DecodeError>(())
    /// ```
    pub fn new(value: f64) -> Result<Self, DecodeError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(DecodeError::NotFinite { value })
        }
    }

    /// Returns the raw floating-point value.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }

    /// Converts the number into a `serde_json::Number` using minimal integer representation when possible.
    ///
    /// ```
    /// # use jsondiff_core::Number;
    /// assert_eq!(Number::new(4.0)?.to_json_number().to_string(), "4");
    /// assert_eq!(Number::new(0.5)?.to_json_number().to_string(), "0.5");
    /// # Ok::<(), jsondiff_core::DecodeError>(())
    /// ```
    #[must_use]
    pub fn to_json_number(self) -> JsonNumber {
        if self.0.fract() == 0.0 && !(self.0 == 0.0 && self.0.is_sign_negative()) {
            if (i64::MIN as f64) <= self.0 && self.0 <= (i64::MAX as f64) {
                return JsonNumber::from(self.0 as i64);
            }
            if self.0 >= 0.0 && self.0 <= (u64::MAX as f64) {
                return JsonNumber::from(self.0 as u64);
            }
        }
        JsonNumber::from_f64(self.0).expect("finite number")
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 && self.0.is_sign_negative() {
            return f.write_str("-0");
        }
        write!(f, "{}", self.to_json_number())
    }
}
