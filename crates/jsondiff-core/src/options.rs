use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{OptionsError, Query};

/// Controls how an ignore query masks the locations it selects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IgnoreStrategy {
    /// Remove the selected locations with `del(query)` (default).
    #[default]
    Delete,
    /// Set every selected location to `null`, one term at a time.
    #[serde(rename = "null")]
    Nullify,
}

impl fmt::Display for IgnoreStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreStrategy::Delete => f.write_str("delete"),
            IgnoreStrategy::Nullify => f.write_str("null"),
        }
    }
}

/// The filtering a diff applies to both documents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionMode<'a> {
    /// Compare the documents as they are.
    All,
    /// Compare only what the query yields.
    Only(&'a Query),
    /// Compare the documents with the query's locations masked out.
    Ignore(&'a Query),
}

/// Configuration passed to [`diff`](crate::diff).
#[derive(Clone, Debug, Default)]
pub struct DiffOptions {
    only: Option<Query>,
    ignore: Option<Query>,
    ignore_strategy: IgnoreStrategy,
}

impl DiffOptions {
    /// Creates options from optional only/ignore queries without validating them.
    ///
    /// Conflicts surface when the options are used, matching the command line,
    /// which forwards whatever flags it received.
    ///
    /// ```
    /// # use jsondiff_core::{DiffOptions, OptionsError, Query};
    /// let only = Query::parse(".a")?;
    /// let ignore = Query::parse(".b")?;
    /// let opts = DiffOptions::new(Some(only), Some(ignore));
    /// assert_eq!(opts.selection().unwrap_err(), OptionsError::OnlyAndIgnore);
    /// # Ok::<(), jsondiff_core::QueryParseError>(())
    /// ```
    #[must_use]
    pub fn new(only: Option<Query>, ignore: Option<Query>) -> Self {
        Self { only, ignore, ignore_strategy: IgnoreStrategy::default() }
    }

    /// Returns the only query, if any.
    #[must_use]
    pub fn only(&self) -> Option<&Query> {
        self.only.as_ref()
    }

    /// Returns the ignore query, if any.
    #[must_use]
    pub fn ignore(&self) -> Option<&Query> {
        self.ignore.as_ref()
    }

    /// Returns how ignored locations are masked.
    ///
    /// ```
    /// # use jsondiff_core::{DiffOptions, IgnoreStrategy};
    /// assert_eq!(DiffOptions::default().ignore_strategy(), IgnoreStrategy::Delete);
    /// ```
    #[must_use]
    pub fn ignore_strategy(&self) -> IgnoreStrategy {
        self.ignore_strategy
    }

    /// Restricts the comparison to what `query` yields.
    ///
    /// ```
    /// # use jsondiff_core::{DiffOptions, Query, SelectionMode};
    /// let query = Query::parse(".d")?;
    /// let opts = DiffOptions::default().with_only(query.clone()).expect("only");
    /// assert_eq!(opts.selection().unwrap(), SelectionMode::Only(&query));
    /// # Ok::<(), jsondiff_core::QueryParseError>(())
    /// ```
    pub fn with_only(mut self, query: Query) -> Result<Self, OptionsError> {
        self.only = Some(query);
        self.validate()?;
        Ok(self)
    }

    /// Masks out the locations `query` selects before comparing.
    ///
    /// ```
    /// # use jsondiff_core::{DiffOptions, OptionsError, Query};
    /// let err = DiffOptions::default()
    ///     .with_ignore(Query::parse(".b")?)
    ///     .and_then(|opts| opts.with_only(Query::parse(".d").expect("query")))
    ///     .unwrap_err();
    /// assert_eq!(err, OptionsError::OnlyAndIgnore);
    /// # Ok::<(), jsondiff_core::QueryParseError>(())
    /// ```
    pub fn with_ignore(mut self, query: Query) -> Result<Self, OptionsError> {
        self.ignore = Some(query);
        self.validate()?;
        Ok(self)
    }

    /// Selects how ignored locations are masked.
    ///
    /// ```
    /// # use jsondiff_core::{DiffOptions, IgnoreStrategy};
    /// let opts = DiffOptions::default()
    ///     .with_ignore_strategy(IgnoreStrategy::Nullify)
    ///     .expect("strategy");
    /// assert_eq!(opts.ignore_strategy(), IgnoreStrategy::Nullify);
    /// ```
    pub fn with_ignore_strategy(mut self, strategy: IgnoreStrategy) -> Result<Self, OptionsError> {
        self.ignore_strategy = strategy;
        self.validate()?;
        Ok(self)
    }

    /// Resolves the options into the single filtering mode a diff runs with.
    pub fn selection(&self) -> Result<SelectionMode<'_>, OptionsError> {
        self.validate()?;
        Ok(match (&self.only, &self.ignore) {
            (Some(only), None) => SelectionMode::Only(only),
            (None, Some(ignore)) => SelectionMode::Ignore(ignore),
            _ => SelectionMode::All,
        })
    }

    fn validate(&self) -> Result<(), OptionsError> {
        if self.only.is_some() && self.ignore.is_some() {
            return Err(OptionsError::OnlyAndIgnore);
        }
        Ok(())
    }
}
