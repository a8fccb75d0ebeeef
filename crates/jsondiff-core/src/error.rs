use std::fmt;

use thiserror::Error;

use crate::query::QueryError;

/// Errors that can occur while decoding external data into [`Node`](crate::Node).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The provided JSON input was invalid.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The provided YAML input was invalid.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The input could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Encountered a number that cannot be represented as an IEEE-754 f64.
    #[error("number {value} cannot be represented as f64")]
    NumberOutOfRange {
        /// The textual representation of the offending number.
        value: String,
    },
    /// YAML maps may only contain string keys.
    #[error("unsupported YAML key type: {found}")]
    NonStringYamlKey {
        /// A description of the key that triggered the error.
        found: String,
    },
    /// YAML tags have no JSON counterpart and are rejected.
    #[error("unsupported YAML tag: {tag}")]
    UnsupportedYamlTag {
        /// The tag identifier encountered in the document.
        tag: String,
    },
    /// Attempted to construct a [`Number`](crate::Number) that is not finite.
    #[error("non-finite number encountered: {value}")]
    NotFinite {
        /// The offending numeric value.
        value: f64,
    },
}

/// Errors emitted when constructing [`DiffOptions`](crate::DiffOptions).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    /// Only and ignore queries are mutually exclusive.
    #[error("either of only one of ignore or only must be specified")]
    OnlyAndIgnore,
}

/// Identifies which document of a diff an error belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// The first (`from`) document.
    Left,
    /// The second (`to`) document.
    Right,
}

impl Side {
    fn operand(self) -> &'static str {
        match self {
            Self::Left => "lhs",
            Self::Right => "rhs",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// Errors returned by [`diff`](crate::diff) and its convenience wrappers.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The options combine settings that cannot be used together.
    #[error(transparent)]
    Options(#[from] OptionsError),
    /// One of the inputs could not be decoded.
    #[error("{side}: {source}")]
    Decode {
        /// The input that failed.
        side: Side,
        /// The underlying decoding failure.
        #[source]
        source: DecodeError,
    },
    /// The selection query failed while evaluating one side.
    #[error("modify({}): {source}", side.operand())]
    Evaluation {
        /// The document the query was evaluated against.
        side: Side,
        /// The error value emitted by the query.
        #[source]
        source: QueryError,
    },
    /// A (possibly filtered) document could not be serialized.
    #[error("toJSON({}): {source}", side.operand())]
    Serialization {
        /// The document that failed to serialize.
        side: Side,
        /// The serializer failure.
        #[source]
        source: serde_json::Error,
    },
}

impl DiffError {
    /// Returns the side the error is attributed to, if any.
    #[must_use]
    pub fn side(&self) -> Option<Side> {
        match self {
            Self::Options(_) => None,
            Self::Decode { side, .. }
            | Self::Evaluation { side, .. }
            | Self::Serialization { side, .. } => Some(*side),
        }
    }
}
