//! Unified diffs of JSON documents, narrowed or masked with jq queries.
//!
//! Both documents are optionally filtered by a query, printed as
//! two-space-indented JSON with sorted keys, and compared line by line.
//! An *only* query keeps just what it selects; an *ignore* query removes
//! (or nulls) the locations it selects and keeps everything else.
//!
//! ```
//! use jsondiff_core::{diff_from_values, DiffOptions, Node, Query};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let from = Node::from_json_str(r#"{"name":"jsondiff","version":1,"built":"mon"}"#)?;
//!     let to = Node::from_json_str(r#"{"name":"jsondiff","version":2,"built":"tue"}"#)?;
//!
//!     let options = DiffOptions::default().with_ignore(Query::parse(".built")?)?;
//!     let diff = diff_from_values(from, to, &options)?;
//!     assert!(diff.contains("-  \"version\": 1\n+  \"version\": 2\n"));
//!     assert!(!diff.contains("built"));
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod canonical;
mod diff;
mod error;
mod evaluate;
mod node;
mod number;
mod options;
pub mod query;
mod rewrite;
pub mod text;

pub use canonical::canonicalize;
pub use diff::{diff, diff_from_files, diff_from_values, Format, Input};
pub use error::{DecodeError, DiffError, OptionsError, Side};
pub use evaluate::evaluate;
pub use node::Node;
pub use number::Number;
pub use options::{DiffOptions, IgnoreStrategy, SelectionMode};
pub use query::{
    FuncCall, Operator, Outputs, Path, PathSegment, Query, QueryError, QueryParseError, Suffix,
    Term, TermKind,
};
pub use rewrite::{to_deletion, to_nulling};

/// Returns the semantic version of the `jsondiff-core` crate.
///
/// ```
/// assert!(!jsondiff_core::version().is_empty());
/// ```
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
