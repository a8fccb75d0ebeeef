//! Rewrites of a user query into the query that masks its locations.
use std::sync::OnceLock;

use crate::query::{Operator, Query};

static NULL_LITERAL: OnceLock<Query> = OnceLock::new();

/// The `null` literal, parsed on first use and shared afterwards.
pub(crate) fn null_literal() -> &'static Query {
    NULL_LITERAL.get_or_init(|| Query::parse("null").expect("null is a valid query"))
}

/// Wraps `query` in a single `del(...)` call, so every location it selects is removed.
///
/// ```
/// # use jsondiff_core::{to_deletion, Query};
/// let rewritten = to_deletion(&Query::parse(".b, .c")?);
/// assert_eq!(rewritten.to_string(), "del(.b, .c)");
/// # Ok::<(), jsondiff_core::QueryParseError>(())
/// ```
#[must_use]
pub fn to_deletion(query: &Query) -> Query {
    Query::call("del", vec![query.clone()])
}

/// Assigns `null` to each term of `query`, chaining the assignments with pipes
/// in source order.
///
/// ```
/// # use jsondiff_core::{to_nulling, Query};
/// let rewritten = to_nulling(&Query::parse(".b, .c")?);
/// assert_eq!(rewritten.to_string(), ".b = null | .c = null");
/// # Ok::<(), jsondiff_core::QueryParseError>(())
/// ```
#[must_use]
pub fn to_nulling(query: &Query) -> Query {
    let null = null_literal();
    query
        .decompose()
        .into_iter()
        .rev()
        .map(|term| Query::composite(Operator::Assign, term.clone(), null.clone()))
        .reduce(|rest, assignment| Query::composite(Operator::Pipe, assignment, rest))
        .expect("a query has at least one term")
}
