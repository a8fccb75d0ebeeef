use tracing::trace;

use crate::query::{Query, QueryError};
use crate::Node;

/// Runs `query` against `document` and keeps the last result.
///
/// A query with no results leaves `null`. The first error stops evaluation;
/// results after it are never computed.
///
/// ```
/// # use jsondiff_core::{evaluate, Node, Query};
/// let doc = Node::from_json_str("{\"a\":1,\"b\":2}")?;
/// assert_eq!(evaluate(&Query::parse(".a, .b")?, doc.clone())?, Node::from_json_str("2")?);
/// assert_eq!(evaluate(&Query::parse("empty")?, doc)?, Node::Null);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn evaluate(query: &Query, document: Node) -> Result<Node, QueryError> {
    let mut last = Node::Null;
    let mut count = 0_usize;
    for result in query.run(document) {
        last = result?;
        count += 1;
    }
    trace!(results = count, "query evaluated");
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins() {
        let query = Query::parse("1, error(\"first\"), error(\"second\")").unwrap();
        let err = evaluate(&query, Node::Null).unwrap_err();
        assert_eq!(err.to_string(), "first");
    }

    #[test]
    fn results_after_an_error_are_not_pulled() {
        // `.[]` on a number would fail if the stream were drained past the first error.
        let query = Query::parse("error(\"stop\"), (3 | .[])").unwrap();
        let err = evaluate(&query, Node::Null).unwrap_err();
        assert_eq!(err, QueryError::Raised(Node::String("stop".into())));
    }

    #[test]
    fn keeps_the_last_of_many() {
        let doc = Node::from_json_str("[1,2,3]").unwrap();
        let query = Query::parse(".[]").unwrap();
        assert_eq!(evaluate(&query, doc).unwrap(), Node::from_json_str("3").unwrap());
    }
}
