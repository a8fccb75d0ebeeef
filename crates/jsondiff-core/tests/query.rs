use jsondiff_core::{evaluate, to_deletion, to_nulling, Node, Path, PathSegment, Query, QueryError};

fn doc(text: &str) -> Node {
    Node::from_json_str(text).expect("valid JSON")
}

fn last(query: &str, input: &str) -> Result<Node, QueryError> {
    evaluate(&Query::parse(query).expect("query parses"), doc(input))
}

#[test]
fn evaluation_keeps_the_last_output() {
    assert_eq!(last(".a, .b", r#"{"a":1,"b":2}"#).unwrap(), doc("2"));
    assert_eq!(last(".[]", "[]").unwrap(), Node::Null);
    assert_eq!(last("empty", "1").unwrap(), Node::Null);
}

#[test]
fn paths_follow_iteration_and_slices() {
    let query = Query::parse(".items[].id, .tags[1:]").unwrap();
    let paths = query.paths(&doc(r#"{"items":[{"id":1},{"id":2}],"tags":["a","b","c"]}"#)).unwrap();
    assert_eq!(
        paths,
        vec![
            Path::from(vec![PathSegment::Key("items".into()), PathSegment::Index(0), PathSegment::Key("id".into())]),
            Path::from(vec![PathSegment::Key("items".into()), PathSegment::Index(1), PathSegment::Key("id".into())]),
            Path::from(vec![PathSegment::Key("tags".into()), PathSegment::Slice { start: 1, end: 3 }]),
        ]
    );
}

#[test]
fn masking_rewrites_run_on_nested_documents() {
    let input = r#"{"items":[{"id":1,"ts":"x"},{"id":2,"ts":"y"}],"etag":"z"}"#;
    let query = Query::parse(".items[].ts, .etag").unwrap();

    let deleted = evaluate(&to_deletion(&query), doc(input)).unwrap();
    assert_eq!(deleted, doc(r#"{"items":[{"id":1},{"id":2}]}"#));

    let nulled = evaluate(&to_nulling(&query), doc(input)).unwrap();
    assert_eq!(nulled, doc(r#"{"items":[{"id":1,"ts":null},{"id":2,"ts":null}],"etag":null}"#));
}

#[test]
fn errors_carry_jq_messages() {
    let err = last(".a.b", r#"{"a":[1]}"#).unwrap_err();
    assert_eq!(err.to_string(), "cannot index array with \"b\"");
    let err = last("error(\"boom\")", "null").unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert!(last(".a.b?", r#"{"a":[1]}"#).is_ok());
}

#[test]
fn deletion_removes_exactly_the_selected_elements() {
    let query = Query::parse(".[3], .[0:2]").unwrap();
    assert_eq!(evaluate(&to_deletion(&query), doc("[0,1,2,3,4]")).unwrap(), doc("[2,4]"));

    let overlapping = Query::parse(".[0:2], .[1:3]").unwrap();
    assert_eq!(evaluate(&to_deletion(&overlapping), doc("[0,1,2,3]")).unwrap(), doc("[3]"));

    let nested = Query::parse(".[1:][0], .[-1]").unwrap();
    assert_eq!(evaluate(&to_deletion(&nested), doc("[0,1,2,3]")).unwrap(), doc("[0,2]"));
}

#[test]
fn assigning_far_past_the_end_is_an_error() {
    let err = last(".[9223372036854775807] = null", "[1]").unwrap_err();
    assert_eq!(err, QueryError::IndexTooLarge);
    assert_eq!(last(".[3] = 1", "[]").unwrap(), doc("[null,null,null,1]"));
}
