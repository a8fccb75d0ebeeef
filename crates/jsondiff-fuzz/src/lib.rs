//! Fuzzing harnesses for `jsondiff`.
//!
//! Each public function accepts raw bytes and drives one stage of the
//! pipeline: query parsing and evaluation, canonical printing, or the full
//! filtered diff. Recoverable errors are swallowed; only panics count.
//!
//! # Examples
//!
//! ```
//! jsondiff_fuzz::fuzz_query_parse(b".a[] | select(. == 1)");
//! jsondiff_fuzz::fuzz_canonicalization(b"{\"a\":1}");
//! jsondiff_fuzz::fuzz_diff(&[1, 2, 3, 4]);
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use arbitrary::Unstructured;
use jsondiff_core::{
    canonicalize, diff_from_values, evaluate, to_deletion, to_nulling, DiffOptions, IgnoreStrategy,
    Node, Query,
};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

const MAX_DEPTH: usize = 4;
const MAX_ARRAY_LEN: u8 = 6;
const MAX_OBJECT_LEN: u8 = 6;
const MAX_STRING_LEN: u8 = 12;
/// Keys are drawn from a small alphabet so generated queries hit real fields.
const KEYS: &[&str] = &["a", "b", "c", "d", "items", "name"];

/// Parses arbitrary text as a query and, when it parses, checks that its
/// printed form parses back to the same tree before running it on a document.
///
/// ```
/// jsondiff_fuzz::fuzz_query_parse(b".items[0:2] | .name");
/// ```
pub fn fuzz_query_parse(data: &[u8]) {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(query) = Query::parse(text) else {
        return;
    };
    let printed = query.to_string();
    let reparsed = Query::parse(&printed).expect("printed query parses");
    assert_eq!(query, reparsed, "printing changed {text:?} into {printed:?}");

    let doc = sample_document();
    let _ = evaluate(&query, doc.clone());
    let _ = evaluate(&to_deletion(&query), doc.clone());
    let _ = evaluate(&to_nulling(&query), doc);
}

/// Feeds arbitrary bytes through decoding and canonical printing.
///
/// ```
/// jsondiff_fuzz::fuzz_canonicalization(b"{\"key\":\"value\"}");
/// ```
pub fn fuzz_canonicalization(data: &[u8]) {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for node in [Node::from_json_str(text), Node::from_yaml_str(text)].into_iter().flatten() {
        if let Ok(printed) = canonicalize(&node) {
            assert!(printed.ends_with("\n\n"));
        }
    }
}

/// Diffs randomly generated documents under a randomly generated selection.
///
/// ```
/// jsondiff_fuzz::fuzz_diff(b"seed");
/// ```
pub fn fuzz_diff(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    let (Some(lhs), Some(rhs)) = (random_node(&mut unstructured), random_node(&mut unstructured))
    else {
        return;
    };
    let Ok(options) = random_options(&mut unstructured) else {
        return;
    };
    if let Ok(rendered) = diff_from_values(lhs.clone(), rhs, &options) {
        if !rendered.is_empty() {
            assert!(rendered.starts_with("--- from\n+++ to\n@@ -"));
        }
    }
    if let Ok(rendered) = diff_from_values(lhs.clone(), lhs, &options) {
        assert!(rendered.is_empty());
    }
}

fn sample_document() -> Node {
    Node::from_json_str(r#"{"a":1,"b":[1,2,3],"c":{"d":null},"items":[{"name":"x"},{"name":"y"}]}"#)
        .expect("sample document is valid JSON")
}

fn random_options(unstructured: &mut Unstructured<'_>) -> Result<DiffOptions, arbitrary::Error> {
    let query = random_query(unstructured, 0)?;
    let strategy =
        if unstructured.arbitrary()? { IgnoreStrategy::Delete } else { IgnoreStrategy::Nullify };
    let options = match unstructured.int_in_range::<u8>(0..=2)? {
        0 => DiffOptions::default(),
        1 => DiffOptions::new(Some(query), None),
        _ => DiffOptions::new(None, Some(query)),
    };
    options.with_ignore_strategy(strategy).map_err(|_| arbitrary::Error::IncorrectFormat)
}

fn random_query(unstructured: &mut Unstructured<'_>, depth: usize) -> Result<Query, arbitrary::Error> {
    let source = random_query_source(unstructured, depth)?;
    Query::parse(&source).map_err(|_| arbitrary::Error::IncorrectFormat)
}

fn random_query_source(unstructured: &mut Unstructured<'_>, depth: usize) -> Result<String, arbitrary::Error> {
    let key = *unstructured.choose(KEYS)?;
    let leaf = match unstructured.int_in_range::<u8>(0..=4)? {
        0 => format!(".{key}"),
        1 => format!(".{key}[]"),
        2 => format!(".[{}]", unstructured.int_in_range::<i8>(-3..=3)?),
        3 => format!(".{key}?"),
        _ => ".".to_string(),
    };
    if depth >= 2 {
        return Ok(leaf);
    }
    Ok(match unstructured.int_in_range::<u8>(0..=3)? {
        0 => leaf,
        1 => format!("{leaf} | {}", random_query_source(unstructured, depth + 1)?),
        2 => format!("{leaf}, {}", random_query_source(unstructured, depth + 1)?),
        _ => format!("select({leaf} == null)"),
    })
}

fn random_node(unstructured: &mut Unstructured<'_>) -> Option<Node> {
    let value = json_value_from_unstructured(unstructured, 0).ok()?;
    Node::from_json_value(value).ok()
}

fn json_value_from_unstructured(
    unstructured: &mut Unstructured<'_>,
    depth: usize,
) -> Result<JsonValue, arbitrary::Error> {
    if depth >= MAX_DEPTH {
        return json_leaf(unstructured);
    }

    match unstructured.int_in_range::<u8>(0..=5)? {
        0..=3 => json_leaf(unstructured),
        4 => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_ARRAY_LEN)?);
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(json_value_from_unstructured(unstructured, depth + 1)?);
            }
            Ok(JsonValue::Array(items))
        }
        _ => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_OBJECT_LEN)?);
            let mut map = JsonMap::new();
            for _ in 0..len {
                let key = (*unstructured.choose(KEYS)?).to_string();
                let value = json_value_from_unstructured(unstructured, depth + 1)?;
                map.insert(key, value);
            }
            Ok(JsonValue::Object(map))
        }
    }
}

fn json_leaf(unstructured: &mut Unstructured<'_>) -> Result<JsonValue, arbitrary::Error> {
    match unstructured.int_in_range::<u8>(0..=3)? {
        0 => Ok(JsonValue::Null),
        1 => Ok(JsonValue::Bool(unstructured.arbitrary()?)),
        2 => Ok(JsonValue::Number(random_number(unstructured)?)),
        _ => Ok(JsonValue::String(random_string(unstructured)?)),
    }
}

fn random_number(unstructured: &mut Unstructured<'_>) -> Result<JsonNumber, arbitrary::Error> {
    if unstructured.arbitrary()? {
        Ok(JsonNumber::from(unstructured.arbitrary::<i32>()?))
    } else {
        let numerator = f64::from(unstructured.arbitrary::<i32>()?);
        let denominator = f64::from(unstructured.int_in_range::<u16>(1..=1024)?);
        JsonNumber::from_f64(numerator / denominator).ok_or(arbitrary::Error::IncorrectFormat)
    }
}

fn random_string(unstructured: &mut Unstructured<'_>) -> Result<String, arbitrary::Error> {
    let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_STRING_LEN)?);
    let mut string = String::with_capacity(len);
    for _ in 0..len {
        let byte = unstructured.int_in_range::<u8>(0x20..=0x7e)?;
        string.push(char::from(byte));
    }
    Ok(string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_harness_accepts_garbage() {
        fuzz_query_parse(b"");
        fuzz_query_parse(b".a |");
        fuzz_query_parse(&[0xff, 0xfe]);
        fuzz_query_parse(b"del(.b[0]), .c.d");
    }

    #[test]
    fn canonicalization_handles_utf8() {
        fuzz_canonicalization(br"{}");
        fuzz_canonicalization(b"a: [1, 2]\n");
    }

    #[test]
    fn diff_harness_runs() {
        fuzz_diff(b"diff");
        fuzz_diff(&[7; 64]);
    }

    #[test]
    fn generated_queries_parse() {
        let data = [3_u8; 128];
        let mut unstructured = Unstructured::new(&data);
        assert!(random_query(&mut unstructured, 0).is_ok());
    }
}
