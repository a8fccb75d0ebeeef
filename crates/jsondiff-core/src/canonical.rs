use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};

use crate::Node;

/// Renders a document as the text that gets diffed.
///
/// Output is two-space indented JSON with sorted object keys, followed by a
/// line break and one empty line.
///
/// ```
/// # use jsondiff_core::{canonicalize, Node};
/// let node = Node::from_json_str("{\"b\":[1],\"a\":2.0}")?;
/// assert_eq!(canonicalize(&node)?, "{\n  \"a\": 2,\n  \"b\": [\n    1\n  ]\n}\n\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn canonicalize(node: &Node) -> Result<String, serde_json::Error> {
    let mut buf = Vec::with_capacity(128);
    let mut serializer = Serializer::with_formatter(&mut buf, CanonicalFormatter::default());
    node.serialize(&mut serializer)?;
    buf.extend_from_slice(b"\n\n");
    String::from_utf8(buf).map_err(serde::ser::Error::custom)
}

/// Two-space pretty printing that writes negative zero as `-0`.
#[derive(Default)]
struct CanonicalFormatter(PrettyFormatter<'static>);

impl Formatter for CanonicalFormatter {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if value == 0.0 && value.is_sign_negative() {
            return writer.write_all(b"-0");
        }
        self.0.write_f64(writer, value)
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object_value(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scalars_take_two_lines() {
        assert_eq!(canonicalize(&Node::Null).unwrap(), "null\n\n");
        assert_eq!(canonicalize(&Node::from_json_str("\"x\"").unwrap()).unwrap(), "\"x\"\n\n");
    }

    #[test]
    fn empty_containers_stay_on_one_line() {
        assert_eq!(canonicalize(&Node::from_json_str("{}").unwrap()).unwrap(), "{}\n\n");
        assert_eq!(canonicalize(&Node::from_json_str("[]").unwrap()).unwrap(), "[]\n\n");
    }

    #[test]
    fn negative_zero_prints_as_an_integer() {
        let node = Node::from_json_str(r#"{"a":-0.0,"b":[-0.0,0,1.5]}"#).unwrap();
        assert_eq!(
            canonicalize(&node).unwrap(),
            "{\n  \"a\": -0,\n  \"b\": [\n    -0,\n    0,\n    1.5\n  ]\n}\n\n"
        );
    }

    proptest! {
        #[test]
        fn key_order_does_not_matter(pairs in proptest::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0..8)) {
            let forward: Vec<String> = pairs.iter().map(|(k, v)| format!("\"{k}\":{v}")).collect();
            let backward: Vec<String> = forward.iter().rev().cloned().collect();
            let a = Node::from_json_str(&format!("{{{}}}", forward.join(","))).unwrap();
            let b = Node::from_json_str(&format!("{{{}}}", backward.join(","))).unwrap();
            prop_assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
        }
    }
}
