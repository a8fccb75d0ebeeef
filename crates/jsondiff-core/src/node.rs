use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::{DecodeError, Number};

/// Represents a decoded JSON document.
///
/// Objects keep their keys in a [`BTreeMap`], so iteration and serialization
/// order is always the sorted key order regardless of the input layout.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number represented as IEEE-754 double precision.
    Number(Number),
    /// JSON string.
    String(String),
    /// JSON array.
    Array(Vec<Node>),
    /// JSON object with deterministic key ordering.
    Object(BTreeMap<String, Node>),
}

impl Node {
    /// Parses a JSON string into a node.
    ///
    /// ```
    /// # use jsondiff_core::Node;
    /// let node = Node::from_json_str("{\"hello\":\"world\"}")?;
    /// assert!(matches!(node, Node::Object(_)));
    /// # Ok::<(), jsondiff_core::DecodeError>(())
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self, DecodeError> {
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Parses a YAML string into a node.
    ///
    /// ```
    /// # use jsondiff_core::Node;
    /// let node = Node::from_yaml_str("---\nanswer: 42\n")?;
    /// assert!(matches!(node, Node::Object(_)));
    /// # Ok::<(), jsondiff_core::DecodeError>(())
    /// ```
    pub fn from_yaml_str(input: &str) -> Result<Self, DecodeError> {
        let value: YamlValue = serde_yaml::from_str(input)?;
        Self::from_yaml_value(value)
    }

    /// Converts a serde JSON value into a [`Node`].
    pub fn from_json_value(value: JsonValue) -> Result<Self, DecodeError> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(v) => Ok(Self::Bool(v)),
            JsonValue::Number(num) => {
                let text = num.to_string();
                let Some(as_f64) = num.as_f64() else {
                    return Err(DecodeError::NumberOutOfRange { value: text });
                };
                Ok(Self::Number(Number::new(as_f64)?))
            }
            JsonValue::String(s) => Ok(Self::String(s)),
            JsonValue::Array(values) => {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    items.push(Self::from_json_value(value)?);
                }
                Ok(Self::Array(items))
            }
            JsonValue::Object(map) => {
                let mut object = BTreeMap::new();
                for (key, value) in map {
                    object.insert(key, Self::from_json_value(value)?);
                }
                Ok(Self::Object(object))
            }
        }
    }

    fn from_yaml_value(value: YamlValue) -> Result<Self, DecodeError> {
        match value {
            YamlValue::Null => Ok(Self::Null),
            YamlValue::Bool(v) => Ok(Self::Bool(v)),
            YamlValue::Number(num) => {
                if let Some(f) = num.as_f64() {
                    return Ok(Self::Number(Number::new(f)?));
                }
                if let Some(i) = num.as_i64() {
                    return Ok(Self::Number(Number::new(i as f64)?));
                }
                if let Some(u) = num.as_u64() {
                    return Ok(Self::Number(Number::new(u as f64)?));
                }
                Err(DecodeError::NumberOutOfRange { value: num.to_string() })
            }
            YamlValue::String(s) => Ok(Self::String(s)),
            YamlValue::Sequence(seq) => {
                let mut items = Vec::with_capacity(seq.len());
                for value in seq {
                    items.push(Self::from_yaml_value(value)?);
                }
                Ok(Self::Array(items))
            }
            YamlValue::Mapping(map) => {
                let mut object = BTreeMap::new();
                for (key, value) in map {
                    let key = match key {
                        YamlValue::String(s) => s,
                        other => {
                            return Err(DecodeError::NonStringYamlKey {
                                found: format!("{other:?}"),
                            });
                        }
                    };
                    object.insert(key, Self::from_yaml_value(value)?);
                }
                Ok(Self::Object(object))
            }
            YamlValue::Tagged(tagged) => {
                Err(DecodeError::UnsupportedYamlTag { tag: tagged.tag.to_string() })
            }
        }
    }

    /// Converts the node into a serde JSON value.
    ///
    /// ```
    /// # use jsondiff_core::Node;
    /// let node = Node::from_json_str("[1, \"two\"]")?;
    /// assert_eq!(node.to_json_value(), serde_json::json!([1, "two"]));
    /// # Ok::<(), jsondiff_core::DecodeError>(())
    /// ```
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Number(n) => JsonValue::Number(n.to_json_number()),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Array(values) => JsonValue::Array(values.iter().map(Self::to_json_value).collect()),
            Self::Object(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json_value());
                }
                JsonValue::Object(object)
            }
        }
    }

    /// Returns the jq type name of the node.
    ///
    /// ```
    /// # use jsondiff_core::Node;
    /// assert_eq!(Node::Null.kind(), "null");
    /// assert_eq!(Node::from_json_str("{}")?.kind(), "object");
    /// # Ok::<(), jsondiff_core::DecodeError>(())
    /// ```
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Only `null` and `false` are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Null | Self::Bool(false))
    }
}

impl TryFrom<JsonValue> for Node {
    type Error = DecodeError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json_value(value)
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Number(n) => n.to_json_number().serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Self::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (key, value) in object {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Compact JSON text, as jq prints values inside messages.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::{
        collection::{btree_map, vec},
        prelude::*,
        string::string_regex,
    };

    fn arb_json_value() -> impl Strategy<Value = JsonValue> {
        let leaf = prop_oneof![
            Just(JsonValue::Null),
            any::<bool>().prop_map(JsonValue::Bool),
            proptest::num::f64::ANY.prop_filter_map("finite", |f| {
                if f.is_finite() {
                    serde_json::Number::from_f64(f).map(JsonValue::Number)
                } else {
                    None
                }
            }),
            string_regex("[a-zA-Z0-9]{0,8}").unwrap().prop_map(JsonValue::String),
        ];
        leaf.prop_recursive(4, 8, 4, move |inner| {
            prop_oneof![
                vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
                btree_map(string_regex("[a-zA-Z0-9]{1,8}").unwrap(), inner, 0..4).prop_map(|map| {
                    let mut object = serde_json::Map::new();
                    for (k, v) in map {
                        object.insert(k, v);
                    }
                    JsonValue::Object(object)
                }),
            ]
        })
    }

    #[test]
    fn empty_json_input_is_an_error() {
        let err = Node::from_json_str("   \n\t").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn json_object_roundtrip() {
        let node = Node::from_json_str("{\"a\":1,\"b\":true}").unwrap();
        let value = node.to_json_value();
        assert_eq!(value["a"].as_f64().unwrap(), 1.0);
        assert!(value["b"].as_bool().unwrap());
    }

    #[test]
    fn json_number_to_json_value_is_minimal() {
        let node = Node::from_json_str("5").unwrap();
        assert_eq!(node.to_json_value(), serde_json::json!(5));

        let neg_zero = Node::from_json_str("-0").unwrap();
        assert_eq!(serde_json::to_string(&neg_zero).unwrap(), "-0.0");
    }

    #[test]
    fn json_number_out_of_range_yields_error() {
        let err = Node::from_json_str("1e400").unwrap_err();
        match err {
            DecodeError::NumberOutOfRange { .. } | DecodeError::Json(_) => {}
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn yaml_non_string_key_errors() {
        let err = Node::from_yaml_str("? [1, 2]: 3").unwrap_err();
        let DecodeError::NonStringYamlKey { .. } = err else {
            panic!("expected NonStringYamlKey error");
        };
    }

    #[test]
    fn display_is_compact_json_with_sorted_keys() {
        let node = Node::from_json_str("{\"b\": [1, 2.5], \"a\": \"x\"}").unwrap();
        assert_eq!(node.to_string(), "{\"a\":\"x\",\"b\":[1,2.5]}");
    }

    #[test]
    fn truthiness_matches_jq() {
        assert!(!Node::Null.is_truthy());
        assert!(!Node::Bool(false).is_truthy());
        assert!(Node::Number(Number::from(0)).is_truthy());
        assert!(Node::String(String::new()).is_truthy());
    }

    proptest! {
        #[test]
        fn json_roundtrips_through_node(value in arb_json_value()) {
            let node = Node::from_json_value(value).unwrap();
            let reconstructed = node.to_json_value();
            let node_again = Node::from_json_value(reconstructed.clone()).unwrap();
            prop_assert_eq!(node_again.clone(), node);
            prop_assert_eq!(node_again.to_json_value(), reconstructed);
        }
    }
}
