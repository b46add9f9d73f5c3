//! Tagged-tree helpers
//!
//! The tree a document parses into is `serde_json::Value` (with the
//! `preserve_order` feature, so objects keep document order). This module
//! adds the pieces navigation needs on top of it:
//! - `NodeKind`: the variant tag of a node, displayable in error messages
//! - `Expect`: an expected-type descriptor with an "or null" flag, compared
//!   against a node's tag during typed navigation
//! - `yaml_to_tree`: conversion of parsed YAML into the same tree shape

use std::fmt;

use serde_json::Value;
use thiserror::Error;

// =============================================================================
// NODE KINDS
// =============================================================================

/// The variant tag of a tree node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl NodeKind {
    /// Tag of the given node
    pub fn of(value: &Value) -> NodeKind {
        match value {
            Value::Null => NodeKind::Null,
            Value::Bool(_) => NodeKind::Boolean,
            Value::Number(_) => NodeKind::Number,
            Value::String(_) => NodeKind::String,
            Value::Array(_) => NodeKind::Array,
            Value::Object(_) => NodeKind::Object,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Null => "Null",
            NodeKind::Boolean => "Boolean",
            NodeKind::Number => "Number",
            NodeKind::String => "String",
            NodeKind::Array => "Array",
            NodeKind::Object => "Object",
        };
        f.write_str(name)
    }
}

// =============================================================================
// EXPECTED-TYPE DESCRIPTOR
// =============================================================================

/// Expected type of a navigated node
///
/// `nullable` marks the absence-of-value node (Null) as acceptable in
/// addition to the expected kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Expect {
    pub kind: NodeKind,
    pub nullable: bool,
}

impl Expect {
    pub const NULL: Expect = Expect::required(NodeKind::Null);
    pub const BOOLEAN: Expect = Expect::required(NodeKind::Boolean);
    pub const NUMBER: Expect = Expect::required(NodeKind::Number);
    pub const STRING: Expect = Expect::required(NodeKind::String);
    pub const ARRAY: Expect = Expect::required(NodeKind::Array);
    pub const OBJECT: Expect = Expect::required(NodeKind::Object);

    pub const fn required(kind: NodeKind) -> Expect {
        Expect {
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(kind: NodeKind) -> Expect {
        Expect {
            kind,
            nullable: true,
        }
    }

    /// Whether the node's tag satisfies this expectation
    pub fn matches(&self, value: &Value) -> bool {
        NodeKind::of(value) == self.kind || (self.nullable && value.is_null())
    }
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{} or null", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

// =============================================================================
// YAML CONVERSION
// =============================================================================

/// Failure converting parsed YAML into the tree shape
#[derive(Debug, Error)]
pub enum YamlTreeError {
    #[error("unsupported YAML mapping key: sequences and mappings cannot be used as object keys")]
    UnsupportedKey,
}

/// Convert a parsed YAML value into the tagged tree
///
/// Scalar mapping keys that are not strings (numbers, booleans, null) are
/// stringified; structured keys are rejected. Non-finite floats have no
/// Number representation and become Null. `!tag` wrappers are transparent.
pub fn yaml_to_tree(value: serde_yaml::Value) -> Result<Value, YamlTreeError> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(
            seq.into_iter()
                .map(yaml_to_tree)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = serde_json::Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, yaml_to_tree(value)?);
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_tree(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else if let Some(f) = n.as_f64().and_then(serde_json::Number::from_f64) {
        Value::Number(f)
    } else {
        // .nan / .inf
        Value::Null
    }
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, YamlTreeError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => {
            Err(YamlTreeError::UnsupportedKey)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn kind_of_each_variant() {
        assert_eq!(NodeKind::of(&json!(null)), NodeKind::Null);
        assert_eq!(NodeKind::of(&json!(true)), NodeKind::Boolean);
        assert_eq!(NodeKind::of(&json!(1.5)), NodeKind::Number);
        assert_eq!(NodeKind::of(&json!("x")), NodeKind::String);
        assert_eq!(NodeKind::of(&json!([])), NodeKind::Array);
        assert_eq!(NodeKind::of(&json!({})), NodeKind::Object);
    }

    #[test]
    fn expect_matches_kind_and_nullable() {
        assert!(Expect::STRING.matches(&json!("x")));
        assert!(!Expect::STRING.matches(&json!(1)));
        assert!(!Expect::STRING.matches(&json!(null)));
        assert!(Expect::nullable(NodeKind::String).matches(&json!(null)));
        assert!(Expect::nullable(NodeKind::String).matches(&json!("x")));
        assert!(!Expect::nullable(NodeKind::String).matches(&json!(1)));
    }

    #[test]
    fn expect_display() {
        assert_eq!(Expect::NUMBER.to_string(), "Number");
        assert_eq!(Expect::nullable(NodeKind::Number).to_string(), "Number or null");
    }

    #[test]
    fn yaml_conversion_preserves_mapping_order() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("zeta: 1\nalpha: 2\nmiddle: 3\n").unwrap();
        let tree = yaml_to_tree(yaml).unwrap();
        let keys: Vec<&str> = tree
            .as_object()
            .unwrap()
            .keys()
            .map(|k| k.as_str())
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "middle"]);
    }

    #[test]
    fn yaml_scalar_keys_are_stringified() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
        let tree = yaml_to_tree(yaml).unwrap();
        assert_eq!(tree, json!({"1": "one", "true": "yes"}));
    }

    #[test]
    fn yaml_structured_key_is_rejected() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("[1, 2]: bad\n").unwrap();
        assert!(yaml_to_tree(yaml).is_err());
    }

    #[test]
    fn yaml_numbers_and_nested_values() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("count: 3\nratio: 0.5\nitems:\n  - a\n  - b\n").unwrap();
        let tree = yaml_to_tree(yaml).unwrap();
        assert_eq!(tree, json!({"count": 3, "ratio": 0.5, "items": ["a", "b"]}));
    }
}
