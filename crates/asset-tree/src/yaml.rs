//! YAML bridge
//!
//! Converts between `serde_yaml` values and [`Node`] trees so that assets
//! can be loaded, migrated and written back. YAML tags become node tags, and
//! override annotations travel as key postfixes (`Group*`, `Group!`,
//! `Group*!`).
//!
//! Scalars are carried as text. On emission, text that reads back
//! identically as null, a boolean or a number is written as that primitive;
//! everything else is written as a string. Strings whose text would read
//! back as a primitive are parsed as [`ScalarStyle::Quoted`] and stay
//! strings.

use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping as YamlMapping, Number, Value};

use crate::error::YamlError;
use crate::node::{Mapping, Node, NodeKind, ScalarStyle};
use crate::overrides::OverrideState;

/// Parse a YAML document into a tree
///
/// # Errors
/// Returns [`YamlError`] if the text is not valid YAML or uses collection keys
pub fn parse_document(text: &str) -> Result<Node, YamlError> {
    let value: Value = serde_yaml::from_str(text)?;
    from_yaml_value(&value)
}

/// Emit a tree as a YAML document
///
/// # Errors
/// Returns [`YamlError::Yaml`] if serde_yaml cannot emit the value
pub fn emit_document(node: &Node) -> Result<String, YamlError> {
    Ok(serde_yaml::to_string(&to_yaml_value(node))?)
}

/// Convert a YAML value into a tree node
///
/// # Errors
/// Returns [`YamlError`] on collection keys or keys that are only a postfix
pub fn from_yaml_value(value: &Value) -> Result<Node, YamlError> {
    let node = match value {
        Value::Null => Node::scalar("null"),
        Value::Bool(b) => Node::scalar(b.to_string()),
        Value::Number(n) => Node::scalar(n.to_string()),
        Value::String(s) if matches!(scalar_value(s), Value::String(_)) => Node::scalar(s.clone()),
        Value::String(s) => Node::quoted_scalar(s.clone()),
        Value::Sequence(items) => Node::sequence(
            items
                .iter()
                .map(from_yaml_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Mapping(map) => Node::from(mapping_from_yaml(map)?),
        Value::Tagged(tagged) => {
            let inner = from_yaml_value(&tagged.value)?;
            inner.with_tag(tagged.tag.to_string())
        }
    };
    Ok(node)
}

fn mapping_from_yaml(map: &YamlMapping) -> Result<Mapping, YamlError> {
    let mut mapping = Mapping::new();
    for (raw_key, raw_value) in map {
        let raw = key_text(raw_key)?;
        let (key, state) = OverrideState::split_key(&raw);
        if key.is_empty() {
            return Err(YamlError::EmptyKey(raw));
        }
        mapping.insert(key, from_yaml_value(raw_value)?);
        if state != OverrideState::Base {
            mapping.set_override(key, state);
        }
    }
    Ok(mapping)
}

fn key_text(key: &Value) -> Result<String, YamlError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(YamlError::UnsupportedKey(format!("{other:?}"))),
    }
}

/// Convert a tree node into a YAML value
#[must_use]
pub fn to_yaml_value(node: &Node) -> Value {
    let value = match node.kind() {
        NodeKind::Scalar(text) => match node.scalar_style() {
            ScalarStyle::Plain => scalar_value(text),
            ScalarStyle::Quoted => Value::String(text.clone()),
        },
        NodeKind::Sequence(items) => Value::Sequence(items.iter().map(to_yaml_value).collect()),
        NodeKind::Mapping(map) => {
            let mut out = YamlMapping::new();
            for (key, child) in map.iter() {
                let postfix = map.override_of(key).map_or("", OverrideState::postfix);
                out.insert(Value::String(format!("{key}{postfix}")), to_yaml_value(child));
            }
            Value::Mapping(out)
        }
    };

    match node.tag() {
        Some(tag) if !tag.trim_start_matches('!').is_empty() => {
            Value::Tagged(Box::new(TaggedValue {
                tag: Tag::new(tag),
                value,
            }))
        }
        _ => value,
    }
}

fn scalar_value(text: &str) -> Value {
    match text {
        "null" | "~" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(i) = text.parse::<i64>() {
        if i.to_string() == text {
            return Value::Number(i.into());
        }
    }
    if let Ok(u) = text.parse::<u64>() {
        if u.to_string() == text {
            return Value::Number(u.into());
        }
    }
    if let Ok(f) = text.parse::<f64>() {
        let number = Number::from(f);
        if f.is_finite() && number.to_string() == text {
            return Value::Number(number);
        }
    }
    Value::String(text.to_string())
}
