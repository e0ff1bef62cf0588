//! Native values produced by [`unmarshal`](crate::unmarshal).
//!
//! Dictionaries are `Vec<(Value, Value)>` in wire order. Keys are always
//! basic values.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A decoded D-Bus value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    /// Strings and object paths.
    String(String),
    Array(Vec<Value>),
    /// Key-value pairs in wire order.
    Dict(Vec<(Value, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(n) => u64::try_from(*n).ok(),
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::UInt(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a dictionary entry by its string key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dict()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Text used when this value is a map key in serialized output.
    fn key_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Hashable form of a basic dictionary key.
#[derive(Debug, PartialEq, Eq, Hash)]
enum KeyForm {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(u64),
    String(String),
}

impl KeyForm {
    /// `None` for keys that never compare equal (NaN) and for containers.
    fn of(key: &Value) -> Option<Self> {
        match key {
            Value::Null => Some(KeyForm::Null),
            Value::Bool(b) => Some(KeyForm::Bool(*b)),
            Value::Int(n) => Some(KeyForm::Int(*n)),
            Value::UInt(n) => Some(KeyForm::UInt(*n)),
            Value::Double(n) if n.is_nan() => None,
            // -0.0 == 0.0
            Value::Double(n) if *n == 0.0 => Some(KeyForm::Double(0.0f64.to_bits())),
            Value::Double(n) => Some(KeyForm::Double(n.to_bits())),
            Value::String(s) => Some(KeyForm::String(s.clone())),
            Value::Array(_) | Value::Dict(_) => None,
        }
    }
}

/// Collects dictionary entries in wire order. A repeated key keeps its first
/// position and takes the latest value.
#[derive(Debug, Default)]
pub(crate) struct DictBuilder {
    entries: Vec<(Value, Value)>,
    index: HashMap<KeyForm, usize>,
}

impl DictBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: Value, value: Value) {
        let Some(form) = KeyForm::of(&key) else {
            self.entries.push((key, value));
            return;
        };
        match self.index.get(&form) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(form, self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub(crate) fn finish(self) -> Value {
        Value::Dict(self.entries)
    }
}

/// Compact JSON-like text, mostly for logs and error messages.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::UInt(n) => write!(f, "{n}"),
            Value::Double(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Dict(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{key}:{value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Dictionaries serialize as maps with stringified keys, so a decoded
/// `a{sa{sv}}` becomes a nested JSON object.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Double(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(&key.key_string(), value)?;
                }
                map.end()
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
