//! Typed D-Bus values and their busctl text rendering.
//!
//! A [`DataObject`] is built bottom-up (usually through the
//! [`factory`](crate::factory) functions) and never changes afterwards.
//! Containers validate their children at construction, so an existing
//! `DataObject` always satisfies the grammar:
//!
//! - arrays are non-empty and homogeneous
//! - dictionaries are non-empty, homogeneous, and keyed by basic types
//! - variants never wrap another variant
//! - object paths match `^(/|(/[A-Za-z0-9_]+)+)$`
//!
//! Rendering follows busctl's argument syntax: strings are double-quoted,
//! arrays and dictionaries are prefixed by their element count, and an array
//! holding one null element renders as the empty-container sentinel `0`.

use crate::error::{BusctlError, Result};
use crate::signature::{self, NumericKind};
use std::fmt;

/// A numeric payload. Integer kinds hold `Int` (or `UInt` for values above
/// `i64::MAX`), the double kind holds `Double`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Double(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::UInt(n) => write!(f, "{n}"),
            Number::Double(n) => write!(f, "{n}"),
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Number {
                fn from(value: $source) -> Self {
                    Number::$variant(value as $target)
                }
            }
        )+
    };
}

number_from!(Int as i64: u8, i16, u16, i32, u32, i64);
number_from!(UInt as u64: u64);
number_from!(Double as f64: f32, f64);

/// A value of one of the eight numeric kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct Numeric {
    kind: NumericKind,
    value: Option<Number>,
}

impl Numeric {
    /// Build a numeric, checking that `value` fits `kind`.
    pub fn new(kind: NumericKind, value: Option<Number>) -> Result<Self> {
        let value = match value {
            None => None,
            Some(number) => Some(Self::normalize(kind, number)?),
        };
        Ok(Numeric { kind, value })
    }

    fn normalize(kind: NumericKind, number: Number) -> Result<Number> {
        let Some((min, max)) = kind.integer_range() else {
            return Ok(match number {
                Number::Int(n) => Number::Double(n as f64),
                Number::UInt(n) => Number::Double(n as f64),
                Number::Double(n) => Number::Double(n),
            });
        };

        let wide = match number {
            Number::Int(n) => n as i128,
            Number::UInt(n) => n as i128,
            Number::Double(n) => {
                return Err(BusctlError::InvalidValue(format!(
                    "a {kind} value must be an integer, got {n}"
                )))
            }
        };
        if wide < min || wide > max {
            return Err(BusctlError::InvalidValue(format!(
                "{wide} is out of range for {kind}"
            )));
        }
        Ok(match i64::try_from(wide) {
            Ok(n) => Number::Int(n),
            Err(_) => Number::UInt(wide as u64),
        })
    }

    pub fn kind(&self) -> NumericKind {
        self.kind
    }

    pub fn value(&self) -> Option<Number> {
        self.value
    }
}

/// An object path, validated against the D-Bus path grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath(Option<String>);

impl ObjectPath {
    pub fn new(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) if !is_valid_object_path(path) => Err(BusctlError::InvalidValue(format!(
                "Invalid path to object specified: '{path}'"
            ))),
            _ => Ok(ObjectPath(path.map(str::to_string))),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// `^(/|(/[A-Za-z0-9_]+)+)$`
fn is_valid_object_path(path: &str) -> bool {
    if path == "/" {
        return true;
    }
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    rest.split('/').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Homogeneous, non-empty array. Signature `a` + element signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    signature: String,
    items: Vec<DataObject>,
}

impl Array {
    pub fn new(items: Vec<DataObject>) -> Result<Self> {
        let Some(first) = items.first() else {
            return Err(BusctlError::InvalidValue(
                "The value cannot be an empty array".to_string(),
            ));
        };
        let element = first.signature();
        if items.iter().any(|item| item.signature() != element) {
            return Err(BusctlError::InvalidValue(
                "The value cannot be an array of elements with different signatures".to_string(),
            ));
        }
        Ok(Array {
            signature: format!("{}{}", signature::ARRAY, element),
            items,
        })
    }

    pub fn items(&self) -> &[DataObject] {
        &self.items
    }
}

/// What a struct was built from: one object, or an ordered sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum StructValue {
    Single(Box<DataObject>),
    Fields(Vec<DataObject>),
}

impl From<DataObject> for StructValue {
    fn from(value: DataObject) -> Self {
        StructValue::Single(Box::new(value))
    }
}

impl From<Vec<DataObject>> for StructValue {
    fn from(fields: Vec<DataObject>) -> Self {
        StructValue::Fields(fields)
    }
}

impl<const N: usize> From<[DataObject; N]> for StructValue {
    fn from(fields: [DataObject; N]) -> Self {
        StructValue::Fields(fields.into())
    }
}

/// Struct of heterogeneous fields. Signature `(` + field signatures + `)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    signature: String,
    value: StructValue,
}

impl Struct {
    pub fn new(value: impl Into<StructValue>) -> Result<Self> {
        let value = value.into();
        let inner: String = match &value {
            StructValue::Single(object) => object.signature().to_string(),
            StructValue::Fields(fields) if fields.is_empty() => {
                return Err(BusctlError::InvalidValue(
                    "The value cannot be an empty array".to_string(),
                ))
            }
            StructValue::Fields(fields) => fields.iter().map(DataObject::signature).collect(),
        };
        Ok(Struct {
            signature: format!("{}{}{}", signature::STRUCT_OPEN, inner, signature::STRUCT_CLOSE),
            value,
        })
    }

    pub fn fields(&self) -> &[DataObject] {
        match &self.value {
            StructValue::Single(object) => std::slice::from_ref(object.as_ref()),
            StructValue::Fields(fields) => fields,
        }
    }
}

/// One dictionary entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DictEntry {
    pub key: DataObject,
    pub value: DataObject,
}

/// Non-empty dictionary with basic keys. Signature `a{KV}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    signature: String,
    entries: Vec<DictEntry>,
}

impl Map {
    pub fn new(entries: Vec<DictEntry>) -> Result<Self> {
        let Some(first) = entries.first() else {
            return Err(BusctlError::InvalidValue(
                "The value cannot be an empty array".to_string(),
            ));
        };
        let key_signature = first.key.signature();
        let value_signature = first.value.signature();

        for entry in &entries {
            if !entry.key.is_basic() {
                return Err(BusctlError::InvalidValue(
                    "The key cannot be a container type data object".to_string(),
                ));
            }
            if entry.key.signature() != key_signature || entry.value.signature() != value_signature
            {
                return Err(BusctlError::InvalidValue(
                    "Each element must have the same data types for the key and value elements"
                        .to_string(),
                ));
            }
        }

        Ok(Map {
            signature: format!(
                "{}{}{}{}{}",
                signature::ARRAY,
                signature::DICT_OPEN,
                key_signature,
                value_signature,
                signature::DICT_CLOSE
            ),
            entries,
        })
    }

    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }
}

/// Self-describing wrapper around exactly one non-variant object.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    inner: Box<DataObject>,
}

impl Variant {
    pub fn new(inner: DataObject) -> Result<Self> {
        if let DataObject::Variant(_) = inner {
            return Err(BusctlError::InvalidValue(
                "A variant cannot contain another variant".to_string(),
            ));
        }
        Ok(Variant {
            inner: Box::new(inner),
        })
    }

    pub fn inner(&self) -> &DataObject {
        &self.inner
    }
}

/// A typed D-Bus value.
#[derive(Debug, Clone, PartialEq)]
pub enum DataObject {
    String(Option<String>),
    ObjectPath(ObjectPath),
    Boolean(Option<bool>),
    Numeric(Numeric),
    Array(Array),
    Struct(Struct),
    Map(Map),
    Variant(Variant),
}

impl DataObject {
    /// The type signature of this object, e.g. `s`, `ay`, `a{sv}`, `(sy)`.
    pub fn signature(&self) -> &str {
        match self {
            DataObject::String(_) => "s",
            DataObject::ObjectPath(_) => "o",
            DataObject::Boolean(_) => "b",
            DataObject::Numeric(numeric) => numeric.kind().as_str(),
            DataObject::Array(array) => &array.signature,
            DataObject::Struct(structure) => &structure.signature,
            DataObject::Map(map) => &map.signature,
            DataObject::Variant(_) => "v",
        }
    }

    /// Render the object in busctl argument syntax.
    ///
    /// With `with_signature` the output always starts with the signature and a
    /// space, even when the value itself is null (`"s "`).
    pub fn value(&self, with_signature: bool) -> Option<String> {
        let value = self.render();
        if with_signature {
            Some(format!("{} {}", self.signature(), value.unwrap_or_default()))
        } else {
            value
        }
    }

    /// Scalars other than variants; the only types allowed as dictionary keys.
    pub fn is_basic(&self) -> bool {
        !matches!(
            self,
            DataObject::Array(_) | DataObject::Struct(_) | DataObject::Map(_) | DataObject::Variant(_)
        )
    }

    fn render(&self) -> Option<String> {
        match self {
            DataObject::String(value) => value.as_deref().map(quote),
            DataObject::ObjectPath(path) => path.as_str().map(str::to_string),
            DataObject::Boolean(value) => value.map(|b| b.to_string()),
            DataObject::Numeric(numeric) => numeric.value().map(|n| n.to_string()),
            DataObject::Array(array) => Some(render_counted(
                array.items.len(),
                array.items.first().map(DataObject::render),
                array.items.iter().map(|item| item.render().unwrap_or_default()),
            )),
            DataObject::Map(map) => Some(render_counted(
                map.entries.len(),
                map.entries.first().map(|entry| entry.value.render()),
                map.entries.iter().map(|entry| {
                    format!(
                        "{} {}",
                        entry.key.render().unwrap_or_default(),
                        entry.value.render().unwrap_or_default()
                    )
                }),
            )),
            DataObject::Struct(structure) => match &structure.value {
                StructValue::Single(object) => object.render(),
                StructValue::Fields(fields) => {
                    let joined = fields
                        .iter()
                        .filter_map(DataObject::render)
                        .collect::<Vec<_>>()
                        .join(" ");
                    let trimmed = joined.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                }
            },
            DataObject::Variant(variant) => {
                variant.inner.render()?;
                variant.inner.value(true)
            }
        }
    }
}

/// Count-prefixed rendering shared by arrays and dictionaries. A single
/// element whose value is null or empty collapses to the `0` sentinel.
fn render_counted(
    len: usize,
    first_value: Option<Option<String>>,
    parts: impl Iterator<Item = String>,
) -> String {
    if len == 1 && first_value.flatten().is_none_or(|v| v.is_empty()) {
        return "0".to_string();
    }
    let mut out = len.to_string();
    for part in parts {
        out.push(' ');
        out.push_str(&part);
    }
    out
}

/// Wrap a string in double quotes, escaping `\` and `"`.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Displays the signature-prefixed form, the same text `marshal` produces.
impl fmt::Display for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value(true).unwrap_or_default())
    }
}
