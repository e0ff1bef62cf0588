//! One constructor per signature letter.
//!
//! Scalars take `impl Into<Option<_>>`, so both `s("hello")` and `s(None)`
//! work. Constructors that can reject their input return
//! [`Result`](crate::error::Result).
//!
//! ```
//! use busctl_core::factory::{a, e, s, v, y};
//! use busctl_core::marshal;
//!
//! let settings = e([(s("id"), v(s("eth0")).unwrap())]).unwrap();
//! assert_eq!(settings.signature(), "a{sv}");
//!
//! let bytes = a([y(1), y(2), y(3)]).unwrap();
//! assert_eq!(marshal(&bytes).unwrap().as_deref(), Some("ay 3 1 2 3"));
//! ```

use crate::data_object::{
    Array, DataObject, DictEntry, Map, Number, Numeric, ObjectPath, Struct, StructValue, Variant,
};
use crate::error::Result;
use crate::signature::NumericKind;

/// String (`s`).
pub fn s<'a>(value: impl Into<Option<&'a str>>) -> DataObject {
    DataObject::String(value.into().map(str::to_string))
}

/// Object path (`o`). Fails on paths outside `^(/|(/[A-Za-z0-9_]+)+)$`.
pub fn o<'a>(value: impl Into<Option<&'a str>>) -> Result<DataObject> {
    Ok(DataObject::ObjectPath(ObjectPath::new(value.into())?))
}

/// Boolean (`b`).
pub fn b(value: impl Into<Option<bool>>) -> DataObject {
    DataObject::Boolean(value.into())
}

fn typed_numeric(kind: NumericKind, value: Option<Number>) -> DataObject {
    // The argument type already bounds the value to the kind's range.
    DataObject::Numeric(Numeric::new(kind, value).unwrap_or_else(|_| {
        unreachable!("typed {kind} constructor received an out-of-range value")
    }))
}

/// Byte (`y`).
pub fn y(value: impl Into<Option<u8>>) -> DataObject {
    typed_numeric(NumericKind::Byte, value.into().map(Number::from))
}

/// Signed 16-bit integer (`n`).
pub fn n(value: impl Into<Option<i16>>) -> DataObject {
    typed_numeric(NumericKind::Int16, value.into().map(Number::from))
}

/// Unsigned 16-bit integer (`q`).
pub fn q(value: impl Into<Option<u16>>) -> DataObject {
    typed_numeric(NumericKind::UInt16, value.into().map(Number::from))
}

/// Signed 32-bit integer (`i`).
pub fn i(value: impl Into<Option<i32>>) -> DataObject {
    typed_numeric(NumericKind::Int32, value.into().map(Number::from))
}

/// Unsigned 32-bit integer (`u`).
pub fn u(value: impl Into<Option<u32>>) -> DataObject {
    typed_numeric(NumericKind::UInt32, value.into().map(Number::from))
}

/// Signed 64-bit integer (`x`).
pub fn x(value: impl Into<Option<i64>>) -> DataObject {
    typed_numeric(NumericKind::Int64, value.into().map(Number::from))
}

/// Unsigned 64-bit integer (`t`).
pub fn t(value: impl Into<Option<u64>>) -> DataObject {
    typed_numeric(NumericKind::UInt64, value.into().map(Number::from))
}

/// Double (`d`).
pub fn d(value: impl Into<Option<f64>>) -> DataObject {
    typed_numeric(NumericKind::Double, value.into().map(Number::from))
}

/// Any numeric kind from an untyped number. Fails when the number does not
/// fit the kind (out of range, or a fraction for an integer kind).
pub fn numeric(kind: NumericKind, value: impl Into<Option<Number>>) -> Result<DataObject> {
    Ok(DataObject::Numeric(Numeric::new(kind, value.into())?))
}

/// Variant (`v`). Fails when `value` is itself a variant.
pub fn v(value: DataObject) -> Result<DataObject> {
    Ok(DataObject::Variant(Variant::new(value)?))
}

/// Struct (`(...)`) from a single object or a non-empty field list.
pub fn r(value: impl Into<StructValue>) -> Result<DataObject> {
    Ok(DataObject::Struct(Struct::new(value)?))
}

/// Array (`a<T>`) of same-signature elements.
pub fn a(items: impl IntoIterator<Item = DataObject>) -> Result<DataObject> {
    Ok(DataObject::Array(Array::new(items.into_iter().collect())?))
}

/// Dictionary (`a{KV}`) from key/value pairs.
pub fn e(entries: impl IntoIterator<Item = (DataObject, DataObject)>) -> Result<DataObject> {
    let entries = entries
        .into_iter()
        .map(|(key, value)| DictEntry { key, value })
        .collect();
    Ok(DataObject::Map(Map::new(entries)?))
}
