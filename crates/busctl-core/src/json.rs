//! Build data objects from a signature and a JSON value.
//!
//! This is how the CLI turns `--signature a{sv} --args '{"id": "eth0"}'` into
//! something [`marshal`](crate::marshal) can render. The signature chooses the
//! type at every level; JSON only supplies the values.
//!
//! | Signature | Accepted JSON |
//! |-----------|---------------|
//! | `s`, `o` | string or null |
//! | `b` | bool or null |
//! | numerics | number or null (range-checked against the kind) |
//! | `v` | `{"signature": "...", "value": ...}`, or a plain string/bool/number (inferred as `s`/`b`/`x`/`t`/`d`) |
//! | `a<T>` | array |
//! | `a{KV}` | object (keys parsed as `K`) or array of `[key, value]` pairs |
//! | `(T...)` | array with one element per field; a one-field struct takes the bare value |
//!
//! Empty JSON arrays and objects use the `0` sentinel: a container holding a
//! single null element. That needs a null form of the element type, so empty
//! arrays of arrays or dictionaries cannot be expressed.

use crate::data_object::{DataObject, Number};
use crate::error::{BusctlError, Result};
use crate::factory;
use crate::signature::{self, split_signature, ContainerKind, NumericKind};
use serde_json::Value as Json;

/// Build one object from a signature holding exactly one complete type.
pub fn from_json(signature: &str, json: &Json) -> Result<DataObject> {
    match split_signature(signature)?.as_slice() {
        [single] => build(single, json),
        _ => Err(BusctlError::InvalidInput(format!(
            "'{signature}' is not a single complete type"
        ))),
    }
}

/// Build an argument sequence. A single-type signature takes the JSON value
/// directly; a multi-type signature takes a JSON array with one element per type.
pub fn from_json_args(signature: &str, json: &Json) -> Result<Vec<DataObject>> {
    let types = split_signature(signature)?;
    match types.as_slice() {
        [] => Err(BusctlError::InvalidInput("empty signature".to_string())),
        [single] => Ok(vec![build(single, json)?]),
        _ => {
            let values = json
                .as_array()
                .filter(|values| values.len() == types.len())
                .ok_or_else(|| {
                    BusctlError::InvalidInput(format!(
                        "signature '{signature}' needs a JSON array of {} values",
                        types.len()
                    ))
                })?;
            types
                .iter()
                .zip(values)
                .map(|(ty, value)| build(ty, value))
                .collect()
        }
    }
}

/// `signature` is one complete, already validated type.
fn build(signature: &str, json: &Json) -> Result<DataObject> {
    match ContainerKind::at(signature, 0) {
        Some(ContainerKind::Struct) => build_struct(&signature[1..signature.len() - 1], json),
        Some(ContainerKind::Dict) => build_dict(signature, json),
        Some(ContainerKind::Array) => build_array(&signature[1..], json),
        Some(ContainerKind::Variant) => build_variant(json),
        None => build_basic(signature.as_bytes()[0] as char, json),
    }
}

fn build_basic(code: char, json: &Json) -> Result<DataObject> {
    match (code, json) {
        (signature::STRING, Json::Null) => Ok(factory::s(None)),
        (signature::STRING, Json::String(s)) => Ok(factory::s(s.as_str())),
        (signature::OBJECT_PATH, Json::Null) => factory::o(None),
        (signature::OBJECT_PATH, Json::String(s)) => factory::o(s.as_str()),
        (signature::BOOLEAN, Json::Null) => Ok(factory::b(None)),
        (signature::BOOLEAN, Json::Bool(b)) => Ok(factory::b(*b)),
        _ => match NumericKind::from_code(code) {
            Some(kind) => match json {
                Json::Null => factory::numeric(kind, None),
                Json::Number(number) => factory::numeric(kind, json_number(number)),
                other => Err(mismatch(code, "a number", other)),
            },
            None if signature::is_basic_code(code) => Err(mismatch(code, "a matching value", json)),
            None => Err(BusctlError::UnknownSignature(code)),
        },
    }
}

fn json_number(number: &serde_json::Number) -> Option<Number> {
    number
        .as_i64()
        .map(Number::Int)
        .or_else(|| number.as_u64().map(Number::UInt))
        .or_else(|| number.as_f64().map(Number::Double))
}

fn build_struct(inner: &str, json: &Json) -> Result<DataObject> {
    let fields = split_signature(inner)?;
    match fields.as_slice() {
        [] => Err(BusctlError::InvalidInput("empty struct signature".to_string())),
        [single] => factory::r(build(single, json)?),
        _ => {
            let values = json
                .as_array()
                .filter(|values| values.len() == fields.len())
                .ok_or_else(|| {
                    BusctlError::InvalidInput(format!(
                        "struct '({inner})' needs a JSON array of {} values, found {json}",
                        fields.len()
                    ))
                })?;
            let objects = fields
                .iter()
                .zip(values)
                .map(|(field, value)| build(field, value))
                .collect::<Result<Vec<_>>>()?;
            factory::r(objects)
        }
    }
}

fn build_array(element: &str, json: &Json) -> Result<DataObject> {
    let Json::Array(values) = json else {
        return Err(BusctlError::InvalidInput(format!(
            "array 'a{element}' needs a JSON array, found {json}"
        )));
    };
    if values.is_empty() {
        return factory::a([null_of(element)?]);
    }
    let items = values
        .iter()
        .map(|value| build(element, value))
        .collect::<Result<Vec<_>>>()?;
    factory::a(items)
}

fn build_dict(signature: &str, json: &Json) -> Result<DataObject> {
    let key_code = signature.as_bytes()[2] as char;
    let value_signature = &signature[3..signature.len() - 1];

    let entries = match json {
        Json::Object(map) => map
            .iter()
            .map(|(key, value)| Ok((key_from_str(key_code, key)?, build(value_signature, value)?)))
            .collect::<Result<Vec<_>>>()?,
        Json::Array(pairs) => pairs
            .iter()
            .map(|pair| match pair.as_array().map(Vec::as_slice) {
                Some([key, value]) => Ok((
                    build_basic(key_code, key)?,
                    build(value_signature, value)?,
                )),
                _ => Err(BusctlError::InvalidInput(format!(
                    "dictionary entry must be a [key, value] pair, found {pair}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        other => {
            return Err(BusctlError::InvalidInput(format!(
                "dictionary '{signature}' needs a JSON object or array of pairs, found {other}"
            )))
        }
    };

    if entries.is_empty() {
        return factory::e([(null_of(&key_code.to_string())?, null_of(value_signature)?)]);
    }
    factory::e(entries)
}

/// JSON object keys are always strings; parse them as the key type.
fn key_from_str(code: char, key: &str) -> Result<DataObject> {
    let json = match code {
        signature::STRING | signature::OBJECT_PATH => Json::String(key.to_string()),
        signature::BOOLEAN => match key {
            "true" => Json::Bool(true),
            "false" => Json::Bool(false),
            _ => return Err(mismatch(code, "'true' or 'false'", &Json::String(key.to_string()))),
        },
        _ => serde_json::from_str::<serde_json::Number>(key)
            .map(Json::Number)
            .map_err(|_| mismatch(code, "a numeric key", &Json::String(key.to_string())))?,
    };
    build_basic(code, &json)
}

fn build_variant(json: &Json) -> Result<DataObject> {
    let inner = match json {
        Json::Object(map) if map.len() == 2 && map.contains_key("signature") => {
            let signature = map
                .get("signature")
                .and_then(Json::as_str)
                .ok_or_else(|| {
                    BusctlError::InvalidInput("variant 'signature' must be a string".to_string())
                })?;
            let value = map.get("value").ok_or_else(|| {
                BusctlError::InvalidInput("variant object needs a 'value' field".to_string())
            })?;
            from_json(signature, value)?
        }
        Json::Null => factory::s(None),
        Json::String(s) => factory::s(s.as_str()),
        Json::Bool(b) => factory::b(*b),
        Json::Number(number) => match json_number(number) {
            Some(Number::Int(n)) => factory::x(n),
            Some(Number::UInt(n)) => factory::t(n),
            Some(Number::Double(n)) => factory::d(n),
            None => return Err(mismatch(signature::VARIANT, "a finite number", json)),
        },
        other => {
            return Err(BusctlError::InvalidInput(format!(
                "cannot infer a variant signature for {other}; use {{\"signature\": ..., \"value\": ...}}"
            )))
        }
    };
    factory::v(inner)
}

/// The null form of a type, used for the empty-container sentinel.
fn null_of(signature: &str) -> Result<DataObject> {
    match ContainerKind::at(signature, 0) {
        Some(ContainerKind::Variant) => factory::v(factory::s(None)),
        Some(ContainerKind::Struct) => {
            let fields = split_signature(&signature[1..signature.len() - 1])?
                .into_iter()
                .map(null_of)
                .collect::<Result<Vec<_>>>()?;
            factory::r(fields)
        }
        Some(ContainerKind::Array | ContainerKind::Dict) => Err(BusctlError::InvalidInput(format!(
            "an empty container of '{signature}' elements has no textual form"
        ))),
        None => build_basic(signature.as_bytes()[0] as char, &Json::Null),
    }
}

fn mismatch(code: char, expected: &str, found: &Json) -> BusctlError {
    BusctlError::InvalidInput(format!(
        "expected {expected} for signature '{code}', found {found}"
    ))
}
