//! Marshal data objects into busctl argument text.
//!
//! The output is what busctl expects after the member name of a `call`,
//! `emit` or `set-property` command: the signature first, then the values.
//!
//! - A single object renders as `signature value...`:
//!   `a{sv} 1 "key" y 123`
//! - A sequence renders its signatures back to back, then each value:
//!   `ss "hello" "world"`
//!
//! # Example
//! ```
//! use busctl_core::factory::{r, s, y};
//! use busctl_core::marshal;
//!
//! let args = r([s("hello world"), y(123)]).unwrap();
//! assert_eq!(
//!     marshal(&args).unwrap().as_deref(),
//!     Some("(sy) \"hello world\" 123")
//! );
//! ```

use crate::data_object::DataObject;
use crate::error::{BusctlError, Result};

/// What can be marshalled: nothing, one object, or an argument sequence.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Nothing,
    Single(&'a DataObject),
    Sequence(&'a [DataObject]),
}

impl<'a> From<&'a DataObject> for Payload<'a> {
    fn from(object: &'a DataObject) -> Self {
        Payload::Single(object)
    }
}

impl<'a> From<Option<&'a DataObject>> for Payload<'a> {
    fn from(object: Option<&'a DataObject>) -> Self {
        object.map_or(Payload::Nothing, Payload::Single)
    }
}

impl<'a> From<&'a [DataObject]> for Payload<'a> {
    fn from(objects: &'a [DataObject]) -> Self {
        Payload::Sequence(objects)
    }
}

impl<'a> From<&'a Vec<DataObject>> for Payload<'a> {
    fn from(objects: &'a Vec<DataObject>) -> Self {
        Payload::Sequence(objects)
    }
}

impl<'a, const N: usize> From<&'a [DataObject; N]> for Payload<'a> {
    fn from(objects: &'a [DataObject; N]) -> Self {
        Payload::Sequence(objects)
    }
}

/// Marshal a payload into busctl text. `Payload::Nothing` yields `None`.
///
/// Fails with [`BusctlError::InvalidInput`] for an empty sequence.
pub fn marshal<'a>(data: impl Into<Payload<'a>>) -> Result<Option<String>> {
    match data.into() {
        Payload::Nothing => Ok(None),
        Payload::Single(object) => Ok(object.value(true)),
        Payload::Sequence(objects) => marshal_sequence(objects).map(Some),
    }
}

/// Signatures concatenated without separator, then `" " + value` per object.
fn marshal_sequence(objects: &[DataObject]) -> Result<String> {
    if objects.is_empty() {
        return Err(BusctlError::InvalidInput(
            "The data cannot be an empty array".to_string(),
        ));
    }

    let mut out: String = objects.iter().map(DataObject::signature).collect();
    for object in objects {
        out.push(' ');
        out.push_str(&object.value(false).unwrap_or_default());
    }
    Ok(out)
}
