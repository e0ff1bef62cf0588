//! D-Bus type signatures: type codes, kinds and position finding.
//!
//! Every place in the crate that matches a signature character goes through
//! the constants and enums defined here. The position helpers work on byte
//! offsets; signatures are ASCII-only (see [`check_signature`]).
//!
//! # Grammar
//!
//! - Basic codes: `s` string, `o` object path, `b` boolean, `y n q i u x t d`
//!   numerics, `v` variant
//! - `a<T>` array of `T`
//! - `a{KV}` dictionary from basic `K` to `V`
//! - `(T1T2...)` struct

use crate::error::{BusctlError, Result};
use std::fmt;

pub const STRING: char = 's';
pub const OBJECT_PATH: char = 'o';
pub const BOOLEAN: char = 'b';
pub const VARIANT: char = 'v';
pub const ARRAY: char = 'a';
pub const STRUCT_OPEN: char = '(';
pub const STRUCT_CLOSE: char = ')';
pub const DICT_OPEN: char = '{';
pub const DICT_CLOSE: char = '}';

/// The eight numeric type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
}

impl NumericKind {
    pub const ALL: [NumericKind; 8] = [
        NumericKind::Byte,
        NumericKind::Int16,
        NumericKind::UInt16,
        NumericKind::Int32,
        NumericKind::UInt32,
        NumericKind::Int64,
        NumericKind::UInt64,
        NumericKind::Double,
    ];

    /// The signature character for this kind.
    pub fn code(self) -> char {
        match self {
            NumericKind::Byte => 'y',
            NumericKind::Int16 => 'n',
            NumericKind::UInt16 => 'q',
            NumericKind::Int32 => 'i',
            NumericKind::UInt32 => 'u',
            NumericKind::Int64 => 'x',
            NumericKind::UInt64 => 't',
            NumericKind::Double => 'd',
        }
    }

    /// The signature as a one-character string slice.
    pub fn as_str(self) -> &'static str {
        match self {
            NumericKind::Byte => "y",
            NumericKind::Int16 => "n",
            NumericKind::UInt16 => "q",
            NumericKind::Int32 => "i",
            NumericKind::UInt32 => "u",
            NumericKind::Int64 => "x",
            NumericKind::UInt64 => "t",
            NumericKind::Double => "d",
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        NumericKind::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn is_integer(self) -> bool {
        self != NumericKind::Double
    }

    /// Inclusive value range of an integer kind, `None` for `Double`.
    pub fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            NumericKind::Byte => Some((0, u8::MAX as i128)),
            NumericKind::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            NumericKind::UInt16 => Some((0, u16::MAX as i128)),
            NumericKind::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            NumericKind::UInt32 => Some((0, u32::MAX as i128)),
            NumericKind::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            NumericKind::UInt64 => Some((0, u64::MAX as i128)),
            NumericKind::Double => None,
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericKind::Byte => "byte",
            NumericKind::Int16 => "int16",
            NumericKind::UInt16 => "uint16",
            NumericKind::Int32 => "int32",
            NumericKind::UInt32 => "uint32",
            NumericKind::Int64 => "int64",
            NumericKind::UInt64 => "uint64",
            NumericKind::Double => "double",
        };
        f.write_str(name)
    }
}

/// Container kinds, keyed by their leading signature character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    Struct,
    Dict,
    Variant,
}

impl ContainerKind {
    /// Classify the container starting at `index`. `a{` is a dictionary,
    /// any other `a` an array.
    pub fn at(signature: &str, index: usize) -> Option<Self> {
        let bytes = signature.as_bytes();
        match *bytes.get(index)? as char {
            ARRAY if bytes.get(index + 1) == Some(&(DICT_OPEN as u8)) => Some(ContainerKind::Dict),
            ARRAY => Some(ContainerKind::Array),
            STRUCT_OPEN => Some(ContainerKind::Struct),
            VARIANT => Some(ContainerKind::Variant),
            _ => None,
        }
    }
}

/// True for the codes allowed as dictionary keys: `s`, `o`, `b` and the numerics.
pub fn is_basic_code(code: char) -> bool {
    matches!(code, STRING | OBJECT_PATH | BOOLEAN) || NumericKind::from_code(code).is_some()
}

pub const MAX_SIGNATURE_LENGTH: usize = 255;
pub const MAX_ARRAY_DEPTH: usize = 32;
pub const MAX_STRUCT_DEPTH: usize = 32;

/// Validate a signature's alphabet and shape.
///
/// Characters outside the type-code alphabet are reported first, as
/// [`BusctlError::UnknownSignature`]. Everything else is
/// [`BusctlError::InvalidSignature`]: more than [`MAX_SIGNATURE_LENGTH`]
/// bytes, arrays or structs nested past their depth limits, unbalanced
/// brackets, empty `()` or `{}`, a `{` that does not follow `a`, and an `a`
/// with no element type.
pub fn check_signature(signature: &str) -> Result<()> {
    for ch in signature.chars() {
        let known = is_basic_code(ch)
            || matches!(
                ch,
                VARIANT | ARRAY | STRUCT_OPEN | STRUCT_CLOSE | DICT_OPEN | DICT_CLOSE
            );
        if !known {
            return Err(BusctlError::UnknownSignature(ch));
        }
    }

    if signature.len() > MAX_SIGNATURE_LENGTH {
        return Err(BusctlError::signature(
            signature,
            format!("longer than {MAX_SIGNATURE_LENGTH} bytes"),
        ));
    }
    check_shape(signature)
}

/// An open bracket group and the array depth outside it.
struct OpenGroup {
    open: usize,
    closer: u8,
    outer_arrays: usize,
}

/// Single left-to-right pass over an ASCII signature.
fn check_shape(signature: &str) -> Result<()> {
    let bytes = signature.as_bytes();
    let mut groups: Vec<OpenGroup> = Vec::new();
    // Arrays around the innermost open group.
    let mut enclosing_arrays = 0;
    // `a` codes still waiting for their element type.
    let mut pending_arrays = 0;
    let mut struct_depth = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match b as char {
            ARRAY => {
                pending_arrays += 1;
                if enclosing_arrays + pending_arrays > MAX_ARRAY_DEPTH {
                    return Err(BusctlError::signature(
                        signature,
                        format!("arrays nested deeper than {MAX_ARRAY_DEPTH} at offset {i}"),
                    ));
                }
            }
            open @ (STRUCT_OPEN | DICT_OPEN) => {
                if open == DICT_OPEN && (i == 0 || bytes[i - 1] != ARRAY as u8) {
                    return Err(BusctlError::signature(
                        signature,
                        format!("dictionary entry outside an array at offset {i}"),
                    ));
                }
                if open == STRUCT_OPEN {
                    struct_depth += 1;
                    if struct_depth > MAX_STRUCT_DEPTH {
                        return Err(BusctlError::signature(
                            signature,
                            format!("structs nested deeper than {MAX_STRUCT_DEPTH} at offset {i}"),
                        ));
                    }
                }
                groups.push(OpenGroup {
                    open: i,
                    closer: if open == STRUCT_OPEN { b')' } else { b'}' },
                    outer_arrays: enclosing_arrays,
                });
                enclosing_arrays += pending_arrays;
                pending_arrays = 0;
            }
            close @ (STRUCT_CLOSE | DICT_CLOSE) => {
                if pending_arrays > 0 {
                    return Err(BusctlError::signature(
                        signature,
                        format!("array at offset {} is missing its element type", i - 1),
                    ));
                }
                let group = match groups.pop() {
                    Some(group) if group.closer == b => group,
                    Some(_) => {
                        return Err(BusctlError::signature(
                            signature,
                            format!("mismatched '{close}' at offset {i}"),
                        ))
                    }
                    None => {
                        return Err(BusctlError::signature(
                            signature,
                            format!("unmatched '{close}' at offset {i}"),
                        ))
                    }
                };
                if group.open + 1 == i {
                    return Err(BusctlError::signature(
                        signature,
                        format!("empty container at offset {}", group.open),
                    ));
                }
                if close == STRUCT_CLOSE {
                    struct_depth -= 1;
                }
                enclosing_arrays = group.outer_arrays;
            }
            _ => pending_arrays = 0,
        }
    }

    if pending_arrays > 0 {
        return Err(BusctlError::signature(
            signature,
            "array is missing its element type",
        ));
    }
    if let Some(group) = groups.last() {
        return Err(BusctlError::signature(
            signature,
            format!("bracket at offset {} is never closed", group.open),
        ));
    }
    Ok(())
}

/// Find the bracket closing the `(` or `{` at `open`.
///
/// Brackets are matched by depth, so sibling groups such as `(i)(i)` resolve
/// to their own closers instead of the last one in the string.
pub fn find_matching_close(signature: &str, open: usize) -> Result<usize> {
    let bytes = signature.as_bytes();
    if !matches!(bytes.get(open), Some(b'(') | Some(b'{')) {
        return Err(BusctlError::signature(
            signature,
            format!("no opening bracket at offset {open}"),
        ));
    }

    let mut expected = Vec::new();
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' => expected.push(b')'),
            b'{' => expected.push(b'}'),
            b')' | b'}' => {
                if expected.pop() != Some(b) {
                    return Err(BusctlError::signature(
                        signature,
                        format!("mismatched '{}' at offset {i}", b as char),
                    ));
                }
                if expected.is_empty() {
                    if i == open + 1 {
                        return Err(BusctlError::signature(
                            signature,
                            format!("empty container at offset {open}"),
                        ));
                    }
                    return Ok(i);
                }
            }
            _ => {}
        }
    }

    Err(BusctlError::signature(
        signature,
        format!("bracket at offset {open} is never closed"),
    ))
}

/// Span of an array's element sub-signature, as half-open byte offsets.
///
/// For dictionaries `start..end` is the value type and `key` the offset of the
/// single key character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArraySubtype {
    pub start: usize,
    pub end: usize,
    pub key: Option<usize>,
}

impl ArraySubtype {
    pub fn is_dict(&self) -> bool {
        self.key.is_some()
    }

    /// Offset just past the whole array signature (past `}` for dictionaries).
    pub fn array_end(&self) -> usize {
        if self.is_dict() {
            self.end + 1
        } else {
            self.end
        }
    }

    pub fn subtype<'a>(&self, signature: &'a str) -> &'a str {
        &signature[self.start..self.end]
    }
}

/// Locate the element sub-signature of the array whose `a` sits at `index`.
///
/// ```
/// use busctl_core::signature::find_array_subtype_position;
///
/// let sub = find_array_subtype_position("a{sa{sv}}", 0).unwrap();
/// assert_eq!(sub.subtype("a{sa{sv}}"), "a{sv}");
/// assert_eq!(sub.key, Some(2));
/// ```
pub fn find_array_subtype_position(signature: &str, index: usize) -> Result<ArraySubtype> {
    let bytes = signature.as_bytes();
    if bytes.get(index) != Some(&(ARRAY as u8)) {
        return Err(BusctlError::signature(
            signature,
            format!("no array at offset {index}"),
        ));
    }

    let next = match bytes.get(index + 1) {
        Some(&b) => b as char,
        None => {
            return Err(BusctlError::signature(
                signature,
                "array is missing its element type",
            ))
        }
    };

    match next {
        STRUCT_OPEN => {
            let close = find_matching_close(signature, index + 1)?;
            Ok(ArraySubtype {
                start: index + 1,
                end: close + 1,
                key: None,
            })
        }
        DICT_OPEN => {
            let close = find_matching_close(signature, index + 1)?;
            let key = index + 2;
            let start = index + 3;
            if start >= close {
                return Err(BusctlError::signature(
                    signature,
                    "dictionary entry needs a key and a value type",
                ));
            }
            if !is_basic_code(bytes[key] as char) {
                return Err(BusctlError::signature(
                    signature,
                    format!("dictionary key '{}' is not a basic type", bytes[key] as char),
                ));
            }
            if complete_type_end(signature, start)? != close {
                return Err(BusctlError::signature(
                    signature,
                    "dictionary value must be a single complete type",
                ));
            }
            Ok(ArraySubtype {
                start,
                end: close,
                key: Some(key),
            })
        }
        ARRAY => {
            // Nested arrays share their end with the innermost one.
            let mut innermost = index + 1;
            while bytes.get(innermost + 1) == Some(&(ARRAY as u8)) {
                innermost += 1;
            }
            let inner = find_array_subtype_position(signature, innermost)?;
            Ok(ArraySubtype {
                start: index + 1,
                end: inner.array_end(),
                key: None,
            })
        }
        STRUCT_CLOSE | DICT_CLOSE => Err(BusctlError::signature(
            signature,
            format!("unexpected '{next}' after array at offset {index}"),
        )),
        _ => Ok(ArraySubtype {
            start: index + 1,
            end: index + 2,
            key: None,
        }),
    }
}

/// Offset just past the single complete type starting at `index`.
pub fn complete_type_end(signature: &str, index: usize) -> Result<usize> {
    match signature.as_bytes().get(index).map(|&b| b as char) {
        Some(STRUCT_OPEN) => Ok(find_matching_close(signature, index)? + 1),
        Some(ARRAY) => Ok(find_array_subtype_position(signature, index)?.array_end()),
        Some(c @ (STRUCT_CLOSE | DICT_OPEN | DICT_CLOSE)) => Err(BusctlError::signature(
            signature,
            format!("unexpected '{c}' at offset {index}"),
        )),
        Some(_) => Ok(index + 1),
        None => Err(BusctlError::signature(
            signature,
            format!("expected a type at offset {index}"),
        )),
    }
}

/// Split a signature into its sequence of complete types: `"sa{sv}(ii)"`
/// becomes `["s", "a{sv}", "(ii)"]`.
pub fn split_signature(signature: &str) -> Result<Vec<&str>> {
    check_signature(signature)?;
    let mut types = Vec::new();
    let mut position = 0;
    while position < signature.len() {
        let end = complete_type_end(signature, position)?;
        types.push(&signature[position..end]);
        position = end;
    }
    Ok(types)
}
