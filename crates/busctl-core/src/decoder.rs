//! Unmarshal busctl output into native [`Value`]s.
//!
//! Decoding is a recursive descent over the signature string. The tokens are
//! only ever read front to back through a [`TokenCursor`] that the recursion
//! shares by reference, so every nested call continues where the previous one
//! stopped.
//!
//! # Key design decisions
//!
//! - **Signature-driven**: the current signature character decides what to
//!   read next; token text is never used to guess a type. The one exception is
//!   a variant, whose first token *is* the inner signature.
//! - **Whole-signature collapse**: when a struct or array spans the entire
//!   signature being decoded, its value is returned directly instead of being
//!   wrapped in a one-element list (`ay` decodes to `[1,2,3]`, not `[[1,2,3]]`).
//! - **Missing tokens**: a scalar with no token left decodes to `Null` and a
//!   missing count to an empty collection. Running dry in the middle of a
//!   counted container is an error.
//! - **Bounded recursion**: [`check_signature`] caps array and struct nesting,
//!   and variants may nest at most [`MAX_VARIANT_DEPTH`] deep.

use crate::error::{BusctlError, Result};
use crate::signature::{
    self, check_signature, find_array_subtype_position, find_matching_close, ArraySubtype,
    ContainerKind, NumericKind,
};
use crate::tokenize::{tokenize, unquote};
use crate::value::{DictBuilder, Value};
use tracing::{debug, trace};

/// D-Bus limits total nesting to 64, so variants alone cannot go deeper.
pub const MAX_VARIANT_DEPTH: usize = 64;

/// Read position into an immutable token list.
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [String],
    position: usize,
    variant_depth: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        TokenCursor {
            tokens,
            position: 0,
            variant_depth: 0,
        }
    }

    /// Take the next token, if any.
    pub fn next_token(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    /// Index of the next token to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> &'a [String] {
        &self.tokens[self.position.min(self.tokens.len())..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.tokens.len()
    }
}

/// Decode a complete busctl response such as `a{sv} 1 "Id" s "eth0"`.
///
/// The first token is the signature; the rest are values. Empty input
/// decodes to `Value::Null`.
///
/// ```
/// use busctl_core::{unmarshal_response, Value};
///
/// let value = unmarshal_response(r#"su "hello world" 123"#).unwrap();
/// assert_eq!(
///     value,
///     Value::Array(vec![Value::from("hello world"), Value::Int(123)])
/// );
/// ```
pub fn unmarshal_response(raw: &str) -> Result<Value> {
    let tokens = tokenize(raw);
    let Some((signature, body)) = tokens.split_first() else {
        return Ok(Value::Null);
    };

    trace!(%signature, tokens = body.len(), "unmarshalling busctl response");
    let mut cursor = TokenCursor::new(body);
    let value = unmarshal(signature, &mut cursor)?;
    if !cursor.is_exhausted() {
        debug!(
            %signature,
            unconsumed = cursor.remaining().len(),
            "busctl response has tokens left after decoding"
        );
    }
    Ok(value)
}

/// Decode the value described by `signature` from `cursor`.
pub fn unmarshal(signature: &str, cursor: &mut TokenCursor<'_>) -> Result<Value> {
    check_signature(signature)?;
    decode(signature, cursor)
}

/// Decode from a token list, starting at its first token.
pub fn unmarshal_tokens(signature: &str, tokens: &[String]) -> Result<Value> {
    unmarshal(signature, &mut TokenCursor::new(tokens))
}

fn decode(signature: &str, cursor: &mut TokenCursor<'_>) -> Result<Value> {
    if signature.len() == 1 {
        return decode_basic(signature.as_bytes()[0] as char, cursor);
    }

    let mut items = Vec::new();
    let mut position = 0;
    while position < signature.len() {
        match ContainerKind::at(signature, position) {
            Some(ContainerKind::Struct) => {
                let close = find_matching_close(signature, position)?;
                let value = decode(&signature[position + 1..close], cursor)?;
                if position == 0 && close == signature.len() - 1 {
                    return Ok(value);
                }
                items.push(value);
                position = close + 1;
            }
            Some(ContainerKind::Array | ContainerKind::Dict) => {
                let subtype = find_array_subtype_position(signature, position)?;
                let value = decode_array(signature, &subtype, cursor)?;
                let end = subtype.array_end();
                if position == 0 && end == signature.len() {
                    return Ok(value);
                }
                items.push(value);
                position = end;
            }
            Some(ContainerKind::Variant) | None => {
                items.push(decode_basic(signature.as_bytes()[position] as char, cursor)?);
                position += 1;
            }
        }
    }

    Ok(Value::Array(items))
}

/// Decode a count-prefixed array or dictionary body.
fn decode_array(
    signature: &str,
    subtype: &ArraySubtype,
    cursor: &mut TokenCursor<'_>,
) -> Result<Value> {
    let count = decode_count(cursor)?;
    let element = subtype.subtype(signature);

    match subtype.key {
        Some(key) => {
            let key_code = signature.as_bytes()[key] as char;
            let mut entries = DictBuilder::new();
            for decoded in 0..count {
                ensure_remaining(cursor, count, decoded)?;
                let key = decode_basic(key_code, cursor)?;
                let value = decode(element, cursor)?;
                entries.insert(key, value);
            }
            Ok(entries.finish())
        }
        None => {
            let mut items = Vec::new();
            for decoded in 0..count {
                ensure_remaining(cursor, count, decoded)?;
                let start = cursor.position();
                items.push(decode(element, cursor)?);
                if cursor.position() == start {
                    return Err(BusctlError::InvalidToken {
                        position: start,
                        message: format!("array element '{element}' consumed no tokens"),
                    });
                }
            }
            Ok(Value::Array(items))
        }
    }
}

fn ensure_remaining(cursor: &TokenCursor<'_>, count: usize, decoded: usize) -> Result<()> {
    if cursor.is_exhausted() {
        return Err(BusctlError::InvalidToken {
            position: cursor.position(),
            message: format!("container declares {count} elements but input ended after {decoded}"),
        });
    }
    Ok(())
}

fn decode_count(cursor: &mut TokenCursor<'_>) -> Result<usize> {
    let position = cursor.position();
    match cursor.next_token() {
        None => Ok(0),
        Some(token) => token.parse().map_err(|_| BusctlError::InvalidToken {
            position,
            message: format!("'{token}' is not an element count"),
        }),
    }
}

/// Decode one single-character type.
fn decode_basic(code: char, cursor: &mut TokenCursor<'_>) -> Result<Value> {
    match code {
        signature::STRING | signature::OBJECT_PATH => {
            Ok(cursor.next_token().map_or(Value::Null, |t| Value::String(unquote(t))))
        }
        signature::BOOLEAN => Ok(cursor.next_token().map_or(Value::Null, |t| Value::Bool(t == "true"))),
        signature::VARIANT => {
            let position = cursor.position();
            let Some(inner) = cursor.next_token() else {
                return Ok(Value::Null);
            };
            check_signature(inner)?;
            if cursor.variant_depth >= MAX_VARIANT_DEPTH {
                return Err(BusctlError::InvalidToken {
                    position,
                    message: format!("variants nested deeper than {MAX_VARIANT_DEPTH}"),
                });
            }
            cursor.variant_depth += 1;
            let value = decode(inner, cursor);
            cursor.variant_depth -= 1;
            value
        }
        _ => match NumericKind::from_code(code) {
            Some(kind) => decode_numeric(kind, cursor),
            None => Err(BusctlError::UnknownSignature(code)),
        },
    }
}

/// Integers decode to `Int` (or `UInt` above `i64::MAX`), doubles to `Double`.
fn decode_numeric(kind: NumericKind, cursor: &mut TokenCursor<'_>) -> Result<Value> {
    let position = cursor.position();
    let Some(token) = cursor.next_token() else {
        return Ok(Value::Null);
    };

    let parsed = if kind.is_integer() {
        token
            .parse::<i64>()
            .map(Value::Int)
            .ok()
            .or_else(|| token.parse::<u64>().map(Value::UInt).ok())
    } else {
        token.parse::<f64>().map(Value::Double).ok()
    };

    parsed.ok_or_else(|| BusctlError::InvalidToken {
        position,
        message: format!("'{token}' is not a valid {kind} value"),
    })
}
