//! # busctl-core
//!
//! Typed D-Bus values and a marshaller for the text format used by **busctl**.
//!
//! busctl takes method arguments as a signature followed by space-separated
//! values (`a{sv} 1 "Id" s "eth0"`) and prints replies in the same shape.
//! This crate builds strongly typed [`DataObject`] trees, renders them to that
//! text, and parses busctl output back into [`Value`]s.
//!
//! ## Quick start
//!
//! ```rust
//! use busctl_core::factory::{a, s, y};
//! use busctl_core::{marshal, unmarshal_response, Value};
//!
//! // Data objects → busctl text
//! let args = [s("hello"), s("world")];
//! assert_eq!(marshal(&args).unwrap().as_deref(), Some(r#"ss "hello" "world""#));
//!
//! let bytes = a([y(1), y(2), y(3)]).unwrap();
//! assert_eq!(marshal(&bytes).unwrap().as_deref(), Some("ay 3 1 2 3"));
//!
//! // busctl text → native values
//! let value = unmarshal_response(r#"a{sa{sv}} 1 "key" 1 "item" y 123"#).unwrap();
//! assert_eq!(value.get("key").and_then(|v| v.get("item")), Some(&Value::Int(123)));
//! ```
//!
//! ## Modules
//!
//! - [`data_object`]: `DataObject` and its validated container types
//! - [`factory`]: one constructor per signature letter (`s`, `o`, `b`, `y`…`d`, `v`, `r`, `a`, `e`)
//! - [`encoder`]: `marshal`, data objects → busctl text
//! - [`decoder`]: `unmarshal`, busctl text → `Value`
//! - [`signature`]: type codes and the array sub-type position finder
//! - [`tokenize`](mod@tokenize): quote-aware token splitting
//! - [`json`]: build data objects from a signature and a JSON value
//! - [`command`]: busctl command line builder and process executor
//! - [`client`]: the `Dbus` client (call, emit, get-property and set-property)
//! - [`error`]: Error types

pub mod client;
pub mod command;
pub mod data_object;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod factory;
pub mod json;
pub mod signature;
pub mod tokenize;
pub mod value;

pub use data_object::{DataObject, Number};
pub use decoder::{unmarshal, unmarshal_response, unmarshal_tokens, TokenCursor};
pub use encoder::{marshal, Payload};
pub use error::BusctlError;
pub use json::{from_json, from_json_args};
pub use signature::{find_array_subtype_position, NumericKind};
pub use tokenize::{tokenize, unquote};
pub use value::Value;
