//! Error types for data-object construction, marshalling and busctl execution.

use thiserror::Error;

/// Errors that can occur while building, marshalling or unmarshalling D-Bus data.
#[derive(Error, Debug)]
pub enum BusctlError {
    /// A data object constructor received a value of the wrong shape
    /// (empty container, mixed sibling signatures, container dictionary key,
    /// nested variant, malformed object path, out-of-range number).
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The marshaller (or the JSON builder) received input it cannot encode.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A type code outside the recognised set was met during decoding.
    #[error("Unknown signature: '{0}'")]
    UnknownSignature(char),

    /// A signature with unbalanced brackets or an incomplete container.
    #[error("Invalid signature '{signature}': {message}")]
    InvalidSignature { signature: String, message: String },

    /// A response token that could not be read as the expected type.
    /// `position` is the 0-based index into the token list.
    #[error("Invalid token at position {position}: {message}")]
    InvalidToken { position: usize, message: String },

    /// `busctl` exited with a non-zero status. `message` is the first output line.
    #[error("Command failed with exit code {code}: {message}")]
    CommandFailure { code: i32, message: String },

    /// A command was executed before a method was set.
    #[error("Command method not specified")]
    MissingMethod,

    /// The busctl process could not be spawned.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BusctlError {
    pub(crate) fn signature(signature: &str, message: impl Into<String>) -> Self {
        BusctlError::InvalidSignature {
            signature: signature.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout busctl-core.
pub type Result<T> = std::result::Result<T, BusctlError>;
