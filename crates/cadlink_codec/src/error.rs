//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding, decoding or registration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value to JSON.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a JSON document into the requested type.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// An envelope carried a tag that is not in the registry.
    #[error("unknown type tag `{tag}`")]
    UnknownType {
        /// The unresolved tag.
        tag: String,
    },

    /// An envelope carried a registered tag that is not valid at this position.
    #[error("tag `{tag}` is not a {expected}")]
    UnexpectedType {
        /// The tag that was found.
        tag: String,
        /// What the position accepts (a tag or a family name).
        expected: String,
    },

    /// The document is not shaped like an envelope where one was required.
    #[error("invalid envelope: {message}")]
    InvalidEnvelope {
        /// Description of the structural error.
        message: String,
    },

    /// Two record types declared the same tag.
    #[error("duplicate type tag `{tag}` (already registered by {existing})")]
    DuplicateTag {
        /// The contested tag.
        tag: String,
        /// Rust type name of the first registration.
        existing: String,
    },

    /// The same record type was registered twice.
    #[error("type {type_name} is already registered")]
    DuplicateType {
        /// Rust type name of the record type.
        type_name: String,
    },

    /// A type was encoded without being registered.
    #[error("type {type_name} is not registered")]
    UnregisteredType {
        /// Rust type name of the record type.
        type_name: String,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Create an unknown type error.
    pub fn unknown_type(tag: impl Into<String>) -> Self {
        Self::UnknownType { tag: tag.into() }
    }

    /// Create an unexpected type error.
    pub fn unexpected_type(tag: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::UnexpectedType {
            tag: tag.into(),
            expected: expected.into(),
        }
    }

    /// Create an invalid envelope error.
    pub fn invalid_envelope(message: impl Into<String>) -> Self {
        Self::InvalidEnvelope {
            message: message.into(),
        }
    }

    /// Returns true if this error was caused by an unregistered tag.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, CodecError::UnknownType { .. })
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::decoding_failed(err.to_string())
    }
}
