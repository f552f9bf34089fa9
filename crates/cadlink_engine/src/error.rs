//! Error types for the reconciliation engine.

use crate::host::{Handle, TableKind};
use cadlink_codec::CodecError;
use cadlink_protocol::SelectMode;
use thiserror::Error;

/// Result type for host document operations.
pub type HostResult<T> = Result<T, HostError>;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by a host document.
///
/// Raised while materializing or capturing a single record, these are
/// counted as a failure of that record and do not abort the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// No live object has this handle.
    #[error("no object with handle {0}")]
    NotFound(Handle),

    /// A record names a symbol that does not exist.
    #[error("{kind} `{name}` does not exist")]
    InvalidReference {
        /// Table the name was looked up in.
        kind: TableKind,
        /// The missing name.
        name: String,
    },

    /// A live symbol already has this name.
    #[error("{kind} `{name}` already exists")]
    DuplicateName {
        /// Table of the symbol.
        kind: TableKind,
        /// The name.
        name: String,
    },

    /// The object is not in the expected state or table.
    #[error("object {handle} is not {expected}")]
    WrongKind {
        /// The object.
        handle: Handle,
        /// What the caller expected.
        expected: &'static str,
    },

    /// The object is already open for write.
    #[error("object {0} is already open for write")]
    AlreadyOpen(Handle),

    /// `close` without a matching `open_for_write`.
    #[error("object {0} is not open for write")]
    NotOpen(Handle),

    /// An operation that needs a transaction ran outside one.
    #[error("no active transaction")]
    NoTransaction,

    /// A transaction is already active.
    #[error("a transaction is already active")]
    TransactionActive,

    /// The host rejected the native object.
    #[error("rejected by host: {message}")]
    Rejected {
        /// Host diagnostic.
        message: String,
    },

    /// A record could not be converted to or from a native object.
    #[error("conversion failed: {message}")]
    Conversion {
        /// Codec diagnostic.
        message: String,
    },
}

impl HostError {
    /// Creates an invalid reference error.
    pub fn invalid_reference(kind: TableKind, name: impl Into<String>) -> Self {
        Self::InvalidReference {
            kind,
            name: name.into(),
        }
    }

    /// Creates a rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

impl From<CodecError> for HostError {
    fn from(err: CodecError) -> Self {
        Self::Conversion {
            message: err.to_string(),
        }
    }
}

/// Errors that escape a whole query.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Host failure outside any single record, e.g. on commit.
    #[error(transparent)]
    Host(#[from] HostError),

    /// Decode or encode failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The select mode needs user interaction, which this bridge does not do.
    #[error("select mode {0:?} is not supported")]
    UnsupportedSelectMode(SelectMode),

    /// A required query field is unset.
    #[error("query field `{0}` is required")]
    MissingField(&'static str),
}
