//! Error types for the bridge.

use cadlink_codec::CodecError;
use cadlink_protocol::FramingError;
use thiserror::Error;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while running a bridge command.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// No connection is registered under the session key.
    #[error("no connection established for session `{0}`")]
    NoSession(String),

    /// The address did not resolve to any socket address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The liveness check carried something other than `ping`.
    #[error("wrong ping message {received:?}")]
    UnexpectedPing {
        /// What was received instead.
        received: String,
    },

    /// Framing failure on the session stream.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Envelope encode or decode failure.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns true if the peer closed the connection between frames.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, BridgeError::Framing(e) if e.is_clean_close())
    }

    /// Returns true if the read timeout elapsed with no request pending.
    pub fn is_idle(&self) -> bool {
        matches!(self, BridgeError::Framing(e) if e.is_idle())
    }

    /// Returns true for any read timeout on the session stream.
    pub fn is_timeout(&self) -> bool {
        match self {
            BridgeError::Framing(e) => e.is_timeout(),
            BridgeError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
