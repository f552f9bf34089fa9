//! Length-prefixed text frames.
//!
//! ## Frame Format
//!
//! ```text
//! ┌──────────────────────┬──────┬─────────────────────────┐
//! │ length (ASCII digits)│ '\n' │ payload (length bytes)   │
//! └──────────────────────┴──────┴─────────────────────────┘
//! ```
//!
//! The length counts UTF-8 bytes of the payload. There is no trailing
//! delimiter, so any payload bytes are allowed.

use std::fmt;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Liveness check sent by the client.
pub const PING: &str = "ping";

/// Reply to [`PING`].
pub const PONG: &str = "pong";

/// Default upper bound on a payload: 256 MiB.
pub const DEFAULT_MAX_FRAME_LEN: usize = 256 * 1024 * 1024;

/// Maximum number of digits in a length prefix.
const MAX_PREFIX_DIGITS: usize = 20;

/// Part of the frame being read when the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    /// The length prefix.
    Prefix,
    /// The payload.
    Payload,
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameStage::Prefix => f.write_str("length prefix"),
            FrameStage::Payload => f.write_str("payload"),
        }
    }
}

/// Result type for framing operations.
pub type FramingResult<T> = Result<T, FramingError>;

/// Errors reading or writing a frame.
#[derive(Error, Debug)]
pub enum FramingError {
    /// The stream ended inside the length prefix.
    #[error("stream ended in {stage} after {consumed} bytes")]
    UnexpectedEof {
        /// Where the stream ended.
        stage: FrameStage,
        /// Bytes of that stage read before the end.
        consumed: usize,
    },

    /// The length prefix is not a non-negative decimal integer.
    #[error("invalid length prefix {prefix:?}")]
    InvalidLength {
        /// The raw prefix, lossily decoded.
        prefix: String,
    },

    /// The announced payload exceeds the configured limit.
    #[error("frame of {len} bytes exceeds limit of {max} bytes")]
    TooLarge {
        /// Announced length.
        len: u64,
        /// Configured limit.
        max: usize,
    },

    /// The stream ended before the whole payload arrived.
    #[error("truncated payload: expected {expected} bytes, received {received}")]
    Truncated {
        /// Announced length.
        expected: usize,
        /// Bytes received.
        received: usize,
    },

    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The read timeout elapsed before any byte of the next frame arrived.
    /// The stream is still in step and can be read again.
    #[error("no frame arrived before the read timeout")]
    Idle,

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FramingError {
    /// Returns true if the peer closed the stream between frames.
    pub fn is_clean_close(&self) -> bool {
        matches!(
            self,
            FramingError::UnexpectedEof {
                stage: FrameStage::Prefix,
                consumed: 0
            }
        )
    }

    /// Returns true if the read timed out between frames.
    pub fn is_idle(&self) -> bool {
        matches!(self, FramingError::Idle)
    }

    /// Returns true for any read timeout, including one that hit inside a
    /// frame and left the stream out of step.
    pub fn is_timeout(&self) -> bool {
        match self {
            FramingError::Idle => true,
            FramingError::Io(e) => is_timeout_kind(e.kind()),
            _ => false,
        }
    }
}

fn is_timeout_kind(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Encodes `payload` as a complete frame.
pub fn encode_frame(payload: &str) -> Vec<u8> {
    let prefix = payload.len().to_string();
    let mut frame = Vec::with_capacity(prefix.len() + 1 + payload.len());
    frame.extend_from_slice(prefix.as_bytes());
    frame.push(b'\n');
    frame.extend_from_slice(payload.as_bytes());
    frame
}

/// Writes one frame and flushes the writer.
///
/// # Errors
///
/// Returns [`FramingError::Io`] if the write fails.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, payload: &str) -> FramingResult<()> {
    writer.write_all(&encode_frame(payload))?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame with the default size limit.
///
/// # Errors
///
/// See [`read_frame_limited`].
pub fn read_frame<R: Read + ?Sized>(reader: &mut R) -> FramingResult<String> {
    read_frame_limited(reader, DEFAULT_MAX_FRAME_LEN)
}

/// Reads one frame whose payload may be at most `max_len` bytes.
///
/// The prefix is read a byte at a time so nothing past the frame is
/// consumed.
///
/// # Errors
///
/// - [`FramingError::Idle`] if a read timeout hits before the first byte
/// - [`FramingError::UnexpectedEof`] if the stream ends before the newline
/// - [`FramingError::InvalidLength`] if the prefix is empty, too long or not
///   all digits
/// - [`FramingError::TooLarge`] before any payload byte is read
/// - [`FramingError::Truncated`] if the stream ends inside the payload
/// - [`FramingError::InvalidUtf8`] if the payload is not UTF-8
pub fn read_frame_limited<R: Read + ?Sized>(
    reader: &mut R,
    max_len: usize,
) -> FramingResult<String> {
    let len = read_prefix(reader)?;
    let expected = usize::try_from(len)
        .ok()
        .filter(|&n| n <= max_len)
        .ok_or(FramingError::TooLarge { len, max: max_len })?;

    let mut payload = Vec::with_capacity(expected.min(64 * 1024));
    let received = reader.take(len).read_to_end(&mut payload)?;
    if received < expected {
        return Err(FramingError::Truncated { expected, received });
    }
    Ok(String::from_utf8(payload)?)
}

fn read_prefix<R: Read + ?Sized>(reader: &mut R) -> FramingResult<u64> {
    let mut digits = Vec::with_capacity(MAX_PREFIX_DIGITS);
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => {
                return Err(FramingError::UnexpectedEof {
                    stage: FrameStage::Prefix,
                    consumed: digits.len(),
                })
            }
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => {
                digits.push(byte[0]);
                if digits.len() > MAX_PREFIX_DIGITS || !byte[0].is_ascii_digit() {
                    return Err(invalid_length(&digits));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if digits.is_empty() && is_timeout_kind(e.kind()) => {
                return Err(FramingError::Idle)
            }
            Err(e) => return Err(e.into()),
        }
    }

    if digits.is_empty() {
        return Err(invalid_length(&digits));
    }
    std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| invalid_length(&digits))
}

fn invalid_length(digits: &[u8]) -> FramingError {
    FramingError::InvalidLength {
        prefix: String::from_utf8_lossy(digits).into_owned(),
    }
}
