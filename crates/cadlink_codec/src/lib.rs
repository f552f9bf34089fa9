//! # cadlink Codec
//!
//! Polymorphic JSON envelope encoding for cadlink.
//!
//! This crate provides:
//! - [`Field`], a three-state optional (absent / null / value)
//! - [`Envelope`] and [`RawEnvelope`], the `{"__cls__", "__mbr__"}` wrapper
//! - [`TypeRegistry`], the tag to record-type map used to pick the concrete
//!   type of a polymorphic field while decoding
//!
//! ## Wire Rules
//!
//! - Every record travels as `{"__cls__": "<tag>", "__mbr__": {...}}`
//! - Absent fields are omitted, never written as `null`
//! - A key present with `null` means "explicitly cleared"
//! - Vectors and matrices are plain float arrays without an envelope
//! - Field names are snake_case
//!
//! ## Usage
//!
//! ```
//! use cadlink_codec::{decode, encode, Envelope, Field, Tagged, TypeRegistry};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Note {
//!     #[serde(skip_serializing_if = "Field::is_absent")]
//!     text: Field<String>,
//! }
//!
//! impl Tagged for Note {
//!     const TAG: &'static str = "demo.Note";
//! }
//!
//! let mut registry: TypeRegistry<Note> = TypeRegistry::new();
//! registry.register::<Note>().unwrap();
//!
//! let json = encode(&Envelope(Note::default())).unwrap();
//! assert_eq!(json, r#"{"__cls__":"demo.Note","__mbr__":{}}"#);
//!
//! let note: Envelope<Note> = decode(&registry, &json).unwrap();
//! assert!(note.text.is_absent());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod envelope;
mod error;
mod field;
mod registry;

pub use envelope::{Envelope, RawEnvelope, Tagged, TaggedRef, CLASS_KEY, MEMBER_KEY};
pub use error::{CodecError, CodecResult};
pub use field::Field;
pub use registry::{
    deserialize_polymorphic, serialize_polymorphic, DecodeFn, Registration, TypeRegistry,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Encodes a value as compact JSON.
///
/// # Errors
///
/// Returns an error if serialization fails, for example when a polymorphic
/// field holds an unregistered type.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> CodecResult<String> {
    serde_json::to_string(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Encodes a value as a JSON tree.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> CodecResult<Value> {
    serde_json::to_value(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Decodes a JSON document after checking its tags against `registry`.
///
/// # Errors
///
/// Returns [`CodecError::UnknownType`] if any envelope in the document uses
/// an unregistered tag, and [`CodecError::DecodingFailed`] if the document
/// does not fit `T`.
pub fn decode<T: DeserializeOwned, R>(registry: &TypeRegistry<R>, json: &str) -> CodecResult<T> {
    let value: Value = serde_json::from_str(json)?;
    decode_value(registry, value)
}

/// Decodes a JSON tree after checking its tags against `registry`.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_value<T: DeserializeOwned, R>(
    registry: &TypeRegistry<R>,
    value: Value,
) -> CodecResult<T> {
    registry.validate(&value)?;
    serde_json::from_value(value).map_err(CodecError::from)
}
