//! Wire vectors shared with client implementations.
//!
//! Clients live in other processes and other languages. These vectors pin
//! down the exact bytes of a frame and how the bridge classifies a request,
//! so a client test suite can check itself against the same table.

use cadlink_codec::CodecError;
use cadlink_protocol::FramingError;
use serde::{Deserialize, Serialize};

/// A test vector that can be shared across implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Input text.
    pub input: String,
    /// Expected output, when the input is valid.
    pub expected: Option<String>,
    /// Expected error kind (if this should fail).
    pub expected_error: Option<String>,
}

impl WireVector {
    fn ok(id: &str, description: &str, input: &str, expected: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            input: input.into(),
            expected: Some(expected.into()),
            expected_error: None,
        }
    }

    fn err(id: &str, description: &str, input: &str, kind: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            input: input.into(),
            expected: None,
            expected_error: Some(kind.into()),
        }
    }
}

/// Payload to frame vectors. `input` is the payload, `expected` the frame.
pub fn frame_encoding_vectors() -> Vec<WireVector> {
    vec![
        WireVector::ok("frame_ping", "Liveness check", "ping", "4\nping"),
        WireVector::ok("frame_pong", "Liveness reply", "pong", "4\npong"),
        WireVector::ok("frame_empty", "Empty payload", "", "0\n"),
        WireVector::ok(
            "frame_multibyte",
            "Length counts UTF-8 bytes, not characters",
            "h\u{e9}llo",
            "6\nh\u{e9}llo",
        ),
        WireVector::ok(
            "frame_newline_payload",
            "Payload may contain the delimiter",
            "a\nb",
            "3\na\nb",
        ),
    ]
}

/// Raw stream to payload vectors for the reading side.
pub fn frame_decoding_vectors() -> Vec<WireVector> {
    vec![
        WireVector::ok("read_ping", "Single frame", "4\nping", "ping"),
        WireVector::ok(
            "read_first_of_two",
            "Only the first frame is consumed",
            "4\nping4\npong",
            "ping",
        ),
        WireVector::err("read_closed", "Stream closed between frames", "", "closed"),
        WireVector::err("read_bad_prefix", "Non-digit prefix", "4x\nping", "invalid_length"),
        WireVector::err("read_no_digits", "Empty prefix", "\nping", "invalid_length"),
        WireVector::err("read_truncated", "Payload shorter than announced", "9\nping", "truncated"),
        WireVector::err("read_eof_in_prefix", "Stream ends inside the prefix", "12", "eof"),
    ]
}

/// Request payload vectors. `expected` is the decoded query tag.
pub fn request_vectors() -> Vec<WireVector> {
    vec![
        WireVector::ok(
            "select_layers",
            "Select of the layer table",
            r#"{"__cls__":"cadlink.query.DbSelectQuery","__mbr__":{"mode":0,"table_flags":8}}"#,
            "cadlink.query.DbSelectQuery",
        ),
        WireVector::ok(
            "select_defaults",
            "Every member absent",
            r#"{"__cls__":"cadlink.query.DbSelectQuery","__mbr__":{}}"#,
            "cadlink.query.DbSelectQuery",
        ),
        WireVector::ok(
            "insert_line",
            "Insert of one line into model space",
            concat!(
                r#"{"__cls__":"cadlink.query.DbInsertQuery","__mbr__":{"upsert":true,"#,
                r#""database":{"__cls__":"cadlink.db.Database","__mbr__":{"block_table":{"#,
                r#""*Model_Space":{"__cls__":"cadlink.db.BlockTableRecord","__mbr__":{"#,
                r#""entities":[{"__cls__":"cadlink.db.Line","__mbr__":{"#,
                r#""start_point":[0,0,0],"end_point":[1,1,0]}}]}}}}}}}"#,
            ),
            "cadlink.query.DbInsertQuery",
        ),
        WireVector::ok(
            "delete_layer",
            "Delete of one layer by key",
            concat!(
                r#"{"__cls__":"cadlink.query.DbDeleteQuery","__mbr__":{"#,
                r#""database":{"__cls__":"cadlink.db.Database","__mbr__":{"layer_table":{"#,
                r#""walls":{"__cls__":"cadlink.db.LayerTableRecord","__mbr__":{}}}}}}}"#,
            ),
            "cadlink.query.DbDeleteQuery",
        ),
        WireVector::err(
            "unknown_nested_tag",
            "Unregistered tag deep inside the document",
            concat!(
                r#"{"__cls__":"cadlink.query.DbInsertQuery","__mbr__":{"#,
                r#""database":{"__cls__":"cadlink.db.Database","__mbr__":{"block_table":{"#,
                r#""*Model_Space":{"__cls__":"cadlink.db.BlockTableRecord","__mbr__":{"#,
                r#""entities":[{"__cls__":"cadlink.db.Spline","__mbr__":{}}]}}}}}}}"#,
            ),
            "unknown_type",
        ),
        WireVector::err(
            "result_as_query",
            "Registered tag outside the query family",
            r#"{"__cls__":"cadlink.result.Result","__mbr__":{}}"#,
            "decoding_failed",
        ),
        WireVector::err(
            "numeric_tag",
            "Tag that is not a string",
            r#"{"__cls__":7,"__mbr__":{}}"#,
            "invalid_envelope",
        ),
        WireVector::err("not_json", "Malformed JSON", "{ not json", "decoding_failed"),
    ]
}

/// Short name of a codec error, as used in `expected_error`.
pub fn codec_error_kind(err: &CodecError) -> &'static str {
    match err {
        CodecError::EncodingFailed { .. } => "encoding_failed",
        CodecError::DecodingFailed { .. } => "decoding_failed",
        CodecError::UnknownType { .. } => "unknown_type",
        CodecError::UnexpectedType { .. } => "unexpected_type",
        CodecError::InvalidEnvelope { .. } => "invalid_envelope",
        CodecError::DuplicateTag { .. } => "duplicate_tag",
        CodecError::DuplicateType { .. } => "duplicate_type",
        CodecError::UnregisteredType { .. } => "unregistered_type",
    }
}

/// Short name of a framing error, as used in `expected_error`.
pub fn framing_error_kind(err: &FramingError) -> &'static str {
    match err {
        e if e.is_clean_close() => "closed",
        FramingError::UnexpectedEof { .. } => "eof",
        FramingError::InvalidLength { .. } => "invalid_length",
        FramingError::TooLarge { .. } => "too_large",
        FramingError::Truncated { .. } => "truncated",
        FramingError::InvalidUtf8(_) => "invalid_utf8",
        FramingError::Idle => "idle",
        FramingError::Io(_) => "io",
    }
}

/// All vectors as JSON, for export to client test suites.
pub fn all_vectors_json() -> serde_json::Result<String> {
    let vectors = AllWireVectors {
        frame_encoding: frame_encoding_vectors(),
        frame_decoding: frame_decoding_vectors(),
        requests: request_vectors(),
    };
    serde_json::to_string_pretty(&vectors)
}

#[derive(Debug, Serialize, Deserialize)]
struct AllWireVectors {
    frame_encoding: Vec<WireVector>,
    frame_decoding: Vec<WireVector>,
    requests: Vec<WireVector>,
}
