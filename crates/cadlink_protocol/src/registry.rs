//! The process-wide type registry.
//!
//! Every record type reachable from the wire is listed in [`Record`]. The
//! registry built from that list is created on first use and shared by all
//! polymorphic fields.

use crate::color::Color;
use crate::database::Database;
use crate::dictionary::{Group, MLeaderStyle};
use crate::dimension::{AlignedDimension, RadialDimension, RotatedDimension};
use crate::entity::{Arc, BlockReference, Circle, DbText, Hatch, Line, Polyline, Vertex};
use crate::family::record_types;
use crate::query::{DbDeleteQuery, DbInsertQuery, DbSelectQuery, Query};
use crate::result::{DbDeleteResult, DbInsertResult, DbSelectResult, PlainResult, QueryResult};
use crate::symbol::{
    BlockTableRecord, DimStyleTableRecord, FontDescriptor, LayerTableRecord, LinetypeSegment,
    LinetypeTableRecord, TextStyleTableRecord,
};
use cadlink_codec::{CodecResult, TypeRegistry};
use std::sync::OnceLock;

record_types! {
    /// Any registered record.
    pub enum Record {
        Color,
        Line,
        Arc,
        Circle,
        Polyline,
        Vertex,
        DbText,
        BlockReference,
        Hatch,
        AlignedDimension,
        RotatedDimension,
        RadialDimension,
        BlockTableRecord,
        LayerTableRecord,
        LinetypeTableRecord,
        LinetypeSegment,
        TextStyleTableRecord,
        FontDescriptor,
        DimStyleTableRecord,
        MLeaderStyle,
        Group,
        Database,
        DbInsertQuery,
        DbSelectQuery,
        DbDeleteQuery,
        PlainResult,
        DbInsertResult,
        DbSelectResult,
        DbDeleteResult,
    }
}

static REGISTRY: OnceLock<CodecResult<TypeRegistry<Record>>> = OnceLock::new();

fn build_registry() -> CodecResult<TypeRegistry<Record>> {
    let mut registry = TypeRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}

/// Returns the shared registry, building it on first call.
///
/// # Errors
///
/// Returns the registration error if two record types share a tag. The
/// error is sticky: every later call returns it too.
pub fn registry() -> CodecResult<&'static TypeRegistry<Record>> {
    REGISTRY
        .get_or_init(build_registry)
        .as_ref()
        .map_err(Clone::clone)
}

/// Decodes a request payload.
///
/// # Errors
///
/// Fails with `UnknownType` if any envelope in the document carries an
/// unregistered tag, and with `DecodingFailed` if the document is not a
/// query.
pub fn decode_query(json: &str) -> CodecResult<Query> {
    cadlink_codec::decode(registry()?, json)
}

/// Encodes a request payload.
///
/// # Errors
///
/// Fails if the registry cannot be built.
pub fn encode_query(query: &Query) -> CodecResult<String> {
    registry()?;
    cadlink_codec::encode(query)
}

/// Decodes a response payload.
///
/// # Errors
///
/// Same as [`decode_query`].
pub fn decode_result(json: &str) -> CodecResult<QueryResult> {
    cadlink_codec::decode(registry()?, json)
}

/// Encodes a response payload.
///
/// # Errors
///
/// Fails if the registry cannot be built.
pub fn encode_result(result: &QueryResult) -> CodecResult<String> {
    registry()?;
    cadlink_codec::encode(result)
}
