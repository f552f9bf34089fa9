//! # cadlink Protocol
//!
//! Wire framing and the record graph exchanged between a cadlink client and
//! the bridge running inside the CAD host.
//!
//! This crate provides:
//! - [`frame`]: length-prefixed text frames and the `ping`/`pong` liveness check
//! - Geometry leaves ([`Vector2d`], [`Vector3d`], [`Matrix3d`], [`Extents3d`])
//! - Records: entities, symbol table records, dictionary items and the
//!   [`Database`] snapshot
//! - Requests ([`Query`]) and responses ([`QueryResult`], [`Status`])
//! - The process-wide [`registry()`] of record tags
//!
//! Polymorphic positions are typed by family enums ([`Entity`], [`Curve`],
//! [`DictionaryItem`], [`Query`], [`QueryResult`]) whose serde impls route
//! through the envelope codec, so a field declared as `Vec<Entity>` decodes
//! each element to the concrete type named by its tag.
//!
//! This is a pure protocol crate; the only I/O is over caller-provided
//! readers and writers.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod color;
mod database;
mod dictionary;
mod dimension;
mod entity;
mod family;
pub mod frame;
mod geometry;
mod query;
mod registry;
mod result;
mod symbol;

pub use color::{Color, ColorMethod, InvalidCode, LineWeight};
pub use database::{is_model_space, Database, Table, MODEL_SPACE, PAPER_SPACE};
pub use dictionary::{DictionaryItem, Group, MLeaderStyle};
pub use dimension::{AlignedDimension, DimensionProps, RadialDimension, RotatedDimension};
pub use entity::{
    Arc, BlockReference, Circle, Curve, DbText, Entity, EntityProps, Hatch, Line, Polyline, Vertex,
};
pub use frame::{
    encode_frame, read_frame, read_frame_limited, write_frame, FrameStage, FramingError,
    FramingResult, DEFAULT_MAX_FRAME_LEN, PING, PONG,
};
pub use geometry::{Extents3d, Matrix3d, Vector2d, Vector3d};
pub use query::{
    DbDeleteQuery, DbInsertQuery, DbSelectQuery, ExtentsMode, Query, SelectMode, TableFlags,
};
pub use registry::{
    decode_query, decode_result, encode_query, encode_result, register_all, registry, Record,
};
pub use result::{
    DbDeleteResult, DbInsertResult, DbSelectResult, PlainResult, QueryResult, ResultProps,
    Status, UNHANDLED_PREFIX,
};
pub use symbol::{
    BlockTableRecord, DimStyleTableRecord, FontDescriptor, LayerTableRecord, LinetypeSegment,
    LinetypeTableRecord, Symbol, SymbolProps, TextStyleTableRecord,
};

/// Version of the protocol crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
