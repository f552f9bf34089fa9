//! The capability surface of a live CAD document.
//!
//! The engine never touches native objects directly. It asks the host to
//! look up, add, open and append them, and asks the host's per-record
//! mapping to turn a [`Record`](cadlink_protocol::Record) into a native
//! object and back.

use crate::error::{EngineResult, HostResult};
use cadlink_protocol::{
    BlockTableRecord, DimStyleTableRecord, Entity, Extents3d, Group, LayerTableRecord,
    LinetypeTableRecord, MLeaderStyle, Matrix3d, Symbol, TextStyleTableRecord,
};
use cadlink_codec::Tagged;
use std::fmt;

/// Identity of a native object, stable for the life of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub i64);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A table of named objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    /// Blocks, including model and paper space.
    Block,
    /// Layers.
    Layer,
    /// Linetypes.
    Linetype,
    /// Text styles.
    TextStyle,
    /// Dimension styles.
    DimStyle,
    /// Multileader styles.
    MLeaderStyle,
    /// Groups.
    Group,
}

impl TableKind {
    /// Every table kind.
    pub const ALL: [TableKind; 7] = [
        TableKind::Block,
        TableKind::Layer,
        TableKind::Linetype,
        TableKind::TextStyle,
        TableKind::DimStyle,
        TableKind::MLeaderStyle,
        TableKind::Group,
    ];
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Block => "block",
            TableKind::Layer => "layer",
            TableKind::Linetype => "linetype",
            TableKind::TextStyle => "text style",
            TableKind::DimStyle => "dimension style",
            TableKind::MLeaderStyle => "multileader style",
            TableKind::Group => "group",
        };
        f.write_str(name)
    }
}

/// A live drawing document.
///
/// Mutating calls are only valid inside a transaction. Objects are edited
/// by bracketing: `open_for_write` hands out a writable copy and `close`
/// stores it back.
pub trait HostDocument {
    /// The host's native object representation.
    type Native;

    /// Starts the transaction all changes of one query run in.
    fn begin_transaction(&mut self) -> HostResult<()>;

    /// Makes the transaction's changes permanent.
    fn commit_transaction(&mut self) -> HostResult<()>;

    /// Discards the transaction's changes.
    fn abort_transaction(&mut self);

    /// Looks up a live symbol by name.
    fn find_symbol(&self, kind: TableKind, name: &str) -> Option<Handle>;

    /// Adds a new symbol to its table.
    fn add_symbol(&mut self, kind: TableKind, native: Self::Native) -> HostResult<Handle>;

    /// Gives a live symbol a new name, unique in its table.
    fn rename_symbol(&mut self, handle: Handle, name: &str) -> HostResult<()>;

    /// Opens an object for write and returns a writable copy.
    fn open_for_write(&mut self, handle: Handle) -> HostResult<Self::Native>;

    /// Closes an object opened for write, storing `native` if given.
    fn close(&mut self, handle: Handle, native: Option<Self::Native>) -> HostResult<()>;

    /// Appends a new entity to a block.
    fn append_entity(&mut self, container: Handle, native: Self::Native) -> HostResult<Handle>;

    /// Erases an object. Erasing a block erases its entities.
    fn erase(&mut self, handle: Handle) -> HostResult<()>;

    /// Live symbols of a table in creation order.
    fn symbols(&self, kind: TableKind) -> Vec<Handle>;

    /// Live entities of a block in drawing order.
    fn entities(&self, container: Handle) -> HostResult<Vec<Handle>>;

    /// Read access to a live object.
    fn native(&self, handle: Handle) -> HostResult<&Self::Native>;

    /// Applies a transform to a live entity.
    fn transform_by(&mut self, handle: Handle, transform: &Matrix3d) -> HostResult<()>;

    /// Bounds of a live entity, `None` if it has no valid bounds.
    fn bounds(&self, handle: Handle) -> HostResult<Option<Extents3d>>;

    /// Recomputes the derived geometry of a dimension.
    fn regenerate_layout(&mut self, handle: Handle) -> HostResult<()>;

    /// Points every reference to block `old` at block `new`. Returns the
    /// number of references changed.
    fn redirect_references(&mut self, old: Handle, new: Handle) -> HostResult<usize>;

    /// Adds an entity to a group. Returns false if it was already a member.
    fn add_to_group(&mut self, group: Handle, entity: Handle) -> HostResult<bool>;

    /// Bounds of everything in the model space.
    fn document_extents(&self) -> Extents3d;

    /// The model space block.
    fn model_space(&self) -> HostResult<Handle>;
}

/// Conversion of one record type to and from the host's native objects.
///
/// This is where the per-field property copying lives. The engine only
/// calls these two operations.
pub trait NativeMapping<R>: HostDocument {
    /// Builds a native object from `record`.
    ///
    /// With `existing` set, the present fields of `record` are applied onto
    /// it and absent fields leave it untouched. Without, a new object is
    /// created.
    fn materialize(&self, record: &R, existing: Option<Self::Native>) -> HostResult<Self::Native>;

    /// Reads a live object back into a record with `id` set.
    fn capture(&self, handle: Handle, native: &Self::Native) -> HostResult<R>;
}

/// A host that can map every record type the engine handles.
pub trait CadDocument:
    HostDocument
    + NativeMapping<Entity>
    + NativeMapping<BlockTableRecord>
    + NativeMapping<LayerTableRecord>
    + NativeMapping<LinetypeTableRecord>
    + NativeMapping<TextStyleTableRecord>
    + NativeMapping<DimStyleTableRecord>
    + NativeMapping<MLeaderStyle>
    + NativeMapping<Group>
{
}

impl<H> CadDocument for H where
    H: HostDocument
        + NativeMapping<Entity>
        + NativeMapping<BlockTableRecord>
        + NativeMapping<LayerTableRecord>
        + NativeMapping<LinetypeTableRecord>
        + NativeMapping<TextStyleTableRecord>
        + NativeMapping<DimStyleTableRecord>
        + NativeMapping<MLeaderStyle>
        + NativeMapping<Group>
{
}

/// A record stored in a named table.
pub trait SymbolRecord: Symbol + Tagged + Clone {
    /// The table the record lives in.
    const KIND: TableKind;
}

impl SymbolRecord for BlockTableRecord {
    const KIND: TableKind = TableKind::Block;
}

impl SymbolRecord for LayerTableRecord {
    const KIND: TableKind = TableKind::Layer;
}

impl SymbolRecord for LinetypeTableRecord {
    const KIND: TableKind = TableKind::Linetype;
}

impl SymbolRecord for TextStyleTableRecord {
    const KIND: TableKind = TableKind::TextStyle;
}

impl SymbolRecord for DimStyleTableRecord {
    const KIND: TableKind = TableKind::DimStyle;
}

impl SymbolRecord for MLeaderStyle {
    const KIND: TableKind = TableKind::MLeaderStyle;
}

impl SymbolRecord for Group {
    const KIND: TableKind = TableKind::Group;
}

/// Runs `f` inside a transaction.
///
/// If `f` returns `Ok`, the transaction is committed. If it returns `Err`,
/// the transaction is aborted and the error returned.
pub fn with_transaction<H, T, F>(host: &mut H, f: F) -> EngineResult<T>
where
    H: HostDocument + ?Sized,
    F: FnOnce(&mut H) -> EngineResult<T>,
{
    host.begin_transaction()?;
    match f(host) {
        Ok(value) => {
            host.commit_transaction()?;
            Ok(value)
        }
        Err(e) => {
            host.abort_transaction();
            Err(e)
        }
    }
}
