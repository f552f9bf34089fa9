//! In-memory host document for testing.

use crate::error::{HostError, HostResult};
use crate::host::{Handle, HostDocument, NativeMapping, SymbolRecord, TableKind};
use cadlink_codec::{decode_value, encode_value, RawEnvelope, Tagged, CLASS_KEY, MEMBER_KEY};
use cadlink_protocol::{
    registry, BlockTableRecord, DimStyleTableRecord, Entity, Extents3d, Group, LayerTableRecord,
    LinetypeTableRecord, MLeaderStyle, Matrix3d, TextStyleTableRecord, MODEL_SPACE, PAPER_SPACE,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Fields naming another symbol, with the table the name must exist in.
const REFERENCES: [(&str, TableKind); 6] = [
    ("layer", TableKind::Layer),
    ("linetype", TableKind::Linetype),
    ("block_name", TableKind::Block),
    ("text_style_name", TableKind::TextStyle),
    ("dimension_style_name", TableKind::DimStyle),
    ("dimtxsty", TableKind::TextStyle),
];

/// Fields that describe document structure and are never stored.
const STRUCTURAL: [&str; 3] = ["id", "entities", "entity_ids"];

/// What a native object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A named record in a table.
    Symbol(TableKind),
    /// An entity owned by a block.
    Entity,
}

/// A native object: the record's fields as JSON plus host-side links.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeObject {
    tag: String,
    kind: ObjectKind,
    fields: Map<String, Value>,
    block: Option<Handle>,
    layout_generated: bool,
}

impl NativeObject {
    fn new(tag: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            tag: tag.into(),
            kind,
            fields: Map::new(),
            block: None,
            layout_generated: false,
        }
    }

    /// Tag of the record this object was built from.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Kind of object.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Symbol name.
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// A stored field. Cleared fields are stored as JSON null.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The block a block reference points at.
    pub fn referenced_block(&self) -> Option<Handle> {
        self.block
    }

    /// Whether a dimension's layout has been computed.
    pub fn layout_generated(&self) -> bool {
        self.layout_generated
    }
}

/// Calls made against a [`MemoryDocument`].
///
/// Counters survive aborted transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// `open_for_write` calls that succeeded.
    pub opened_for_write: usize,
    /// Entities appended.
    pub appended: usize,
    /// Objects erased, not counting a block's entities.
    pub erased: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    object: NativeObject,
    owner: Option<Handle>,
    protected: bool,
    /// Entities of a block, members of a group.
    children: Vec<Handle>,
}

#[derive(Debug, Clone, Default)]
struct State {
    entries: BTreeMap<Handle, Entry>,
    tables: BTreeMap<TableKind, Vec<Handle>>,
    last: i64,
}

/// A drawing held in memory.
///
/// A new document looks like a fresh drawing: layer `0`, linetypes
/// `ByBlock`, `ByLayer` and `Continuous`, a `Standard` text style and
/// dimension style, and the model and paper space blocks. These defaults
/// cannot be erased.
///
/// Symbol names are matched case-insensitively. Fields that name another
/// symbol must name a live one.
///
/// # Example
///
/// ```rust
/// use cadlink_engine::{HostDocument, MemoryDocument, TableKind};
///
/// let doc = MemoryDocument::new();
/// assert!(doc.find_symbol(TableKind::Layer, "0").is_some());
/// assert!(doc.find_symbol(TableKind::Block, "*MODEL_SPACE").is_some());
/// ```
#[derive(Debug)]
pub struct MemoryDocument {
    state: State,
    saved: Option<State>,
    open: BTreeSet<Handle>,
    counters: Counters,
}

impl MemoryDocument {
    /// Creates a document holding the default symbols.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            state: State::default(),
            saved: None,
            open: BTreeSet::new(),
            counters: Counters::default(),
        };
        let defaults = [
            (TableKind::Layer, LayerTableRecord::TAG, "0"),
            (TableKind::Linetype, LinetypeTableRecord::TAG, "ByBlock"),
            (TableKind::Linetype, LinetypeTableRecord::TAG, "ByLayer"),
            (TableKind::Linetype, LinetypeTableRecord::TAG, "Continuous"),
            (TableKind::TextStyle, TextStyleTableRecord::TAG, "Standard"),
            (TableKind::DimStyle, DimStyleTableRecord::TAG, "Standard"),
            (TableKind::Block, BlockTableRecord::TAG, MODEL_SPACE),
            (TableKind::Block, BlockTableRecord::TAG, PAPER_SPACE),
        ];
        for (kind, tag, name) in defaults {
            let mut object = NativeObject::new(tag, ObjectKind::Symbol(kind));
            object
                .fields
                .insert("name".to_string(), Value::String(name.to_string()));
            doc.insert_entry(object, None, true);
        }
        doc
    }

    /// Calls made so far.
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Zeroes the counters.
    pub fn reset_counters(&mut self) {
        self.counters = Counters::default();
    }

    /// Returns true while a transaction is active.
    pub fn in_transaction(&self) -> bool {
        self.saved.is_some()
    }

    /// Number of live objects, entities included.
    pub fn object_count(&self) -> usize {
        self.state.entries.len()
    }

    fn insert_entry(&mut self, object: NativeObject, owner: Option<Handle>, protected: bool) -> Handle {
        self.state.last += 1;
        let handle = Handle(self.state.last);
        if let ObjectKind::Symbol(kind) = object.kind {
            self.state.tables.entry(kind).or_default().push(handle);
        }
        if let Some(owner) = owner {
            if let Some(container) = self.state.entries.get_mut(&owner) {
                container.children.push(handle);
            }
        }
        self.state.entries.insert(
            handle,
            Entry {
                object,
                owner,
                protected,
                children: Vec::new(),
            },
        );
        handle
    }

    fn entry(&self, handle: Handle) -> HostResult<&Entry> {
        self.state
            .entries
            .get(&handle)
            .ok_or(HostError::NotFound(handle))
    }

    fn entry_mut(&mut self, handle: Handle) -> HostResult<&mut Entry> {
        self.state
            .entries
            .get_mut(&handle)
            .ok_or(HostError::NotFound(handle))
    }

    fn entity_entry_mut(&mut self, handle: Handle) -> HostResult<&mut Entry> {
        let entry = self.entry_mut(handle)?;
        if entry.object.kind != ObjectKind::Entity {
            return Err(HostError::WrongKind {
                handle,
                expected: "an entity",
            });
        }
        Ok(entry)
    }

    fn require_transaction(&self) -> HostResult<()> {
        if self.in_transaction() {
            Ok(())
        } else {
            Err(HostError::NoTransaction)
        }
    }

    fn remove(&mut self, handle: Handle) {
        let Some(entry) = self.state.entries.remove(&handle) else {
            return;
        };
        match entry.object.kind {
            ObjectKind::Symbol(kind) => {
                if let Some(table) = self.state.tables.get_mut(&kind) {
                    table.retain(|&h| h != handle);
                }
                if kind == TableKind::Block {
                    for child in entry.children {
                        self.remove(child);
                    }
                }
            }
            ObjectKind::Entity => {
                for other in self.state.entries.values_mut() {
                    if other.object.kind == ObjectKind::Symbol(TableKind::Group) {
                        other.children.retain(|&h| h != handle);
                    }
                }
            }
        }
        if let Some(owner) = entry.owner.and_then(|o| self.state.entries.get_mut(&o)) {
            owner.children.retain(|&h| h != handle);
        }
    }

    /// Applies `fields` onto `native`, checking every reference first.
    fn apply_fields(&self, native: &mut NativeObject, fields: Map<String, Value>) -> HostResult<()> {
        for (key, value) in &fields {
            let Some(name) = value.as_str() else {
                continue;
            };
            if let Some(&(_, kind)) = REFERENCES.iter().find(|(k, _)| *k == key.as_str()) {
                let target = self
                    .find_symbol(kind, name)
                    .ok_or_else(|| HostError::invalid_reference(kind, name))?;
                if kind == TableKind::Block {
                    native.block = Some(target);
                }
            }
        }
        for (key, value) in fields {
            if !STRUCTURAL.contains(&key.as_str()) {
                native.fields.insert(key, value);
            }
        }
        Ok(())
    }

    fn materialize_symbol<R: SymbolRecord + Serialize>(
        &self,
        record: &R,
        existing: Option<NativeObject>,
    ) -> HostResult<NativeObject> {
        let fields = into_object(encode_value(record)?)?;
        let mut native =
            existing.unwrap_or_else(|| NativeObject::new(R::TAG, ObjectKind::Symbol(R::KIND)));
        self.apply_fields(&mut native, fields)?;
        Ok(native)
    }

    fn capture_symbol<R: SymbolRecord + DeserializeOwned>(
        &self,
        handle: Handle,
        native: &NativeObject,
    ) -> HostResult<R> {
        if native.kind != ObjectKind::Symbol(R::KIND) {
            return Err(HostError::WrongKind {
                handle,
                expected: R::TAG,
            });
        }
        let mut fields = native.fields.clone();
        fields.insert("id".to_string(), Value::from(handle.0));
        if R::KIND == TableKind::Group {
            let members = self
                .entry(handle)
                .map(|entry| entry.children.iter().map(|h| Value::from(h.0)).collect::<Vec<_>>())
                .unwrap_or_default();
            fields.insert("entity_ids".to_string(), Value::Array(members));
        }
        Ok(decode_value(registry()?, Value::Object(fields))?)
    }

    fn materialize_entity(
        &self,
        record: &Entity,
        existing: Option<NativeObject>,
    ) -> HostResult<NativeObject> {
        let envelope = RawEnvelope::from_value(encode_value(record)?)?;
        let mut native = existing.unwrap_or_else(|| NativeObject::new(record.tag(), ObjectKind::Entity));
        self.apply_fields(&mut native, into_object(envelope.into_payload())?)?;
        Ok(native)
    }

    fn capture_entity(&self, handle: Handle, native: &NativeObject) -> HostResult<Entity> {
        if native.kind != ObjectKind::Entity {
            return Err(HostError::WrongKind {
                handle,
                expected: "an entity",
            });
        }
        let mut fields = native.fields.clone();
        fields.insert("id".to_string(), Value::from(handle.0));
        let mut envelope = Map::new();
        envelope.insert(CLASS_KEY.to_string(), Value::String(native.tag.clone()));
        envelope.insert(MEMBER_KEY.to_string(), Value::Object(fields));
        Ok(decode_value(registry()?, Value::Object(envelope))?)
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

fn into_object(value: Value) -> HostResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(HostError::rejected("record did not encode as an object")),
    }
}

impl HostDocument for MemoryDocument {
    type Native = NativeObject;

    fn begin_transaction(&mut self) -> HostResult<()> {
        if self.in_transaction() {
            return Err(HostError::TransactionActive);
        }
        self.saved = Some(self.state.clone());
        Ok(())
    }

    fn commit_transaction(&mut self) -> HostResult<()> {
        self.saved.take().ok_or(HostError::NoTransaction)?;
        self.open.clear();
        Ok(())
    }

    fn abort_transaction(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.state = saved;
            debug!("transaction aborted");
        }
        self.open.clear();
    }

    fn find_symbol(&self, kind: TableKind, name: &str) -> Option<Handle> {
        self.state
            .tables
            .get(&kind)?
            .iter()
            .find(|h| {
                self.state
                    .entries
                    .get(h)
                    .and_then(|entry| entry.object.name())
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .copied()
    }

    fn add_symbol(&mut self, kind: TableKind, native: NativeObject) -> HostResult<Handle> {
        self.require_transaction()?;
        if native.kind != ObjectKind::Symbol(kind) {
            return Err(HostError::rejected(format!(
                "{} does not belong in the {kind} table",
                native.tag
            )));
        }
        let name = native
            .name()
            .ok_or_else(|| HostError::rejected(format!("{kind} has no name")))?;
        if self.find_symbol(kind, name).is_some() {
            return Err(HostError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
        Ok(self.insert_entry(native, None, false))
    }

    fn rename_symbol(&mut self, handle: Handle, name: &str) -> HostResult<()> {
        self.require_transaction()?;
        let entry = self.entry(handle)?;
        let ObjectKind::Symbol(kind) = entry.object.kind else {
            return Err(HostError::WrongKind {
                handle,
                expected: "a symbol",
            });
        };
        if entry.protected {
            return Err(HostError::rejected(format!(
                "{} cannot be renamed",
                entry.object.name().unwrap_or(&entry.object.tag)
            )));
        }
        if self.find_symbol(kind, name).is_some_and(|other| other != handle) {
            return Err(HostError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
        self.entry_mut(handle)?
            .object
            .fields
            .insert("name".to_string(), Value::String(name.to_string()));
        Ok(())
    }

    fn open_for_write(&mut self, handle: Handle) -> HostResult<NativeObject> {
        self.require_transaction()?;
        let object = self.entry(handle)?.object.clone();
        if !self.open.insert(handle) {
            return Err(HostError::AlreadyOpen(handle));
        }
        self.counters.opened_for_write += 1;
        Ok(object)
    }

    fn close(&mut self, handle: Handle, native: Option<NativeObject>) -> HostResult<()> {
        if !self.open.remove(&handle) {
            return Err(HostError::NotOpen(handle));
        }
        if let Some(native) = native {
            self.entry_mut(handle)?.object = native;
        }
        Ok(())
    }

    fn append_entity(&mut self, container: Handle, native: NativeObject) -> HostResult<Handle> {
        self.require_transaction()?;
        if self.entry(container)?.object.kind != ObjectKind::Symbol(TableKind::Block) {
            return Err(HostError::WrongKind {
                handle: container,
                expected: "a block",
            });
        }
        if native.kind != ObjectKind::Entity {
            return Err(HostError::rejected(format!("{} is not an entity", native.tag)));
        }
        self.counters.appended += 1;
        Ok(self.insert_entry(native, Some(container), false))
    }

    fn erase(&mut self, handle: Handle) -> HostResult<()> {
        self.require_transaction()?;
        let entry = self.entry(handle)?;
        if entry.protected {
            return Err(HostError::rejected(format!(
                "{} cannot be erased",
                entry.object.name().unwrap_or(&entry.object.tag)
            )));
        }
        self.remove(handle);
        self.counters.erased += 1;
        Ok(())
    }

    fn symbols(&self, kind: TableKind) -> Vec<Handle> {
        self.state.tables.get(&kind).cloned().unwrap_or_default()
    }

    fn entities(&self, container: Handle) -> HostResult<Vec<Handle>> {
        let entry = self.entry(container)?;
        if entry.object.kind != ObjectKind::Symbol(TableKind::Block) {
            return Err(HostError::WrongKind {
                handle: container,
                expected: "a block",
            });
        }
        Ok(entry.children.clone())
    }

    fn native(&self, handle: Handle) -> HostResult<&NativeObject> {
        Ok(&self.entry(handle)?.object)
    }

    fn transform_by(&mut self, handle: Handle, transform: &Matrix3d) -> HostResult<()> {
        self.require_transaction()?;
        let mut entity = self.capture_entity(handle, &self.entry(handle)?.object)?;
        entity.transform_by(transform);
        let mut fields = into_object(RawEnvelope::from_value(encode_value(&entity)?)?.into_payload())?;
        fields.remove("id");
        self.entity_entry_mut(handle)?.object.fields = fields;
        Ok(())
    }

    fn bounds(&self, handle: Handle) -> HostResult<Option<Extents3d>> {
        let native = &self.entry(handle)?.object;
        let entity = self.capture_entity(handle, native)?;
        if !entity.is_dimension() {
            return Ok(entity.extents());
        }
        if !native.layout_generated {
            return Ok(None);
        }
        let points = entity.definition_points();
        Ok((!points.is_empty()).then(|| Extents3d::from_points(points)))
    }

    fn regenerate_layout(&mut self, handle: Handle) -> HostResult<()> {
        self.require_transaction()?;
        self.entity_entry_mut(handle)?.object.layout_generated = true;
        Ok(())
    }

    fn redirect_references(&mut self, old: Handle, new: Handle) -> HostResult<usize> {
        self.require_transaction()?;
        let mut changed = 0;
        for entry in self.state.entries.values_mut() {
            if entry.object.block == Some(old) {
                entry.object.block = Some(new);
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn add_to_group(&mut self, group: Handle, entity: Handle) -> HostResult<bool> {
        self.require_transaction()?;
        if self.entry(entity)?.object.kind != ObjectKind::Entity {
            return Err(HostError::WrongKind {
                handle: entity,
                expected: "an entity",
            });
        }
        let entry = self.entry_mut(group)?;
        if entry.object.kind != ObjectKind::Symbol(TableKind::Group) {
            return Err(HostError::WrongKind {
                handle: group,
                expected: "a group",
            });
        }
        if entry.children.contains(&entity) {
            return Ok(false);
        }
        entry.children.push(entity);
        Ok(true)
    }

    fn document_extents(&self) -> Extents3d {
        let mut extents = Extents3d::new();
        let Ok(model_space) = self.model_space() else {
            return extents;
        };
        for handle in self.entities(model_space).unwrap_or_default() {
            if let Ok(Some(bounds)) = self.bounds(handle) {
                extents.add_extents(&bounds);
            }
        }
        extents
    }

    fn model_space(&self) -> HostResult<Handle> {
        self.find_symbol(TableKind::Block, MODEL_SPACE)
            .ok_or_else(|| HostError::invalid_reference(TableKind::Block, MODEL_SPACE))
    }
}

impl NativeMapping<Entity> for MemoryDocument {
    fn materialize(&self, record: &Entity, existing: Option<NativeObject>) -> HostResult<NativeObject> {
        self.materialize_entity(record, existing)
    }

    fn capture(&self, handle: Handle, native: &NativeObject) -> HostResult<Entity> {
        self.capture_entity(handle, native)
    }
}

macro_rules! symbol_mappings {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl NativeMapping<$ty> for MemoryDocument {
                fn materialize(
                    &self,
                    record: &$ty,
                    existing: Option<NativeObject>,
                ) -> HostResult<NativeObject> {
                    self.materialize_symbol(record, existing)
                }

                fn capture(&self, handle: Handle, native: &NativeObject) -> HostResult<$ty> {
                    self.capture_symbol(handle, native)
                }
            }
        )+
    };
}

symbol_mappings!(
    BlockTableRecord,
    LayerTableRecord,
    LinetypeTableRecord,
    TextStyleTableRecord,
    DimStyleTableRecord,
    MLeaderStyle,
    Group,
);

#[cfg(test)]
mod tests {
    use super::*;
    use cadlink_codec::Field;
    use cadlink_protocol::{AlignedDimension, Line, Symbol, Vector3d};

    fn line(layer: &str) -> Entity {
        let mut line = Line::new(Vector3d::ZERO, Vector3d::new(2.0, 1.0, 0.0));
        line.entity.layer = Field::Value(layer.to_string());
        line.into()
    }

    #[test]
    fn fresh_document_has_defaults() {
        let doc = MemoryDocument::new();
        assert_eq!(doc.symbols(TableKind::Linetype).len(), 3);
        assert!(doc.find_symbol(TableKind::Layer, "0").is_some());
        assert!(doc.find_symbol(TableKind::TextStyle, "standard").is_some());
        assert!(doc.find_symbol(TableKind::Block, "*paper_space").is_some());
        assert!(doc.model_space().is_ok());
        assert!(!doc.in_transaction());
    }

    #[test]
    fn mutation_needs_transaction() {
        let mut doc = MemoryDocument::new();
        let layer = doc.materialize(&LayerTableRecord::named("walls"), None).unwrap();
        assert_eq!(
            doc.add_symbol(TableKind::Layer, layer),
            Err(HostError::NoTransaction)
        );
    }

    #[test]
    fn unknown_reference_fails_materialize() {
        let doc = MemoryDocument::new();
        let err = doc.materialize(&line("missing"), None).unwrap_err();
        assert_eq!(err, HostError::invalid_reference(TableKind::Layer, "missing"));
    }

    #[test]
    fn duplicate_names_ignore_case() {
        let mut doc = MemoryDocument::new();
        doc.begin_transaction().unwrap();
        let layer = doc.materialize(&LayerTableRecord::named("WALLS"), None).unwrap();
        doc.add_symbol(TableKind::Layer, layer).unwrap();
        let again = doc.materialize(&LayerTableRecord::named("walls"), None).unwrap();
        assert!(matches!(
            doc.add_symbol(TableKind::Layer, again),
            Err(HostError::DuplicateName { .. })
        ));
        doc.commit_transaction().unwrap();
    }

    #[test]
    fn abort_restores_state() {
        let mut doc = MemoryDocument::new();
        let before = doc.object_count();
        doc.begin_transaction().unwrap();
        let native = doc.materialize(&line("0"), None).unwrap();
        let ms = doc.model_space().unwrap();
        doc.append_entity(ms, native).unwrap();
        doc.abort_transaction();
        assert_eq!(doc.object_count(), before);
        assert_eq!(doc.counters().appended, 1);
    }

    #[test]
    fn open_close_bracket() {
        let mut doc = MemoryDocument::new();
        doc.begin_transaction().unwrap();
        let layer = doc.find_symbol(TableKind::Layer, "0").unwrap();
        let native = doc.open_for_write(layer).unwrap();
        assert_eq!(doc.open_for_write(layer), Err(HostError::AlreadyOpen(layer)));
        doc.close(layer, Some(native)).unwrap();
        assert_eq!(doc.close(layer, None), Err(HostError::NotOpen(layer)));
        assert_eq!(doc.counters().opened_for_write, 1);
        doc.commit_transaction().unwrap();
    }

    #[test]
    fn rename_keeps_names_unique() {
        let mut doc = MemoryDocument::new();
        doc.begin_transaction().unwrap();
        let walls = doc.materialize(&LayerTableRecord::named("walls"), None).unwrap();
        let walls = doc.add_symbol(TableKind::Layer, walls).unwrap();

        assert!(matches!(
            doc.rename_symbol(walls, "0"),
            Err(HostError::DuplicateName { .. })
        ));
        doc.rename_symbol(walls, "WALLS").unwrap();
        doc.rename_symbol(walls, "partitions").unwrap();
        assert_eq!(doc.find_symbol(TableKind::Layer, "partitions"), Some(walls));
        assert!(doc.find_symbol(TableKind::Layer, "walls").is_none());

        let zero = doc.find_symbol(TableKind::Layer, "0").unwrap();
        assert!(matches!(
            doc.rename_symbol(zero, "zero"),
            Err(HostError::Rejected { .. })
        ));
        doc.commit_transaction().unwrap();
    }

    #[test]
    fn defaults_cannot_be_erased() {
        let mut doc = MemoryDocument::new();
        doc.begin_transaction().unwrap();
        let layer = doc.find_symbol(TableKind::Layer, "0").unwrap();
        assert!(matches!(doc.erase(layer), Err(HostError::Rejected { .. })));
        doc.abort_transaction();
    }

    #[test]
    fn null_is_stored_and_absent_is_kept() {
        let mut doc = MemoryDocument::new();
        let mut layer = LayerTableRecord::named("walls");
        layer.is_frozen = Field::Value(true);
        layer.is_off = Field::Value(true);
        let native = doc.materialize(&layer, None).unwrap();

        let mut update = LayerTableRecord::named("walls");
        update.is_frozen = Field::Null;
        let merged = doc.materialize(&update, Some(native)).unwrap();
        assert_eq!(merged.get("is_frozen"), Some(&Value::Null));
        assert_eq!(merged.get("is_off"), Some(&Value::Bool(true)));

        doc.begin_transaction().unwrap();
        let handle = doc.add_symbol(TableKind::Layer, merged).unwrap();
        doc.commit_transaction().unwrap();
        let captured: LayerTableRecord = doc.capture(handle, doc.native(handle).unwrap()).unwrap();
        assert_eq!(captured.id(), Some(handle.0));
        assert!(captured.is_frozen.is_null());
    }

    #[test]
    fn dimension_bounds_need_layout() {
        let mut doc = MemoryDocument::new();
        let dim: Entity = AlignedDimension::new(
            Vector3d::ZERO,
            Vector3d::new(4.0, 0.0, 0.0),
            Vector3d::new(2.0, 1.0, 0.0),
        )
        .into();
        doc.begin_transaction().unwrap();
        let native = doc.materialize(&dim, None).unwrap();
        let ms = doc.model_space().unwrap();
        let handle = doc.append_entity(ms, native).unwrap();
        assert_eq!(doc.bounds(handle).unwrap(), None);
        doc.regenerate_layout(handle).unwrap();
        let bounds = doc.bounds(handle).unwrap().unwrap();
        assert_eq!(bounds.max_point(), Some(Vector3d::new(4.0, 1.0, 0.0)));
        doc.commit_transaction().unwrap();
    }

    #[test]
    fn erasing_entity_leaves_groups() {
        let mut doc = MemoryDocument::new();
        doc.begin_transaction().unwrap();
        let group = doc.materialize(&Group::with_members("g", Vec::new()), None).unwrap();
        let group = doc.add_symbol(TableKind::Group, group).unwrap();
        let ms = doc.model_space().unwrap();
        let native = doc.materialize(&line("0"), None).unwrap();
        let entity = doc.append_entity(ms, native).unwrap();
        assert!(doc.add_to_group(group, entity).unwrap());
        assert!(!doc.add_to_group(group, entity).unwrap());
        doc.erase(entity).unwrap();
        let captured: Group = doc.capture(group, doc.native(group).unwrap()).unwrap();
        assert_eq!(captured.entity_ids, Field::Value(Vec::new()));
        assert!(doc.entities(ms).unwrap().is_empty());
        doc.commit_transaction().unwrap();
    }
}
