//! Integration tests for reconciliation against the in-memory host.

use cadlink_codec::Field;
use cadlink_engine::{
    Handle, HostDocument, HostError, HostResult, MemoryDocument, NativeMapping, NativeObject,
    ReconcileOptions, Reconciler, TableKind,
};
use cadlink_protocol::{
    AlignedDimension, BlockReference, BlockTableRecord, Database, DbDeleteQuery, DbInsertQuery,
    DbInsertResult, DbSelectQuery, DimStyleTableRecord, Entity, Extents3d, ExtentsMode, Group,
    LayerTableRecord, Line, LinetypeTableRecord, MLeaderStyle, Matrix3d, Query, QueryResult,
    SelectMode, Status, Symbol, TableFlags, TextStyleTableRecord, Vector3d, MODEL_SPACE,
    UNHANDLED_PREFIX,
};
use cadlink_testkit::prelude::*;
use proptest::prelude::*;

fn insert(doc: &mut MemoryDocument, query: DbInsertQuery) -> DbInsertResult {
    Reconciler::default().insert(doc, &query)
}

fn counts(result: &DbInsertResult) -> (u64, u64, u64) {
    (
        result.num_inserted.value_or(0),
        result.num_updated.value_or(0),
        result.num_failure.value_or(0),
    )
}

fn model_space_entities(doc: &MemoryDocument) -> Vec<Entity> {
    let ms = doc.model_space().unwrap();
    doc.entities(ms)
        .unwrap()
        .into_iter()
        .map(|h| -> Entity { doc.capture(h, doc.native(h).unwrap()).unwrap() })
        .collect()
}

/// A document that refuses to add new blocks.
struct BlockAddRefused(MemoryDocument);

impl HostDocument for BlockAddRefused {
    type Native = NativeObject;

    fn begin_transaction(&mut self) -> HostResult<()> {
        self.0.begin_transaction()
    }
    fn commit_transaction(&mut self) -> HostResult<()> {
        self.0.commit_transaction()
    }
    fn abort_transaction(&mut self) {
        self.0.abort_transaction()
    }
    fn find_symbol(&self, kind: TableKind, name: &str) -> Option<Handle> {
        self.0.find_symbol(kind, name)
    }
    fn add_symbol(&mut self, kind: TableKind, native: NativeObject) -> HostResult<Handle> {
        if kind == TableKind::Block {
            return Err(HostError::rejected("block table is locked"));
        }
        self.0.add_symbol(kind, native)
    }
    fn rename_symbol(&mut self, handle: Handle, name: &str) -> HostResult<()> {
        self.0.rename_symbol(handle, name)
    }
    fn open_for_write(&mut self, handle: Handle) -> HostResult<NativeObject> {
        self.0.open_for_write(handle)
    }
    fn close(&mut self, handle: Handle, native: Option<NativeObject>) -> HostResult<()> {
        self.0.close(handle, native)
    }
    fn append_entity(&mut self, container: Handle, native: NativeObject) -> HostResult<Handle> {
        self.0.append_entity(container, native)
    }
    fn erase(&mut self, handle: Handle) -> HostResult<()> {
        self.0.erase(handle)
    }
    fn symbols(&self, kind: TableKind) -> Vec<Handle> {
        self.0.symbols(kind)
    }
    fn entities(&self, container: Handle) -> HostResult<Vec<Handle>> {
        self.0.entities(container)
    }
    fn native(&self, handle: Handle) -> HostResult<&NativeObject> {
        self.0.native(handle)
    }
    fn transform_by(&mut self, handle: Handle, transform: &Matrix3d) -> HostResult<()> {
        self.0.transform_by(handle, transform)
    }
    fn bounds(&self, handle: Handle) -> HostResult<Option<Extents3d>> {
        self.0.bounds(handle)
    }
    fn regenerate_layout(&mut self, handle: Handle) -> HostResult<()> {
        self.0.regenerate_layout(handle)
    }
    fn redirect_references(&mut self, old: Handle, new: Handle) -> HostResult<usize> {
        self.0.redirect_references(old, new)
    }
    fn add_to_group(&mut self, group: Handle, entity: Handle) -> HostResult<bool> {
        self.0.add_to_group(group, entity)
    }
    fn document_extents(&self) -> Extents3d {
        self.0.document_extents()
    }
    fn model_space(&self) -> HostResult<Handle> {
        self.0.model_space()
    }
}

macro_rules! delegate_mappings {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl NativeMapping<$ty> for BlockAddRefused {
                fn materialize(
                    &self,
                    record: &$ty,
                    existing: Option<NativeObject>,
                ) -> HostResult<NativeObject> {
                    self.0.materialize(record, existing)
                }

                fn capture(&self, handle: Handle, native: &NativeObject) -> HostResult<$ty> {
                    self.0.capture(handle, native)
                }
            }
        )+
    };
}

delegate_mappings!(
    Entity,
    BlockTableRecord,
    LayerTableRecord,
    LinetypeTableRecord,
    TextStyleTableRecord,
    DimStyleTableRecord,
    MLeaderStyle,
    Group,
);

fn block_reference(doc: &MemoryDocument) -> Handle {
    let ms = doc.model_space().unwrap();
    doc.entities(ms)
        .unwrap()
        .into_iter()
        .find(|&h| doc.native(h).unwrap().tag() == <BlockReference as cadlink_codec::Tagged>::TAG)
        .unwrap()
}

#[test]
fn sample_inserts_into_fresh_document() {
    let mut doc = MemoryDocument::new();
    let result = insert(&mut doc, insert_query(sample_database()));

    assert_eq!(result.result.status(), Status::Success);
    // text style, linetype, two layers, group, block and its line, five entities
    assert_eq!(counts(&result), (12, 0, 0));
    assert!(result.result.message.is_absent());
    assert!(result.extents.is_absent());
    assert!(!doc.in_transaction());

    assert!(doc.find_symbol(TableKind::Layer, "WALLS").is_some());
    assert_eq!(model_space_entities(&doc).len(), 5);

    let group = doc.find_symbol(TableKind::Group, "outline").unwrap();
    let group: cadlink_protocol::Group = doc.capture(group, doc.native(group).unwrap()).unwrap();
    assert_eq!(group.entity_ids.value().map(Vec::len), Some(2));
}

#[test]
fn failing_record_does_not_abort_batch() {
    let mut db = Database::new();
    db.insert_layer("a", layer_with_linetype("a", "Continuous"));
    db.insert_layer("b", layer_with_linetype("b", "missing"));
    db.insert_layer("c", layer_with_linetype("c", "ByLayer"));

    let mut doc = MemoryDocument::new();
    let result = insert(&mut doc, insert_query(db));

    assert_eq!(counts(&result), (2, 0, 1));
    assert_eq!(result.result.status(), Status::Warning);
    assert!(result.result.message.is_absent());
    assert!(doc.find_symbol(TableKind::Layer, "a").is_some());
    assert!(doc.find_symbol(TableKind::Layer, "b").is_none());
    assert!(doc.find_symbol(TableKind::Layer, "c").is_some());
}

#[test]
fn all_failures_yield_failure_without_extents() {
    let db = model_space_with([line_on("nowhere", Vector3d::ZERO, Vector3d::new(1.0, 1.0, 0.0))]);
    let mut doc = MemoryDocument::new();
    let result = insert(&mut doc, insert_query(db).with_extents_mode(ExtentsMode::All));

    assert_eq!(counts(&result), (0, 0, 1));
    assert_eq!(result.result.status(), Status::Failure);
    assert!(result.extents.is_absent());
    assert!(model_space_entities(&doc).is_empty());
}

#[test]
fn existing_records_are_skipped_unless_upsert() {
    let mut doc = MemoryDocument::new();
    let mut walls = LayerTableRecord::named("walls");
    walls.is_off = Field::Value(true);
    let mut db = Database::new();
    db.insert_layer("walls", walls);
    insert(&mut doc, insert_query(db));
    doc.reset_counters();

    let mut changed = LayerTableRecord::named("walls");
    changed.is_off = Field::Value(false);
    let mut db = Database::new();
    db.insert_layer("walls", changed);

    let skipped = insert(&mut doc, insert_query(db.clone()));
    assert_eq!(counts(&skipped), (0, 0, 0));
    assert_eq!(skipped.result.status(), Status::Success);
    assert_eq!(doc.counters().opened_for_write, 0);

    let explicit_false = insert(&mut doc, insert_query(db.clone()).with_upsert(false));
    assert_eq!(counts(&explicit_false), (0, 0, 0));
    assert_eq!(doc.counters().opened_for_write, 0);

    let handle = doc.find_symbol(TableKind::Layer, "walls").unwrap();
    assert_eq!(
        doc.native(handle).unwrap().get("is_off"),
        Some(&serde_json::Value::Bool(true))
    );

    let updated = insert(&mut doc, insert_query(db).with_upsert(true));
    assert_eq!(counts(&updated), (0, 1, 0));
    assert_eq!(doc.counters().opened_for_write, 1);
    assert_eq!(
        doc.native(handle).unwrap().get("is_off"),
        Some(&serde_json::Value::Bool(false))
    );
}

#[test]
fn failed_update_leaves_record_untouched() {
    let mut doc = MemoryDocument::new();
    let mut db = Database::new();
    db.insert_layer("walls", layer_with_linetype("walls", "Continuous"));
    insert(&mut doc, insert_query(db));

    let mut db = Database::new();
    db.insert_layer("walls", layer_with_linetype("walls", "missing"));
    let result = insert(&mut doc, insert_query(db).with_upsert(true));

    assert_eq!(counts(&result), (0, 0, 1));
    assert_eq!(result.result.status(), Status::Failure);
    let handle = doc.find_symbol(TableKind::Layer, "walls").unwrap();
    assert_eq!(
        doc.native(handle).unwrap().get("linetype"),
        Some(&serde_json::Value::String("Continuous".into()))
    );
    // the object was closed again
    doc.begin_transaction().unwrap();
    assert!(doc.open_for_write(handle).is_ok());
    doc.abort_transaction();
}

#[test]
fn model_space_key_matches_any_casing() {
    let mut block = BlockTableRecord::named("*MODEL_SPACE");
    block.push(Line::new(Vector3d::ZERO, Vector3d::new(1.0, 0.0, 0.0)));
    let mut db = Database::new();
    db.insert_block("*MODEL_SPACE", block);

    let mut doc = MemoryDocument::new();
    let blocks_before = doc.symbols(TableKind::Block).len();
    let result = insert(&mut doc, insert_query(db));

    assert_eq!(counts(&result), (1, 0, 0));
    assert_eq!(doc.symbols(TableKind::Block).len(), blocks_before);
    assert_eq!(model_space_entities(&doc).len(), 1);

    let mut block = BlockTableRecord::named("*model_SPACE");
    block.push(Line::new(Vector3d::ZERO, Vector3d::new(0.0, 1.0, 0.0)));
    let mut db = Database::new();
    db.insert_block("*model_SPACE", block);
    let result = insert(&mut doc, insert_query(db));

    assert_eq!(counts(&result), (1, 0, 0));
    assert_eq!(doc.symbols(TableKind::Block).len(), blocks_before);
    assert!(doc.find_symbol(TableKind::Block, "*model_SPACE").is_some());
    assert_eq!(model_space_entities(&doc).len(), 2);
}

#[test]
fn named_block_is_recreated_on_upsert() {
    let mut doc = MemoryDocument::new();
    insert(&mut doc, insert_query(sample_database()));
    let old = doc.find_symbol(TableKind::Block, "door").unwrap();

    let mut door = BlockTableRecord::named("door");
    door.push(Line::new(Vector3d::ZERO, Vector3d::new(0.9, 0.0, 0.0)));
    door.push(Line::new(Vector3d::new(0.9, 0.0, 0.0), Vector3d::new(0.9, 0.1, 0.0)));
    let mut db = Database::new();
    db.insert_block("door", door);
    let blocks_before = doc.symbols(TableKind::Block).len();
    let result = insert(&mut doc, insert_query(db).with_upsert(true));

    // the header counts as updated, its two lines as inserted
    assert_eq!(counts(&result), (2, 1, 0));
    let new = doc.find_symbol(TableKind::Block, "door").unwrap();
    assert_ne!(old, new);
    assert!(doc.native(old).is_err());
    assert_eq!(doc.entities(new).unwrap().len(), 2);
    assert_eq!(doc.symbols(TableKind::Block).len(), blocks_before);

    let reference = block_reference(&doc);
    assert_eq!(doc.native(reference).unwrap().referenced_block(), Some(new));
}

#[test]
fn failed_block_recreation_keeps_old_block() {
    let mut doc = MemoryDocument::new();
    insert(&mut doc, insert_query(sample_database()));
    let old = doc.find_symbol(TableKind::Block, "door").unwrap();
    let blocks_before = doc.symbols(TableKind::Block).len();

    let mut door = BlockTableRecord::named("door");
    door.push(Line::new(Vector3d::ZERO, Vector3d::new(2.0, 0.0, 0.0)));
    let mut db = Database::new();
    db.insert_block("door", door);

    let mut host = BlockAddRefused(doc);
    let result = Reconciler::default().insert(&mut host, &insert_query(db).with_upsert(true));
    let doc = host.0;

    assert_eq!(counts(&result), (0, 0, 1));
    assert_eq!(result.result.status(), Status::Failure);
    assert_eq!(doc.find_symbol(TableKind::Block, "door"), Some(old));
    assert_eq!(doc.symbols(TableKind::Block).len(), blocks_before);
    assert_eq!(doc.entities(old).unwrap().len(), 1);
    let captured: BlockTableRecord = doc.capture(old, doc.native(old).unwrap()).unwrap();
    assert_eq!(captured.name(), Some("door"));

    let reference = block_reference(&doc);
    assert_eq!(doc.native(reference).unwrap().referenced_block(), Some(old));
}

#[test]
fn block_entity_failures_count_against_the_block() {
    let mut door = BlockTableRecord::named("door");
    door.push(line_on("nowhere", Vector3d::ZERO, Vector3d::new(1.0, 0.0, 0.0)));
    door.push(line_on("0", Vector3d::ZERO, Vector3d::new(0.0, 1.0, 0.0)));
    let mut db = Database::new();
    db.insert_block("door", door);

    let mut doc = MemoryDocument::new();
    let result = insert(&mut doc, insert_query(db));

    // header and one line inserted, the other line failed
    assert_eq!(counts(&result), (2, 0, 1));
    assert_eq!(result.result.status(), Status::Warning);
    let door = doc.find_symbol(TableKind::Block, "door").unwrap();
    assert_eq!(doc.entities(door).unwrap().len(), 1);
}

#[test]
fn existing_block_is_kept_without_upsert() {
    let mut doc = MemoryDocument::new();
    insert(&mut doc, insert_query(sample_database()));
    let door = doc.find_symbol(TableKind::Block, "door").unwrap();

    let mut replacement = BlockTableRecord::named("door");
    replacement.push(Line::new(Vector3d::ZERO, Vector3d::new(5.0, 0.0, 0.0)));
    let mut db = Database::new();
    db.insert_block("door", replacement);
    let result = insert(&mut doc, insert_query(db));

    assert_eq!(counts(&result), (0, 0, 0));
    assert_eq!(doc.find_symbol(TableKind::Block, "door"), Some(door));
    assert_eq!(doc.entities(door).unwrap().len(), 1);
}

#[test]
fn added_extents_cover_regenerated_dimensions() {
    let dimension = AlignedDimension::new(
        Vector3d::ZERO,
        Vector3d::new(10.0, 0.0, 0.0),
        Vector3d::new(5.0, -2.0, 0.0),
    );
    let entities = || {
        [
            line_on("0", Vector3d::ZERO, Vector3d::new(10.0, 0.0, 0.0)),
            Entity::from(dimension.clone()),
        ]
    };

    let mut doc = MemoryDocument::new();
    let query = insert_query(model_space_with(entities())).with_extents_mode(ExtentsMode::Added);
    let result = insert(&mut doc, query);
    let extents = result.extents.value().unwrap();
    assert_eq!(extents.min_point(), Some(Vector3d::new(0.0, -2.0, 0.0)));
    assert_eq!(extents.max_point(), Some(Vector3d::new(10.0, 0.0, 0.0)));

    let mut doc = MemoryDocument::new();
    let reconciler = Reconciler::new(ReconcileOptions::new().with_regenerate_dimensions(false));
    let query = insert_query(model_space_with(entities())).with_extents_mode(ExtentsMode::Added);
    let result = reconciler.insert(&mut doc, &query);
    let extents = result.extents.value().unwrap();
    assert_eq!(extents.min_point(), Some(Vector3d::ZERO));
}

#[test]
fn all_extents_cover_whole_model_space() {
    let mut doc = MemoryDocument::new();
    insert(
        &mut doc,
        insert_query(model_space_with([line_on(
            "0",
            Vector3d::new(-5.0, -5.0, 0.0),
            Vector3d::ZERO,
        )])),
    );
    let query = insert_query(model_space_with([line_on(
        "0",
        Vector3d::ZERO,
        Vector3d::new(1.0, 1.0, 0.0),
    )]))
    .with_extents_mode(ExtentsMode::All);
    let result = insert(&mut doc, query);

    let extents = result.extents.value().unwrap();
    assert_eq!(extents.min_point(), Some(Vector3d::new(-5.0, -5.0, 0.0)));
    assert_eq!(extents.max_point(), Some(Vector3d::new(1.0, 1.0, 0.0)));
}

#[test]
fn insertion_point_displaces_model_space() {
    let mut doc = MemoryDocument::new();
    let query = insert_query(model_space_with([line_on(
        "0",
        Vector3d::ZERO,
        Vector3d::new(1.0, 0.0, 0.0),
    )]))
    .with_insertion_point(Vector3d::new(100.0, 0.0, 0.0))
    .with_extents_mode(ExtentsMode::Added);
    let result = insert(&mut doc, query);

    let Entity::Line(line) = &model_space_entities(&doc)[0] else {
        panic!("expected a line");
    };
    assert_eq!(line.start_point, Field::Value(Vector3d::new(100.0, 0.0, 0.0)));
    assert_eq!(
        result.extents.value().unwrap().max_point(),
        Some(Vector3d::new(101.0, 0.0, 0.0))
    );
}

#[test]
fn group_linking_can_be_disabled() {
    let mut doc = MemoryDocument::new();
    let reconciler = Reconciler::new(ReconcileOptions::new().with_link_groups(false));
    let result = reconciler.insert(&mut doc, &insert_query(sample_database()));
    assert_eq!(result.result.status(), Status::Success);

    let group = doc.find_symbol(TableKind::Group, "outline").unwrap();
    let group: cadlink_protocol::Group = doc.capture(group, doc.native(group).unwrap()).unwrap();
    assert_eq!(group.entity_ids, Field::Value(Vec::new()));
}

#[test]
fn select_captures_flagged_tables() {
    let mut doc = MemoryDocument::new();
    insert(&mut doc, insert_query(sample_database()));

    let query = DbSelectQuery::tables(TableFlags::LAYER | TableFlags::MODEL_SPACE);
    let result = Reconciler::default().select(&mut doc, &query);

    assert_eq!(result.result.status(), Status::Success);
    let db = &result.db.value().unwrap().0;
    let layers: Vec<&str> = db.layers().map(|(name, _)| name).collect();
    assert_eq!(layers, ["0", "doors", "walls"]);
    assert!(db.layers().all(|(_, layer)| layer.id().is_some()));
    assert!(db.linetype_table.is_absent());
    assert!(db.group_dict.is_absent());

    let model_space = db.model_space().unwrap();
    assert_eq!(model_space.entity_list().len(), 5);
    assert!(model_space.entity_list().iter().all(|e| e.id().is_some()));
    assert!(db.blocks().all(|(name, _)| name == MODEL_SPACE));
}

#[test]
fn select_without_flags_captures_everything() {
    let mut doc = MemoryDocument::new();
    let result = Reconciler::default().select(&mut doc, &DbSelectQuery::default());
    let db = &result.db.value().unwrap().0;
    assert_eq!(db.linetypes().count(), 3);
    assert_eq!(db.dim_styles().count(), 1);
    assert!(db.group_dict.is_present());
}

#[test]
fn interactive_select_is_rejected() {
    let mut doc = MemoryDocument::new();
    let query = DbSelectQuery {
        mode: Field::Value(SelectMode::GetUserSelection),
        ..DbSelectQuery::default()
    };
    let result = Reconciler::default().select(&mut doc, &query);

    assert_eq!(result.result.status(), Status::Failure);
    assert!(result.db.is_absent());
    let message = result.result.message.value().unwrap();
    assert!(message.starts_with(UNHANDLED_PREFIX));
    assert!(message.contains("not supported"));
}

#[test]
fn delete_erases_named_and_skips_missing() {
    let mut doc = MemoryDocument::new();
    insert(&mut doc, insert_query(sample_database()));

    let line_handle = doc.entities(doc.model_space().unwrap()).unwrap()[0];
    let mut target = Line::default();
    target.entity.id = Field::Value(line_handle.0);
    let mut db = model_space_with([Entity::from(target)]);
    db.insert_layer("doors", LayerTableRecord::named("doors"));
    db.insert_layer("ghost", LayerTableRecord::named("ghost"));
    db.insert_block("door", BlockTableRecord::named("door"));

    let result = Reconciler::default().delete(&mut doc, &DbDeleteQuery::new(db));

    assert_eq!(result.result.status(), Status::Success);
    assert_eq!(result.num_deleted, Field::Value(3));
    assert_eq!(result.num_failure, Field::Value(0));
    assert!(doc.native(line_handle).is_err());
    assert!(doc.find_symbol(TableKind::Layer, "doors").is_none());
    assert!(doc.find_symbol(TableKind::Block, "door").is_none());
    assert_eq!(model_space_entities(&doc).len(), 4);
}

#[test]
fn delete_by_id_only_erases_model_space_entities() {
    let mut doc = MemoryDocument::new();
    insert(&mut doc, insert_query(sample_database()));
    let walls = doc.find_symbol(TableKind::Layer, "walls").unwrap();
    let door = doc.find_symbol(TableKind::Block, "door").unwrap();
    let door_line = doc.entities(door).unwrap()[0];

    let mut aimed_at_layer = Line::default();
    aimed_at_layer.entity.id = Field::Value(walls.0);
    let mut aimed_at_block_entity = Line::default();
    aimed_at_block_entity.entity.id = Field::Value(door_line.0);
    let db = model_space_with([
        Entity::from(aimed_at_layer),
        Entity::from(aimed_at_block_entity),
    ]);
    let result = Reconciler::default().delete(&mut doc, &DbDeleteQuery::new(db));

    assert_eq!(result.num_deleted, Field::Value(0));
    assert_eq!(result.num_failure, Field::Value(0));
    assert_eq!(result.result.status(), Status::Success);
    assert_eq!(doc.find_symbol(TableKind::Layer, "walls"), Some(walls));
    assert!(doc.native(door_line).is_ok());
    assert_eq!(model_space_entities(&doc).len(), 5);
}

#[test]
fn delete_counts_protected_symbols_as_failures() {
    let mut db = Database::new();
    db.insert_layer("0", LayerTableRecord::named("0"));
    let mut doc = MemoryDocument::new();
    let result = Reconciler::default().delete(&mut doc, &DbDeleteQuery::new(db));

    assert_eq!(result.result.status(), Status::Failure);
    assert_eq!(result.num_failure, Field::Value(1));
    assert!(doc.find_symbol(TableKind::Layer, "0").is_some());
}

#[test]
fn escaping_error_becomes_message() {
    let mut doc = MemoryDocument::new();
    doc.begin_transaction().unwrap();
    let result = insert(&mut doc, insert_query(sample_database()));

    assert_eq!(result.result.status(), Status::Failure);
    assert_eq!(
        result.result.message,
        Field::Value(format!("{UNHANDLED_PREFIX}a transaction is already active"))
    );
    assert_eq!(counts(&result), (0, 0, 0));
}

#[test]
fn execute_dispatches_on_query_kind() {
    let mut doc = MemoryDocument::new();
    let reconciler = Reconciler::default();

    let result = reconciler.execute(&mut doc, &Query::from(insert_query(sample_database())));
    assert!(matches!(result, QueryResult::DbInsertResult(_)));
    assert_eq!(result.status(), Status::Success);

    let result = reconciler.execute(&mut doc, &Query::from(DbSelectQuery::tables(TableFlags::ALL)));
    assert!(matches!(result, QueryResult::DbSelectResult(_)));

    let result = reconciler.execute(&mut doc, &Query::from(DbDeleteQuery::new(Database::new())));
    assert!(matches!(result, QueryResult::DbDeleteResult(_)));
    assert_eq!(result.status(), Status::Success);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn generated_snapshots_insert_cleanly(db in database_strategy()) {
        let layers = db.layers().count() as u64;
        let entities = db.model_space().map_or(0, |b| b.entity_list().len()) as u64;

        let mut doc = MemoryDocument::new();
        let result = insert(&mut doc, insert_query(db.clone()));
        prop_assert_eq!(result.result.status(), Status::Success);
        prop_assert_eq!(counts(&result), (layers + entities, 0, 0));

        let again = insert(&mut doc, insert_query(db).with_upsert(true));
        prop_assert_eq!(counts(&again), (entities, layers, 0));
        prop_assert_eq!(doc.symbols(TableKind::Layer).len() as u64, layers + 1);
    }
}
