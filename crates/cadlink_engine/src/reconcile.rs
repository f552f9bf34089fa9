//! Applying snapshots to a host document.
//!
//! ## Insert
//!
//! Named records are reconciled by name, one table at a time, in
//! dependency order: text styles, linetypes, layers, dimension styles,
//! multileader styles, groups, then blocks. For each record:
//!
//! ```text
//! lookup ─┬─ missing ────────────► materialize, add       (inserted)
//!         ├─ exists, no upsert ──► nothing                (skipped)
//!         └─ exists, upsert ─────► open, apply, close     (updated)
//! ```
//!
//! Blocks are the exception on update: a new block is built beside the
//! live one, references are pointed at it, and only then is the old block
//! erased. If building the new block fails, the old one is left as it was.
//!
//! Model space entities are then appended in snapshot order, displaced by
//! the insertion point if one was given. Finally inserted entities are
//! added to the groups that listed their prior ids.
//!
//! Every appended entity counts as inserted, whether it went into model
//! space or into a named block.
//!
//! A failure while handling one record is logged and counted, and the
//! batch continues. Only failures outside any single record abort the
//! query.

use crate::config::ReconcileOptions;
use crate::error::{EngineError, EngineResult, HostResult};
use crate::host::{with_transaction, CadDocument, Handle, NativeMapping, SymbolRecord, TableKind};
use cadlink_codec::{Envelope, Field, Tagged};
use cadlink_protocol::{
    is_model_space, BlockTableRecord, Database, DbDeleteQuery, DbDeleteResult, DbInsertQuery,
    DbInsertResult, DbSelectQuery, DbSelectResult, Entity, Extents3d, ExtentsMode, Group,
    Matrix3d, Query, QueryResult, SelectMode, Status, Symbol, Table, TableFlags, MODEL_SPACE,
};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// What happened to one named record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Created.
    Inserted,
    /// Existing record changed.
    Updated,
    /// Existing record left alone.
    Skipped,
}

/// Running totals of an insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertCounts {
    /// Records created.
    pub inserted: u64,
    /// Records updated.
    pub updated: u64,
    /// Records that failed.
    pub failed: u64,
}

impl InsertCounts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Inserted => self.inserted += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Skipped => {}
        }
    }

    /// Aggregated status of the batch.
    pub fn status(&self) -> Status {
        Status::classify(self.inserted + self.updated, self.failed)
    }
}

/// Running totals of a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteCounts {
    /// Records erased.
    pub deleted: u64,
    /// Records that failed.
    pub failed: u64,
}

impl DeleteCounts {
    /// Aggregated status of the batch.
    pub fn status(&self) -> Status {
        Status::classify(self.deleted, self.failed)
    }
}

/// Where appended entities go and what is tracked for them.
struct Placement<'a> {
    container: Handle,
    transform: Option<&'a Matrix3d>,
    extents: Option<&'a mut Extents3d>,
}

/// Executes queries against a host document.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    /// Creates a reconciler.
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    /// The options in effect.
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Executes any query.
    ///
    /// Never fails: an error that escapes the query is reported in the
    /// result's `message`.
    pub fn execute<H: CadDocument>(&self, host: &mut H, query: &Query) -> QueryResult {
        match query {
            Query::DbInsertQuery(q) => self.insert(host, q).into(),
            Query::DbSelectQuery(q) => self.select(host, q).into(),
            Query::DbDeleteQuery(q) => self.delete(host, q).into(),
        }
    }

    /// Writes a snapshot into the document.
    pub fn insert<H: CadDocument>(&self, host: &mut H, query: &DbInsertQuery) -> DbInsertResult {
        let mode = query.extents_mode.value_or(ExtentsMode::None);
        let mut counts = InsertCounts::default();
        let mut added = Extents3d::new();

        let outcome = with_transaction(host, |host| {
            self.apply_insert(host, query, mode, &mut counts, &mut added)
        });

        let mut result = DbInsertResult {
            num_inserted: Field::Value(counts.inserted),
            num_updated: Field::Value(counts.updated),
            num_failure: Field::Value(counts.failed),
            ..DbInsertResult::default()
        };
        match outcome {
            Ok(()) => {
                let status = counts.status();
                result.result.status = Field::Value(status);
                if status != Status::Failure {
                    result.extents = match mode {
                        ExtentsMode::None => Field::Absent,
                        ExtentsMode::Added => Field::Value(added),
                        ExtentsMode::All => Field::Value(host.document_extents()),
                    };
                }
                info!(
                    inserted = counts.inserted,
                    updated = counts.updated,
                    failed = counts.failed,
                    %status,
                    "insert complete"
                );
            }
            Err(e) => {
                error!(tag = DbInsertQuery::TAG, error = %e, "insert failed");
                result.result.set_unhandled(&e);
            }
        }
        result
    }

    /// Reads the requested tables.
    pub fn select<H: CadDocument>(&self, host: &mut H, query: &DbSelectQuery) -> DbSelectResult {
        let mut result = DbSelectResult::default();
        match with_transaction(host, |host| capture_tables(&*host, query)) {
            Ok(db) => {
                debug!(records = db.record_count(), "select complete");
                result.db = Field::Value(Envelope(db));
                result.result.status = Field::Value(Status::Success);
            }
            Err(e) => {
                error!(tag = DbSelectQuery::TAG, error = %e, "select failed");
                result.result.set_unhandled(&e);
            }
        }
        result
    }

    /// Erases the records named by a snapshot.
    pub fn delete<H: CadDocument>(&self, host: &mut H, query: &DbDeleteQuery) -> DbDeleteResult {
        let mut counts = DeleteCounts::default();
        let outcome = with_transaction(host, |host| apply_delete(host, query, &mut counts));

        let mut result = DbDeleteResult {
            num_deleted: Field::Value(counts.deleted),
            num_failure: Field::Value(counts.failed),
            ..DbDeleteResult::default()
        };
        match outcome {
            Ok(()) => {
                let status = counts.status();
                result.result.status = Field::Value(status);
                info!(deleted = counts.deleted, failed = counts.failed, %status, "delete complete");
            }
            Err(e) => {
                error!(tag = DbDeleteQuery::TAG, error = %e, "delete failed");
                result.result.set_unhandled(&e);
            }
        }
        result
    }

    fn apply_insert<H: CadDocument>(
        &self,
        host: &mut H,
        query: &DbInsertQuery,
        mode: ExtentsMode,
        counts: &mut InsertCounts,
        added: &mut Extents3d,
    ) -> EngineResult<()> {
        let Some(db) = query.database.value() else {
            debug!("insert without database");
            return Ok(());
        };
        let upsert = query.is_upsert();

        for (key, record) in db.text_styles() {
            insert_symbol(host, key, record, upsert, counts);
        }
        for (key, record) in db.linetypes() {
            insert_symbol(host, key, record, upsert, counts);
        }
        for (key, record) in db.layers() {
            insert_symbol(host, key, record, upsert, counts);
        }
        for (key, record) in db.dim_styles() {
            insert_symbol(host, key, record, upsert, counts);
        }
        for (key, record) in db.mleader_styles() {
            insert_symbol(host, key, record, upsert, counts);
        }
        for (key, record) in db.groups() {
            insert_symbol(host, key, &record.header(), upsert, counts);
        }

        for (key, block) in db.blocks().filter(|(key, _)| !is_model_space(key)) {
            let name = block.symbol.name.value().map_or(key, String::as_str);
            match upsert_block(host, name, block, upsert) {
                Ok((outcome, handle)) => {
                    counts.record(outcome);
                    if let Some(container) = handle {
                        let placement = Placement {
                            container,
                            transform: None,
                            extents: None,
                        };
                        let appended =
                            self.append_entities(host, block.entity_list(), placement, counts);
                        self.link_groups(host, db, &appended, counts);
                    }
                }
                Err(e) => {
                    warn!(tag = BlockTableRecord::TAG, name, error = %e, "insertion failed");
                    counts.failed += 1;
                }
            }
        }

        let displacement = query
            .insertion_point
            .value()
            .map(|point| Matrix3d::displacement(*point));
        let model_space = host.model_space()?;
        for (_, block) in db.blocks().filter(|(key, _)| is_model_space(key)) {
            let placement = Placement {
                container: model_space,
                transform: displacement.as_ref(),
                extents: (mode == ExtentsMode::Added).then_some(&mut *added),
            };
            let appended = self.append_entities(host, block.entity_list(), placement, counts);
            self.link_groups(host, db, &appended, counts);
        }
        Ok(())
    }

    /// Appends entities one by one. Returns `(prior id, new handle)` for
    /// every appended entity that carried an id.
    fn append_entities<H: CadDocument>(
        &self,
        host: &mut H,
        entities: &[Entity],
        mut placement: Placement<'_>,
        counts: &mut InsertCounts,
    ) -> Vec<(Option<i64>, Handle)> {
        let mut appended = Vec::with_capacity(entities.len());
        for entity in entities {
            match self.append_entity(host, entity, &mut placement) {
                Ok(handle) => {
                    counts.inserted += 1;
                    appended.push((entity.id(), handle));
                }
                Err(e) => {
                    warn!(tag = entity.tag(), container = %placement.container, error = %e, "insertion failed");
                    counts.failed += 1;
                }
            }
        }
        appended
    }

    fn append_entity<H: CadDocument>(
        &self,
        host: &mut H,
        entity: &Entity,
        placement: &mut Placement<'_>,
    ) -> HostResult<Handle> {
        let native = <H as NativeMapping<Entity>>::materialize(host, entity, None)?;
        let handle = host.append_entity(placement.container, native)?;
        if let Some(transform) = placement.transform {
            host.transform_by(handle, transform)?;
        }
        if let Some(extents) = placement.extents.as_deref_mut() {
            if entity.is_dimension() && self.options.regenerate_dimensions {
                host.regenerate_layout(handle)?;
            }
            if let Some(bounds) = host.bounds(handle)? {
                extents.add_extents(&bounds);
            }
        }
        Ok(handle)
    }

    fn link_groups<H: CadDocument>(
        &self,
        host: &mut H,
        db: &Database,
        appended: &[(Option<i64>, Handle)],
        counts: &mut InsertCounts,
    ) {
        if !self.options.link_groups {
            return;
        }
        for (key, group) in db.groups() {
            let members: Vec<Handle> = appended
                .iter()
                .filter(|(prior, _)| prior.is_some_and(|id| group.contains(id)))
                .map(|&(_, handle)| handle)
                .collect();
            if members.is_empty() {
                continue;
            }
            let name = group.symbol.name.value().map_or(key, String::as_str);
            match link_group(host, name, group, &members) {
                Ok(added) => debug!(name, added, "group linked"),
                Err(e) => {
                    warn!(tag = Group::TAG, name, error = %e, "group linking failed");
                    counts.failed += 1;
                }
            }
        }
    }
}

/// Returns `record` with its name set to `key` if it had none.
fn ensure_named<R: SymbolRecord>(record: &R, key: &str) -> R {
    let mut named = record.clone();
    if named.symbol().name.is_absent() || named.symbol().name.is_null() {
        named.symbol_mut().name = Field::Value(key.to_string());
    }
    named
}

fn insert_symbol<H, R>(host: &mut H, key: &str, record: &R, upsert: bool, counts: &mut InsertCounts)
where
    H: NativeMapping<R>,
    R: SymbolRecord,
{
    let record = ensure_named(record, key);
    let name = record.name().unwrap_or(key);
    match upsert_symbol(host, name, &record, upsert) {
        Ok(outcome) => {
            debug!(tag = R::TAG, name, ?outcome, "symbol reconciled");
            counts.record(outcome);
        }
        Err(e) => {
            warn!(tag = R::TAG, name, error = %e, "insertion failed");
            counts.failed += 1;
        }
    }
}

fn upsert_symbol<H, R>(host: &mut H, name: &str, record: &R, upsert: bool) -> HostResult<Outcome>
where
    H: NativeMapping<R>,
    R: SymbolRecord,
{
    match host.find_symbol(R::KIND, name) {
        None => {
            let native = host.materialize(record, None)?;
            host.add_symbol(R::KIND, native)?;
            Ok(Outcome::Inserted)
        }
        Some(_) if !upsert => Ok(Outcome::Skipped),
        Some(handle) => {
            let existing = host.open_for_write(handle)?;
            match host.materialize(record, Some(existing)) {
                Ok(native) => {
                    host.close(handle, Some(native))?;
                    Ok(Outcome::Updated)
                }
                Err(e) => {
                    if let Err(close) = host.close(handle, None) {
                        warn!(tag = R::TAG, name, error = %close, "close after failed update failed");
                    }
                    Err(e)
                }
            }
        }
    }
}

/// Reconciles a block header. Returns the container to fill, if any.
///
/// A live block is never edited in place: on upsert it is recreated under
/// the same name.
fn upsert_block<H: CadDocument>(
    host: &mut H,
    name: &str,
    block: &BlockTableRecord,
    upsert: bool,
) -> HostResult<(Outcome, Option<Handle>)> {
    let header = ensure_named(&block.header(), name);
    match host.find_symbol(TableKind::Block, name) {
        None => {
            let native = <H as NativeMapping<BlockTableRecord>>::materialize(host, &header, None)?;
            let handle = host.add_symbol(TableKind::Block, native)?;
            Ok((Outcome::Inserted, Some(handle)))
        }
        Some(_) if !upsert => Ok((Outcome::Skipped, None)),
        Some(old) => {
            let native = <H as NativeMapping<BlockTableRecord>>::materialize(host, &header, None)?;
            let new = recreate_block(host, old, name, native)?;
            Ok((Outcome::Updated, Some(new)))
        }
    }
}

/// Swaps block `old` for a new block built from `native`.
///
/// The old block steps aside under a retired name while the new one is
/// added, so both are live until references have moved. On failure the
/// document is put back the way it was.
fn recreate_block<H: CadDocument>(
    host: &mut H,
    old: Handle,
    name: &str,
    native: H::Native,
) -> HostResult<Handle> {
    let live = <H as NativeMapping<BlockTableRecord>>::capture(host, old, host.native(old)?)?;
    let original = live.name().unwrap_or(name).to_string();
    host.rename_symbol(old, &retired_name(name, old))?;
    let new = match host.add_symbol(TableKind::Block, native) {
        Ok(new) => new,
        Err(e) => {
            restore_block(host, old, None, &original);
            return Err(e);
        }
    };
    let swapped = host
        .redirect_references(old, new)
        .and_then(|redirected| host.erase(old).map(|()| redirected));
    match swapped {
        Ok(redirected) => {
            debug!(name, %old, %new, redirected, "block recreated");
            Ok(new)
        }
        Err(e) => {
            restore_block(host, old, Some(new), &original);
            Err(e)
        }
    }
}

fn retired_name(name: &str, old: Handle) -> String {
    format!("{name}$retired${old}")
}

/// Undoes a partial [`recreate_block`].
fn restore_block<H: CadDocument>(host: &mut H, old: Handle, new: Option<Handle>, name: &str) {
    if let Some(new) = new {
        let undone = host
            .redirect_references(new, old)
            .and_then(|_| host.erase(new));
        if let Err(e) = undone {
            warn!(name, %old, %new, error = %e, "could not remove replacement block");
        }
    }
    if let Err(e) = host.rename_symbol(old, name) {
        warn!(name, %old, error = %e, "could not restore block name");
    }
}

fn link_group<H: CadDocument>(
    host: &mut H,
    name: &str,
    group: &Group,
    members: &[Handle],
) -> HostResult<usize> {
    let handle = match host.find_symbol(TableKind::Group, name) {
        Some(handle) => handle,
        None => {
            let header = ensure_named(&group.header(), name);
            let native = <H as NativeMapping<Group>>::materialize(host, &header, None)?;
            host.add_symbol(TableKind::Group, native)?
        }
    };
    let mut added = 0;
    for &member in members {
        if host.add_to_group(handle, member)? {
            added += 1;
        }
    }
    Ok(added)
}

fn capture_tables<H: CadDocument>(host: &H, query: &DbSelectQuery) -> EngineResult<Database> {
    let mode = query.mode.value_or(SelectMode::GetTables);
    if mode != SelectMode::GetTables {
        return Err(EngineError::UnsupportedSelectMode(mode));
    }
    let flags = query.table_flags.value_or(TableFlags::ALL);

    let mut db = Database::new();
    if flags.contains(TableFlags::MODEL_SPACE) {
        let model_space = capture_block(host, host.model_space()?)?;
        db.insert_block(MODEL_SPACE, model_space);
    }
    if flags.contains(TableFlags::TEXT_STYLE) {
        db.text_style_table = Field::Value(capture_table(host)?);
    }
    if flags.contains(TableFlags::LINETYPE) {
        db.linetype_table = Field::Value(capture_table(host)?);
    }
    if flags.contains(TableFlags::LAYER) {
        db.layer_table = Field::Value(capture_table(host)?);
    }
    if flags.contains(TableFlags::DIM_STYLE) {
        db.dim_style_table = Field::Value(capture_table(host)?);
    }
    if flags.contains(TableFlags::MLEADER_STYLE) {
        db.mleader_style_dict = Field::Value(capture_table(host)?);
    }
    if flags.contains(TableFlags::GROUP) {
        db.group_dict = Field::Value(capture_table(host)?);
    }
    Ok(db)
}

fn capture_table<H, R>(host: &H) -> EngineResult<Table<R>>
where
    H: NativeMapping<R>,
    R: SymbolRecord,
{
    let mut table = BTreeMap::new();
    for handle in host.symbols(R::KIND) {
        let record = host.capture(handle, host.native(handle)?)?;
        let name = record
            .name()
            .map_or_else(|| handle.to_string(), str::to_string);
        table.insert(name, Envelope(record));
    }
    Ok(table)
}

fn capture_block<H: CadDocument>(host: &H, handle: Handle) -> EngineResult<BlockTableRecord> {
    let mut block =
        <H as NativeMapping<BlockTableRecord>>::capture(host, handle, host.native(handle)?)?;
    let entities = host
        .entities(handle)?
        .into_iter()
        .map(|entity| <H as NativeMapping<Entity>>::capture(host, entity, host.native(entity)?))
        .collect::<HostResult<Vec<Entity>>>()?;
    block.entities = Field::Value(entities);
    Ok(block)
}

fn apply_delete<H: CadDocument>(
    host: &mut H,
    query: &DbDeleteQuery,
    counts: &mut DeleteCounts,
) -> EngineResult<()> {
    let Some(db) = query.database.value() else {
        debug!("delete without database");
        return Ok(());
    };

    for (key, block) in db.blocks() {
        if is_model_space(key) {
            let live = host.entities(host.model_space()?)?;
            for entity in block.entity_list() {
                let Some(id) = entity.id() else {
                    continue;
                };
                if live.contains(&Handle(id)) {
                    erase_one(host, Handle(id), entity.tag(), &id.to_string(), counts);
                } else {
                    debug!(tag = entity.tag(), id, "not a model space entity");
                }
            }
        } else {
            let name = block.symbol.name.value().map_or(key, String::as_str);
            erase_symbol(host, TableKind::Block, BlockTableRecord::TAG, name, counts);
        }
    }
    erase_symbols(host, db.groups(), counts);
    erase_symbols(host, db.mleader_styles(), counts);
    erase_symbols(host, db.dim_styles(), counts);
    erase_symbols(host, db.layers(), counts);
    erase_symbols(host, db.linetypes(), counts);
    erase_symbols(host, db.text_styles(), counts);
    Ok(())
}

fn erase_symbols<'a, H, R>(
    host: &mut H,
    entries: impl Iterator<Item = (&'a str, &'a R)>,
    counts: &mut DeleteCounts,
) where
    H: CadDocument,
    R: SymbolRecord + 'a,
{
    for (key, record) in entries {
        let name = record.name().unwrap_or(key);
        erase_symbol(host, R::KIND, R::TAG, name, counts);
    }
}

fn erase_symbol<H: CadDocument>(
    host: &mut H,
    kind: TableKind,
    tag: &str,
    name: &str,
    counts: &mut DeleteCounts,
) {
    match host.find_symbol(kind, name) {
        Some(handle) => erase_one(host, handle, tag, name, counts),
        None => debug!(%kind, name, "nothing to delete"),
    }
}

fn erase_one<H: CadDocument>(
    host: &mut H,
    handle: Handle,
    tag: &str,
    name: &str,
    counts: &mut DeleteCounts,
) {
    if host.native(handle).is_err() {
        debug!(tag, name, "nothing to delete");
        return;
    }
    match host.erase(handle) {
        Ok(()) => counts.deleted += 1,
        Err(e) => {
            warn!(tag, name, error = %e, "deletion failed");
            counts.failed += 1;
        }
    }
}
