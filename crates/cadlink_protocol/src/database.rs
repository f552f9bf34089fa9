//! The document snapshot exchanged in queries and results.

use crate::dictionary::{Group, MLeaderStyle};
use crate::symbol::{
    BlockTableRecord, DimStyleTableRecord, LayerTableRecord, LinetypeTableRecord,
    TextStyleTableRecord,
};
use cadlink_codec::{Envelope, Field, Tagged};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the model space block.
pub const MODEL_SPACE: &str = "*Model_Space";

/// Name of the default paper space block.
pub const PAPER_SPACE: &str = "*Paper_Space";

/// Returns true if `name` denotes the model space in any casing.
pub fn is_model_space(name: &str) -> bool {
    name.eq_ignore_ascii_case(MODEL_SPACE)
}

/// A table keyed by record name.
pub type Table<T> = BTreeMap<String, Envelope<T>>;

/// A snapshot of a drawing database.
///
/// Each table is optional: an absent table is left alone by insert and
/// delete, and was not requested on select.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    /// Blocks, including the model space.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub block_table: Field<Table<BlockTableRecord>>,
    /// Layers.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub layer_table: Field<Table<LayerTableRecord>>,
    /// Linetypes.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub linetype_table: Field<Table<LinetypeTableRecord>>,
    /// Text styles.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text_style_table: Field<Table<TextStyleTableRecord>>,
    /// Dimension styles.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dim_style_table: Field<Table<DimStyleTableRecord>>,
    /// Multileader styles.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub mleader_style_dict: Field<Table<MLeaderStyle>>,
    /// Groups.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub group_dict: Field<Table<Group>>,
}

fn entries<T>(table: &Field<Table<T>>) -> impl Iterator<Item = (&str, &T)> {
    table
        .value()
        .into_iter()
        .flatten()
        .map(|(name, record)| (name.as_str(), &record.0))
}

fn insert<T>(table: &mut Field<Table<T>>, name: String, record: T) {
    match table {
        Field::Value(map) => {
            map.insert(name, Envelope(record));
        }
        other => *other = Field::Value(BTreeMap::from([(name, Envelope(record))])),
    }
}

impl Database {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks in name order.
    pub fn blocks(&self) -> impl Iterator<Item = (&str, &BlockTableRecord)> {
        entries(&self.block_table)
    }

    /// Layers in name order.
    pub fn layers(&self) -> impl Iterator<Item = (&str, &LayerTableRecord)> {
        entries(&self.layer_table)
    }

    /// Linetypes in name order.
    pub fn linetypes(&self) -> impl Iterator<Item = (&str, &LinetypeTableRecord)> {
        entries(&self.linetype_table)
    }

    /// Text styles in name order.
    pub fn text_styles(&self) -> impl Iterator<Item = (&str, &TextStyleTableRecord)> {
        entries(&self.text_style_table)
    }

    /// Dimension styles in name order.
    pub fn dim_styles(&self) -> impl Iterator<Item = (&str, &DimStyleTableRecord)> {
        entries(&self.dim_style_table)
    }

    /// Multileader styles in name order.
    pub fn mleader_styles(&self) -> impl Iterator<Item = (&str, &MLeaderStyle)> {
        entries(&self.mleader_style_dict)
    }

    /// Groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &Group)> {
        entries(&self.group_dict)
    }

    /// The first block whose key is the model space, in any casing.
    pub fn model_space(&self) -> Option<&BlockTableRecord> {
        self.blocks()
            .find(|(name, _)| is_model_space(name))
            .map(|(_, block)| block)
    }

    /// Adds or replaces a block.
    pub fn insert_block(&mut self, name: impl Into<String>, block: BlockTableRecord) {
        insert(&mut self.block_table, name.into(), block);
    }

    /// Adds or replaces a layer.
    pub fn insert_layer(&mut self, name: impl Into<String>, layer: LayerTableRecord) {
        insert(&mut self.layer_table, name.into(), layer);
    }

    /// Adds or replaces a linetype.
    pub fn insert_linetype(&mut self, name: impl Into<String>, linetype: LinetypeTableRecord) {
        insert(&mut self.linetype_table, name.into(), linetype);
    }

    /// Adds or replaces a text style.
    pub fn insert_text_style(&mut self, name: impl Into<String>, style: TextStyleTableRecord) {
        insert(&mut self.text_style_table, name.into(), style);
    }

    /// Adds or replaces a dimension style.
    pub fn insert_dim_style(&mut self, name: impl Into<String>, style: DimStyleTableRecord) {
        insert(&mut self.dim_style_table, name.into(), style);
    }

    /// Adds or replaces a multileader style.
    pub fn insert_mleader_style(&mut self, name: impl Into<String>, style: MLeaderStyle) {
        insert(&mut self.mleader_style_dict, name.into(), style);
    }

    /// Adds or replaces a group.
    pub fn insert_group(&mut self, name: impl Into<String>, group: Group) {
        insert(&mut self.group_dict, name.into(), group);
    }

    /// Total number of records across all tables, not counting block
    /// contents.
    pub fn record_count(&self) -> usize {
        self.blocks().count()
            + self.layers().count()
            + self.linetypes().count()
            + self.text_styles().count()
            + self.dim_styles().count()
            + self.mleader_styles().count()
            + self.groups().count()
    }
}

impl Tagged for Database {
    const TAG: &'static str = "cadlink.db.Database";
}
