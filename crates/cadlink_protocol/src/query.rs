//! Requests sent by the client.

use crate::color::InvalidCode;
use crate::database::Database;
use crate::family::polymorphic_family;
use crate::geometry::Vector3d;
use cadlink_codec::{Envelope, Field, Tagged};
use serde::{Deserialize, Serialize};

/// Which bounding box an insert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ExtentsMode {
    /// No extents.
    #[default]
    None,
    /// Extents of the entities added by this query.
    Added,
    /// Extents of the whole drawing after the insert.
    All,
}

impl From<ExtentsMode> for u8 {
    fn from(mode: ExtentsMode) -> Self {
        match mode {
            ExtentsMode::None => 0,
            ExtentsMode::Added => 1,
            ExtentsMode::All => 2,
        }
    }
}

impl TryFrom<u8> for ExtentsMode {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ExtentsMode::None),
            1 => Ok(ExtentsMode::Added),
            2 => Ok(ExtentsMode::All),
            _ => Err(InvalidCode::new("extents mode", i64::from(code))),
        }
    }
}

/// Writes a snapshot into the drawing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbInsertQuery {
    /// Records to write.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub database: Field<Envelope<Database>>,
    /// Update records that already exist. Anything but `true` skips them.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub upsert: Field<bool>,
    /// Offset applied to every model space entity.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub insertion_point: Field<Vector3d>,
    /// Which extents to report.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub extents_mode: Field<ExtentsMode>,
}

impl DbInsertQuery {
    /// An insert of `database` without upsert.
    pub fn new(database: Database) -> Self {
        Self {
            database: Field::Value(Envelope(database)),
            ..Self::default()
        }
    }

    /// Enables or disables upsert.
    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = Field::Value(upsert);
        self
    }

    /// Sets the insertion point.
    pub fn with_insertion_point(mut self, point: Vector3d) -> Self {
        self.insertion_point = Field::Value(point);
        self
    }

    /// Sets the extents mode.
    pub fn with_extents_mode(mut self, mode: ExtentsMode) -> Self {
        self.extents_mode = Field::Value(mode);
        self
    }

    /// Returns true only when upsert was explicitly requested.
    pub fn is_upsert(&self) -> bool {
        self.upsert == Field::Value(true)
    }
}

impl Tagged for DbInsertQuery {
    const TAG: &'static str = "cadlink.query.DbInsertQuery";
}

/// What a select reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SelectMode {
    /// The tables named by the flags.
    #[default]
    GetTables,
    /// Entities picked interactively by the user.
    GetUserSelection,
    /// Generated test entities.
    TestEntities,
}

impl From<SelectMode> for u8 {
    fn from(mode: SelectMode) -> Self {
        match mode {
            SelectMode::GetTables => 0,
            SelectMode::GetUserSelection => 1,
            SelectMode::TestEntities => 2,
        }
    }
}

impl TryFrom<u8> for SelectMode {
    type Error = InvalidCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SelectMode::GetTables),
            1 => Ok(SelectMode::GetUserSelection),
            2 => Ok(SelectMode::TestEntities),
            _ => Err(InvalidCode::new("select mode", i64::from(code))),
        }
    }
}

/// Bit set naming the tables a select reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableFlags(pub u32);

impl TableFlags {
    /// The model space with its entities.
    pub const MODEL_SPACE: TableFlags = TableFlags(0x01);
    /// Text styles.
    pub const TEXT_STYLE: TableFlags = TableFlags(0x02);
    /// Linetypes.
    pub const LINETYPE: TableFlags = TableFlags(0x04);
    /// Layers.
    pub const LAYER: TableFlags = TableFlags(0x08);
    /// Dimension styles.
    pub const DIM_STYLE: TableFlags = TableFlags(0x10);
    /// Multileader styles.
    pub const MLEADER_STYLE: TableFlags = TableFlags(0x20);
    /// Groups.
    pub const GROUP: TableFlags = TableFlags(0x40);
    /// Every table.
    pub const ALL: TableFlags = TableFlags(0x7F);

    /// Returns true if every bit of `other` is set.
    pub fn contains(self, other: TableFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TableFlags {
    type Output = TableFlags;

    fn bitor(self, rhs: TableFlags) -> TableFlags {
        TableFlags(self.0 | rhs.0)
    }
}

/// Reads a snapshot from the drawing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSelectQuery {
    /// What to read.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub mode: Field<SelectMode>,
    /// Tables to read in `GetTables` mode.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub table_flags: Field<TableFlags>,
}

impl DbSelectQuery {
    /// A `GetTables` select of `flags`.
    pub fn tables(flags: TableFlags) -> Self {
        Self {
            mode: Field::Value(SelectMode::GetTables),
            table_flags: Field::Value(flags),
        }
    }
}

impl Tagged for DbSelectQuery {
    const TAG: &'static str = "cadlink.query.DbSelectQuery";
}

/// Erases records named by a snapshot.
///
/// Symbols are matched by table key. Model space entities are matched by
/// `id`; entities without one are ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbDeleteQuery {
    /// Records to erase.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub database: Field<Envelope<Database>>,
}

impl DbDeleteQuery {
    /// A delete of everything named in `database`.
    pub fn new(database: Database) -> Self {
        Self {
            database: Field::Value(Envelope(database)),
        }
    }
}

impl Tagged for DbDeleteQuery {
    const TAG: &'static str = "cadlink.query.DbDeleteQuery";
}

polymorphic_family! {
    /// Any request.
    pub enum Query {
        DbInsertQuery,
        DbSelectQuery,
        DbDeleteQuery,
    }
}
