//! Symbol table records.
//!
//! Symbol records are unique by name within their table. The engine looks
//! them up by name before deciding whether to insert, update or skip.

use crate::color::{Color, LineWeight};
use crate::entity::Entity;
use crate::geometry::{Vector2d, Vector3d};
use cadlink_codec::{Envelope, Field, Tagged};
use serde::{Deserialize, Serialize};

/// Properties shared by every symbol record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolProps {
    /// Host object id, present on records read from the host.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub id: Field<i64>,
    /// Table key.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub name: Field<String>,
}

impl SymbolProps {
    /// Properties for a record called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: Field::Absent,
            name: Field::Value(name.into()),
        }
    }
}

/// Access to the shared symbol properties.
pub trait Symbol {
    /// Shared properties.
    fn symbol(&self) -> &SymbolProps;

    /// Mutable shared properties.
    fn symbol_mut(&mut self) -> &mut SymbolProps;

    /// Record name, if set.
    fn name(&self) -> Option<&str> {
        self.symbol().name.value().map(String::as_str)
    }

    /// Host object id, if set.
    fn id(&self) -> Option<i64> {
        self.symbol().id.value().copied()
    }
}

macro_rules! impl_symbol {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Symbol for $ty {
                fn symbol(&self) -> &SymbolProps {
                    &self.symbol
                }

                fn symbol_mut(&mut self) -> &mut SymbolProps {
                    &mut self.symbol
                }
            }
        )+
    };
}

pub(crate) use impl_symbol;

/// A named block: a container of entities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockTableRecord {
    /// Shared symbol properties.
    #[serde(flatten)]
    pub symbol: SymbolProps,
    /// Base point.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub origin: Field<Vector3d>,
    /// Description.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub comments: Field<String>,
    /// Contained entities in drawing order.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub entities: Field<Vec<Entity>>,
}

impl BlockTableRecord {
    /// An empty block called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            symbol: SymbolProps::named(name),
            ..Self::default()
        }
    }

    /// Adds an entity to the block.
    pub fn push(&mut self, entity: impl Into<Entity>) {
        match &mut self.entities {
            Field::Value(list) => list.push(entity.into()),
            other => *other = Field::Value(vec![entity.into()]),
        }
    }

    /// The record without its entity list.
    pub fn header(&self) -> BlockTableRecord {
        BlockTableRecord {
            symbol: self.symbol.clone(),
            origin: self.origin.clone(),
            comments: self.comments.clone(),
            entities: Field::Absent,
        }
    }

    /// Contained entities, empty when unset.
    pub fn entity_list(&self) -> &[Entity] {
        self.entities.value().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Tagged for BlockTableRecord {
    const TAG: &'static str = "cadlink.db.BlockTableRecord";
}

/// A layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerTableRecord {
    /// Shared symbol properties.
    #[serde(flatten)]
    pub symbol: SymbolProps,
    /// Layer color.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub color: Field<Envelope<Color>>,
    /// Frozen in all viewports.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub is_frozen: Field<bool>,
    /// Locked against editing.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub is_locked: Field<bool>,
    /// Hidden.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub is_off: Field<bool>,
    /// Included when plotting.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub is_plottable: Field<bool>,
    /// Default line weight.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub line_weight: Field<LineWeight>,
    /// Default linetype name.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub linetype: Field<String>,
}

impl LayerTableRecord {
    /// A layer called `name` with every property unset.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            symbol: SymbolProps::named(name),
            ..Self::default()
        }
    }
}

impl Tagged for LayerTableRecord {
    const TAG: &'static str = "cadlink.db.LayerTableRecord";
}

/// One dash, gap or embedded shape of a linetype.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinetypeSegment {
    /// Dash length, negative for a gap.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dash_length: Field<f64>,
    /// Shape number in the shape file.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub shape_number: Field<i32>,
    /// Shape offset.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub shape_offset: Field<Vector2d>,
    /// Shape rotation in radians.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub shape_rotation: Field<f64>,
    /// Shape scale.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub shape_scale: Field<f64>,
    /// Text style used by an embedded text.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub shape_style: Field<String>,
    /// Rotation relative to the UCS rather than the line.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub shape_is_ucs_oriented: Field<bool>,
    /// Embedded text.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text: Field<String>,
}

impl Tagged for LinetypeSegment {
    const TAG: &'static str = "cadlink.db.LinetypeSegment";
}

/// A linetype.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinetypeTableRecord {
    /// Shared symbol properties.
    #[serde(flatten)]
    pub symbol: SymbolProps,
    /// Description.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub comments: Field<String>,
    /// Whether the pattern stretches to fit each segment.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub is_scaled_to_fit: Field<bool>,
    /// Total pattern length.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub pattern_length: Field<f64>,
    /// Pattern elements in order.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub segments: Field<Vec<Envelope<LinetypeSegment>>>,
}

impl LinetypeTableRecord {
    /// A linetype called `name` with every property unset.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            symbol: SymbolProps::named(name),
            ..Self::default()
        }
    }
}

impl Tagged for LinetypeTableRecord {
    const TAG: &'static str = "cadlink.db.LinetypeTableRecord";
}

/// A TrueType font selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FontDescriptor {
    /// Typeface name.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub type_face: Field<String>,
    /// Bold.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub bold: Field<bool>,
    /// Italic.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub italic: Field<bool>,
    /// Windows character set.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub character_set: Field<i32>,
    /// Windows pitch and family.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub pitch_and_family: Field<i32>,
}

impl Tagged for FontDescriptor {
    const TAG: &'static str = "cadlink.db.FontDescriptor";
}

/// A text style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyleTableRecord {
    /// Shared symbol properties.
    #[serde(flatten)]
    pub symbol: SymbolProps,
    /// TrueType font.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub font: Field<Envelope<FontDescriptor>>,
    /// Font file.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub file_name: Field<String>,
    /// Big font file for Asian scripts.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub big_font_file_name: Field<String>,
    /// Raw style flags.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub flag_bits: Field<u8>,
    /// Whether the style names a shape file.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub is_shape_file: Field<bool>,
    /// Vertical text.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub is_vertical: Field<bool>,
    /// Oblique angle in radians.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub obliquing_angle: Field<f64>,
    /// Last height used.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub prior_size: Field<f64>,
    /// Fixed height, zero for variable.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text_size: Field<f64>,
    /// Width factor.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub x_scale: Field<f64>,
}

impl TextStyleTableRecord {
    /// A text style called `name` with every property unset.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            symbol: SymbolProps::named(name),
            ..Self::default()
        }
    }
}

impl Tagged for TextStyleTableRecord {
    const TAG: &'static str = "cadlink.db.TextStyleTableRecord";
}

/// A dimension style.
///
/// Only the commonly set dimension variables are carried. Variable names
/// follow the host's `DIMxxx` system variables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DimStyleTableRecord {
    /// Shared symbol properties.
    #[serde(flatten)]
    pub symbol: SymbolProps,
    /// Arrow size.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimasz: Field<f64>,
    /// Arrow block name.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimblk: Field<String>,
    /// Dimension line color.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimclrd: Field<Envelope<Color>>,
    /// Extension line color.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimclre: Field<Envelope<Color>>,
    /// Text color.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimclrt: Field<Envelope<Color>>,
    /// Decimal places.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimdec: Field<i32>,
    /// Extension past the dimension line.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimexe: Field<f64>,
    /// Extension line offset from the origin.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimexo: Field<f64>,
    /// Gap around the text.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimgap: Field<f64>,
    /// Dimension line weight.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimlwd: Field<LineWeight>,
    /// Extension line weight.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimlwe: Field<LineWeight>,
    /// Text prefix and suffix, `<>` stands for the measurement.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimpost: Field<String>,
    /// Overall scale.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimscale: Field<f64>,
    /// Vertical text placement.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimtad: Field<i32>,
    /// Text height.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimtxt: Field<f64>,
    /// Text style name.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimtxsty: Field<String>,
}

impl DimStyleTableRecord {
    /// A dimension style called `name` with every variable unset.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            symbol: SymbolProps::named(name),
            ..Self::default()
        }
    }
}

impl Tagged for DimStyleTableRecord {
    const TAG: &'static str = "cadlink.db.DimStyleTableRecord";
}

impl_symbol!(
    BlockTableRecord,
    LayerTableRecord,
    LinetypeTableRecord,
    TextStyleTableRecord,
    DimStyleTableRecord,
);
