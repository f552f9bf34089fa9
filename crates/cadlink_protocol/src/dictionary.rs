//! Named dictionary items.

use crate::family::polymorphic_family;
use crate::symbol::{impl_symbol, Symbol, SymbolProps};
use cadlink_codec::{Field, Tagged};
use serde::{Deserialize, Serialize};

/// A multileader style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MLeaderStyle {
    /// Shared symbol properties.
    #[serde(flatten)]
    pub symbol: SymbolProps,
    /// Arrowhead size.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub arrow_size: Field<f64>,
    /// Gap left where the leader crosses another object.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub break_size: Field<f64>,
    /// Leader content: none, block or mtext.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub content_type: Field<i32>,
    /// Landing length.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dogleg_length: Field<f64>,
    /// Gap between landing and text.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub landing_gap: Field<f64>,
    /// How the text angle follows the leader.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text_angle_type: Field<i32>,
    /// Text justification.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text_alignment_type: Field<i32>,
    /// Where the leader attaches to the text.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text_attachment_type: Field<i32>,
    /// Text style name.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text_style_name: Field<String>,
}

impl MLeaderStyle {
    /// A style called `name` with every property unset.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            symbol: SymbolProps::named(name),
            ..Self::default()
        }
    }
}

impl Tagged for MLeaderStyle {
    const TAG: &'static str = "cadlink.db.MLeaderStyle";
}

/// A named selection set of entities.
///
/// `entity_ids` are ids from the snapshot the group was captured with.
/// On insert they are matched against the prior ids of inserted entities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    /// Shared symbol properties.
    #[serde(flatten)]
    pub symbol: SymbolProps,
    /// Description.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub description: Field<String>,
    /// Whether selecting one member selects the group.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub selectable: Field<bool>,
    /// Member ids.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub entity_ids: Field<Vec<i64>>,
}

impl Group {
    /// A group called `name` holding `ids`.
    pub fn with_members(name: impl Into<String>, ids: Vec<i64>) -> Self {
        Self {
            symbol: SymbolProps::named(name),
            entity_ids: Field::Value(ids),
            ..Self::default()
        }
    }

    /// The record without its member list.
    pub fn header(&self) -> Group {
        Group {
            entity_ids: Field::Absent,
            ..self.clone()
        }
    }

    /// Returns true if `id` is a recorded member.
    pub fn contains(&self, id: i64) -> bool {
        self.entity_ids.value().is_some_and(|ids| ids.contains(&id))
    }
}

impl Tagged for Group {
    const TAG: &'static str = "cadlink.db.Group";
}

impl_symbol!(MLeaderStyle, Group);

polymorphic_family! {
    /// Any named dictionary item.
    pub enum DictionaryItem {
        MLeaderStyle,
        Group,
    }
}

impl DictionaryItem {
    /// Shared symbol properties.
    pub fn symbol(&self) -> &SymbolProps {
        match self {
            DictionaryItem::MLeaderStyle(s) => s.symbol(),
            DictionaryItem::Group(g) => g.symbol(),
        }
    }
}
