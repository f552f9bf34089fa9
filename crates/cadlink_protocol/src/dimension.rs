//! Dimension entities.
//!
//! Dimensions carry definition points only. The host computes their
//! rendered geometry, so their bounds are unknown until it has done so.

use crate::entity::{transform_point_field, transform_vector_field, EntityProps};
use crate::geometry::{Extents3d, Matrix3d, Vector3d};
use cadlink_codec::{Field, Tagged};
use serde::{Deserialize, Serialize};

/// Properties shared by every dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionProps {
    /// Name of the dimension style.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimension_style_name: Field<String>,
    /// Override text, `<>` stands for the measurement.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dimension_text: Field<String>,
    /// Text location.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text_position: Field<Vector3d>,
    /// Text rotation in radians.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text_rotation: Field<f64>,
    /// Measured value, read-only on the host.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub measurement: Field<f64>,
    /// Text placed before the measurement.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub prefix: Field<String>,
    /// Text placed after the measurement.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub suffix: Field<String>,
    /// Plane normal.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub normal: Field<Vector3d>,
    /// Height of the dimension plane.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub elevation: Field<f64>,
    /// Rotation of the horizontal direction.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub horizontal_rotation: Field<f64>,
}

impl DimensionProps {
    fn transform_by(&mut self, m: &Matrix3d) {
        transform_point_field(&mut self.text_position, m);
        transform_vector_field(&mut self.normal, m);
    }
}

/// A linear dimension parallel to the measured points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignedDimension {
    /// Common entity properties.
    #[serde(flatten)]
    pub entity: EntityProps,
    /// Common dimension properties.
    #[serde(flatten)]
    pub dimension: DimensionProps,
    /// First extension line origin.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub x_line1_point: Field<Vector3d>,
    /// Second extension line origin.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub x_line2_point: Field<Vector3d>,
    /// A point on the dimension line.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dim_line_point: Field<Vector3d>,
    /// Extension line oblique angle.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub oblique: Field<f64>,
}

impl AlignedDimension {
    /// A dimension measuring `p1` to `p2` with its line through `line_point`.
    pub fn new(p1: Vector3d, p2: Vector3d, line_point: Vector3d) -> Self {
        Self {
            x_line1_point: Field::Value(p1),
            x_line2_point: Field::Value(p2),
            dim_line_point: Field::Value(line_point),
            ..Self::default()
        }
    }

    /// Points that define the dimension.
    pub fn definition_points(&self) -> Vec<Vector3d> {
        [&self.x_line1_point, &self.x_line2_point, &self.dim_line_point]
            .into_iter()
            .filter_map(|f| f.value().copied())
            .collect()
    }

    pub(crate) fn extents(&self) -> Option<Extents3d> {
        None
    }

    pub(crate) fn transform_by(&mut self, m: &Matrix3d) {
        self.dimension.transform_by(m);
        transform_point_field(&mut self.x_line1_point, m);
        transform_point_field(&mut self.x_line2_point, m);
        transform_point_field(&mut self.dim_line_point, m);
    }
}

impl Tagged for AlignedDimension {
    const TAG: &'static str = "cadlink.db.AlignedDimension";
}

/// A linear dimension measured along a fixed angle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatedDimension {
    /// Common entity properties.
    #[serde(flatten)]
    pub entity: EntityProps,
    /// Common dimension properties.
    #[serde(flatten)]
    pub dimension: DimensionProps,
    /// First extension line origin.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub x_line1_point: Field<Vector3d>,
    /// Second extension line origin.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub x_line2_point: Field<Vector3d>,
    /// A point on the dimension line.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub dim_line_point: Field<Vector3d>,
    /// Extension line oblique angle.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub oblique: Field<f64>,
    /// Measurement direction in radians.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub rotation: Field<f64>,
}

impl RotatedDimension {
    /// Points that define the dimension.
    pub fn definition_points(&self) -> Vec<Vector3d> {
        [&self.x_line1_point, &self.x_line2_point, &self.dim_line_point]
            .into_iter()
            .filter_map(|f| f.value().copied())
            .collect()
    }

    pub(crate) fn extents(&self) -> Option<Extents3d> {
        None
    }

    pub(crate) fn transform_by(&mut self, m: &Matrix3d) {
        self.dimension.transform_by(m);
        transform_point_field(&mut self.x_line1_point, m);
        transform_point_field(&mut self.x_line2_point, m);
        transform_point_field(&mut self.dim_line_point, m);
    }
}

impl Tagged for RotatedDimension {
    const TAG: &'static str = "cadlink.db.RotatedDimension";
}

/// A radius dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialDimension {
    /// Common entity properties.
    #[serde(flatten)]
    pub entity: EntityProps,
    /// Common dimension properties.
    #[serde(flatten)]
    pub dimension: DimensionProps,
    /// Center of the measured curve.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub center: Field<Vector3d>,
    /// Point on the measured curve.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub chord_point: Field<Vector3d>,
    /// Leader length past the chord point.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub leader_length: Field<f64>,
}

impl RadialDimension {
    /// Points that define the dimension.
    pub fn definition_points(&self) -> Vec<Vector3d> {
        [&self.center, &self.chord_point]
            .into_iter()
            .filter_map(|f| f.value().copied())
            .collect()
    }

    pub(crate) fn extents(&self) -> Option<Extents3d> {
        None
    }

    pub(crate) fn transform_by(&mut self, m: &Matrix3d) {
        self.dimension.transform_by(m);
        transform_point_field(&mut self.center, m);
        transform_point_field(&mut self.chord_point, m);
    }
}

impl Tagged for RadialDimension {
    const TAG: &'static str = "cadlink.db.RadialDimension";
}
