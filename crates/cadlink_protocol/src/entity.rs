//! Drawing entities.
//!
//! Every entity flattens [`EntityProps`] into its own payload, so the wire
//! form of a line is a single object holding both `layer` and `start_point`.

use crate::color::{Color, LineWeight};
use crate::dimension::{AlignedDimension, RadialDimension, RotatedDimension};
use crate::family::polymorphic_family;
use crate::geometry::{Extents3d, Matrix3d, Vector2d, Vector3d};
use cadlink_codec::{Envelope, Field, Tagged};
use serde::{Deserialize, Serialize};

/// Properties shared by every entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityProps {
    /// Host object id, present on records read from the host.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub id: Field<i64>,
    /// Entity color.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub color: Field<Envelope<Color>>,
    /// Palette index shortcut for `color`.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub color_index: Field<i16>,
    /// Layer name.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub layer: Field<String>,
    /// Linetype name.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub linetype: Field<String>,
    /// Linetype scale.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub linetype_scale: Field<f64>,
    /// Line weight.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub line_weight: Field<LineWeight>,
    /// Visibility.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub visible: Field<bool>,
    /// Block transform.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub transform: Field<Matrix3d>,
}

impl EntityProps {
    /// Properties placing an entity on `layer`.
    pub fn on_layer(layer: impl Into<String>) -> Self {
        Self {
            layer: Field::Value(layer.into()),
            ..Self::default()
        }
    }
}

pub(crate) fn transform_point_field(field: &mut Field<Vector3d>, m: &Matrix3d) {
    if let Some(p) = field.value_mut() {
        *p = m.transform_point(*p);
    }
}

pub(crate) fn transform_vector_field(field: &mut Field<Vector3d>, m: &Matrix3d) {
    if let Some(v) = field.value_mut() {
        *v = m.transform_vector(*v);
    }
}

/// A line segment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Line {
    /// Common entity properties.
    #[serde(flatten)]
    pub entity: EntityProps,
    /// Start point.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub start_point: Field<Vector3d>,
    /// End point.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub end_point: Field<Vector3d>,
    /// Extrusion thickness.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub thickness: Field<f64>,
    /// Plane normal.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub normal: Field<Vector3d>,
}

impl Line {
    /// A line between two points.
    pub fn new(start: Vector3d, end: Vector3d) -> Self {
        Self {
            start_point: Field::Value(start),
            end_point: Field::Value(end),
            ..Self::default()
        }
    }

    fn extents(&self) -> Option<Extents3d> {
        let points = [self.start_point.value(), self.end_point.value()];
        non_empty(Extents3d::from_points(points.into_iter().flatten().copied()))
    }

    fn transform_by(&mut self, m: &Matrix3d) {
        transform_point_field(&mut self.start_point, m);
        transform_point_field(&mut self.end_point, m);
        transform_vector_field(&mut self.normal, m);
    }
}

impl Tagged for Line {
    const TAG: &'static str = "cadlink.db.Line";
}

/// A circular arc.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Arc {
    /// Common entity properties.
    #[serde(flatten)]
    pub entity: EntityProps,
    /// Center point.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub center: Field<Vector3d>,
    /// Plane normal.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub normal: Field<Vector3d>,
    /// Radius.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub radius: Field<f64>,
    /// Start angle in radians.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub start_angle: Field<f64>,
    /// End angle in radians.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub end_angle: Field<f64>,
    /// Extrusion thickness.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub thickness: Field<f64>,
}

impl Arc {
    fn extents(&self) -> Option<Extents3d> {
        circle_extents(&self.center, &self.radius)
    }

    fn transform_by(&mut self, m: &Matrix3d) {
        transform_point_field(&mut self.center, m);
        transform_vector_field(&mut self.normal, m);
    }
}

impl Tagged for Arc {
    const TAG: &'static str = "cadlink.db.Arc";
}

/// A full circle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Circle {
    /// Common entity properties.
    #[serde(flatten)]
    pub entity: EntityProps,
    /// Center point.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub center: Field<Vector3d>,
    /// Plane normal.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub normal: Field<Vector3d>,
    /// Radius.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub radius: Field<f64>,
    /// Extrusion thickness.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub thickness: Field<f64>,
}

impl Circle {
    /// A circle around `center`.
    pub fn new(center: Vector3d, radius: f64) -> Self {
        Self {
            center: Field::Value(center),
            radius: Field::Value(radius),
            ..Self::default()
        }
    }

    fn extents(&self) -> Option<Extents3d> {
        circle_extents(&self.center, &self.radius)
    }

    fn transform_by(&mut self, m: &Matrix3d) {
        transform_point_field(&mut self.center, m);
        transform_vector_field(&mut self.normal, m);
    }
}

impl Tagged for Circle {
    const TAG: &'static str = "cadlink.db.Circle";
}

// Conservative: the full circle box, also for arcs.
fn circle_extents(center: &Field<Vector3d>, radius: &Field<f64>) -> Option<Extents3d> {
    let (c, r) = (center.value()?, radius.value()?.abs());
    Some(Extents3d::from_corners(
        Vector3d::new(c.x - r, c.y - r, c.z),
        Vector3d::new(c.x + r, c.y + r, c.z),
    ))
}

fn non_empty(extents: Extents3d) -> Option<Extents3d> {
    (!extents.is_empty()).then_some(extents)
}

/// One vertex of a lightweight polyline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vertex {
    /// Position in the polyline plane.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub point: Field<Vector2d>,
    /// Bulge of the following segment.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub bulge: Field<f64>,
    /// Width at the vertex.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub start_width: Field<f64>,
    /// Width at the next vertex.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub end_width: Field<f64>,
}

impl Vertex {
    /// A straight vertex at `point`.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            point: Field::Value(Vector2d::new(x, y)),
            ..Self::default()
        }
    }
}

impl Tagged for Vertex {
    const TAG: &'static str = "cadlink.db.Vertex";
}

/// A lightweight planar polyline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Polyline {
    /// Common entity properties.
    #[serde(flatten)]
    pub entity: EntityProps,
    /// Whether the last vertex connects to the first.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub closed: Field<bool>,
    /// Uniform segment width.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub constant_width: Field<f64>,
    /// Height of the polyline plane.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub elevation: Field<f64>,
    /// Plane normal.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub normal: Field<Vector3d>,
    /// Extrusion thickness.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub thickness: Field<f64>,
    /// Vertices in order.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub vertices: Field<Vec<Envelope<Vertex>>>,
}

impl Polyline {
    /// An open polyline through `points`.
    pub fn through(points: &[(f64, f64)]) -> Self {
        Self {
            vertices: Field::Value(
                points
                    .iter()
                    .map(|&(x, y)| Envelope(Vertex::at(x, y)))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    fn points(&self) -> impl Iterator<Item = Vector3d> + '_ {
        let z = self.elevation.value_or(0.0);
        self.vertices
            .value()
            .into_iter()
            .flatten()
            .filter_map(move |v| v.point.value().map(|p| p.with_z(z)))
    }

    fn extents(&self) -> Option<Extents3d> {
        non_empty(Extents3d::from_points(self.points()))
    }

    fn transform_by(&mut self, m: &Matrix3d) {
        let z = self.elevation.value_or(0.0);
        let mut new_z = None;
        if let Some(vertices) = self.vertices.value_mut() {
            for vertex in vertices.iter_mut() {
                if let Some(p) = vertex.point.value_mut() {
                    let moved = m.transform_point(p.with_z(z));
                    *p = moved.to_2d();
                    new_z.get_or_insert(moved.z);
                }
            }
        }
        if let Some(z) = new_z {
            if self.elevation.is_present() || z != 0.0 {
                self.elevation = Field::Value(z);
            }
        }
        transform_vector_field(&mut self.normal, m);
    }
}

impl Tagged for Polyline {
    const TAG: &'static str = "cadlink.db.Polyline";
}

/// A single-line text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbText {
    /// Common entity properties.
    #[serde(flatten)]
    pub entity: EntityProps,
    /// Insertion point.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub position: Field<Vector3d>,
    /// Text content.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text_string: Field<String>,
    /// Character height.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub height: Field<f64>,
    /// Rotation in radians.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub rotation: Field<f64>,
    /// Width factor.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub width_factor: Field<f64>,
    /// Oblique angle in radians.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub oblique: Field<f64>,
    /// Name of the text style.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub text_style_name: Field<String>,
}

impl DbText {
    fn extents(&self) -> Option<Extents3d> {
        let p = *self.position.value()?;
        let h = self.height.value_or(0.0);
        let len = self
            .text_string
            .value()
            .map_or(0, |s| s.chars().count()) as f64;
        let w = h * self.width_factor.value_or(1.0) * len;
        Some(Extents3d::from_corners(p, Vector3d::new(p.x + w, p.y + h, p.z)))
    }

    fn transform_by(&mut self, m: &Matrix3d) {
        transform_point_field(&mut self.position, m);
    }
}

impl Tagged for DbText {
    const TAG: &'static str = "cadlink.db.DBText";
}

/// An instance of a named block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockReference {
    /// Common entity properties.
    #[serde(flatten)]
    pub entity: EntityProps,
    /// Name of the referenced block.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub block_name: Field<String>,
    /// Insertion point.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub position: Field<Vector3d>,
    /// Rotation in radians.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub rotation: Field<f64>,
    /// Per-axis scale.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub scale_factors: Field<Vector3d>,
    /// Plane normal.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub normal: Field<Vector3d>,
}

impl BlockReference {
    /// A reference to `block_name` at `position`.
    pub fn new(block_name: impl Into<String>, position: Vector3d) -> Self {
        Self {
            block_name: Field::Value(block_name.into()),
            position: Field::Value(position),
            ..Self::default()
        }
    }

    fn extents(&self) -> Option<Extents3d> {
        self.position
            .value()
            .map(|&p| Extents3d::from_corners(p, p))
    }

    fn transform_by(&mut self, m: &Matrix3d) {
        transform_point_field(&mut self.position, m);
        transform_vector_field(&mut self.normal, m);
    }
}

impl Tagged for BlockReference {
    const TAG: &'static str = "cadlink.db.BlockReference";
}

/// A filled or patterned area bounded by curves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hatch {
    /// Common entity properties.
    #[serde(flatten)]
    pub entity: EntityProps,
    /// Pattern name, `SOLID` for a fill.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub pattern_name: Field<String>,
    /// Pattern scale.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub pattern_scale: Field<f64>,
    /// Pattern angle in radians.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub pattern_angle: Field<f64>,
    /// Whether the hatch follows its boundary.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub associative: Field<bool>,
    /// Boundary curves.
    #[serde(skip_serializing_if = "Field::is_absent")]
    pub loops: Field<Vec<Curve>>,
}

impl Hatch {
    fn extents(&self) -> Option<Extents3d> {
        let mut extents = Extents3d::new();
        for curve in self.loops.value().into_iter().flatten() {
            if let Some(e) = curve.extents() {
                extents.add_extents(&e);
            }
        }
        non_empty(extents)
    }

    fn transform_by(&mut self, m: &Matrix3d) {
        if let Some(loops) = self.loops.value_mut() {
            loops.iter_mut().for_each(|c| c.transform_by(m));
        }
    }
}

impl Tagged for Hatch {
    const TAG: &'static str = "cadlink.db.Hatch";
}

polymorphic_family! {
    /// Any drawing entity.
    pub enum Entity {
        Line,
        Arc,
        Circle,
        Polyline,
        DbText,
        BlockReference,
        Hatch,
        AlignedDimension,
        RotatedDimension,
        RadialDimension,
    }
}

polymorphic_family! {
    /// Any curve entity.
    pub enum Curve {
        Line,
        Arc,
        Circle,
        Polyline,
    }
}

macro_rules! dispatch {
    ($value:expr, $bind:ident => $body:expr, [$($variant:ident),+]) => {
        match $value {
            $(Self::$variant($bind) => $body,)+
        }
    };
}

impl Entity {
    /// Common entity properties.
    pub fn props(&self) -> &EntityProps {
        dispatch!(self, e => &e.entity, [Line, Arc, Circle, Polyline, DbText, BlockReference,
            Hatch, AlignedDimension, RotatedDimension, RadialDimension])
    }

    /// Mutable common entity properties.
    pub fn props_mut(&mut self) -> &mut EntityProps {
        dispatch!(self, e => &mut e.entity, [Line, Arc, Circle, Polyline, DbText, BlockReference,
            Hatch, AlignedDimension, RotatedDimension, RadialDimension])
    }

    /// Host object id, if the record came from the host.
    pub fn id(&self) -> Option<i64> {
        self.props().id.value().copied()
    }

    /// Returns true for entities whose geometry is computed from
    /// definition points by the host.
    pub fn is_dimension(&self) -> bool {
        matches!(
            self,
            Entity::AlignedDimension(_) | Entity::RotatedDimension(_) | Entity::RadialDimension(_)
        )
    }

    /// Bounding box of the defined geometry, if enough of it is present.
    pub fn extents(&self) -> Option<Extents3d> {
        dispatch!(self, e => e.extents(), [Line, Arc, Circle, Polyline, DbText, BlockReference,
            Hatch, AlignedDimension, RotatedDimension, RadialDimension])
    }

    /// Applies a transform to every positional field that is present.
    pub fn transform_by(&mut self, m: &Matrix3d) {
        dispatch!(self, e => e.transform_by(m), [Line, Arc, Circle, Polyline, DbText,
            BlockReference, Hatch, AlignedDimension, RotatedDimension, RadialDimension])
    }

    /// Definition points of a dimension, empty for other entities.
    pub fn definition_points(&self) -> Vec<Vector3d> {
        match self {
            Entity::AlignedDimension(d) => d.definition_points(),
            Entity::RotatedDimension(d) => d.definition_points(),
            Entity::RadialDimension(d) => d.definition_points(),
            _ => Vec::new(),
        }
    }

    /// Name of the block this entity references, if any.
    pub fn referenced_block(&self) -> Option<&str> {
        match self {
            Entity::BlockReference(r) => r.block_name.value().map(String::as_str),
            _ => None,
        }
    }
}

impl Curve {
    /// Bounding box of the defined geometry.
    pub fn extents(&self) -> Option<Extents3d> {
        dispatch!(self, c => c.extents(), [Line, Arc, Circle, Polyline])
    }

    /// Applies a transform to every positional field that is present.
    pub fn transform_by(&mut self, m: &Matrix3d) {
        dispatch!(self, c => c.transform_by(m), [Line, Arc, Circle, Polyline])
    }
}

impl From<Curve> for Entity {
    fn from(curve: Curve) -> Self {
        match curve {
            Curve::Line(v) => Entity::Line(v),
            Curve::Arc(v) => Entity::Arc(v),
            Curve::Circle(v) => Entity::Circle(v),
            Curve::Polyline(v) => Entity::Polyline(v),
        }
    }
}

impl TryFrom<Entity> for Curve {
    type Error = Entity;

    fn try_from(entity: Entity) -> Result<Self, Entity> {
        match entity {
            Entity::Line(v) => Ok(Curve::Line(v)),
            Entity::Arc(v) => Ok(Curve::Arc(v)),
            Entity::Circle(v) => Ok(Curve::Circle(v)),
            Entity::Polyline(v) => Ok(Curve::Polyline(v)),
            other => Err(other),
        }
    }
}
