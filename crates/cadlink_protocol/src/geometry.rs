//! Geometric leaf values.
//!
//! These travel as plain float arrays, never inside an envelope.

use serde::{Deserialize, Serialize};

/// A 2D point or vector, `[x, y]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Vector2d {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vector2d {
    /// Creates a vector.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Lifts the vector into 3D at the given elevation.
    pub fn with_z(self, z: f64) -> Vector3d {
        Vector3d::new(self.x, self.y, z)
    }
}

impl From<[f64; 2]> for Vector2d {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Vector2d> for [f64; 2] {
    fn from(v: Vector2d) -> Self {
        [v.x, v.y]
    }
}

/// A 3D point or vector, `[x, y, z]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vector3d {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vector3d {
    /// The origin.
    pub const ZERO: Vector3d = Vector3d::new(0.0, 0.0, 0.0);

    /// The positive Z axis.
    pub const Z_AXIS: Vector3d = Vector3d::new(0.0, 0.0, 1.0);

    /// Creates a vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise sum.
    pub fn add(self, other: Vector3d) -> Vector3d {
        Vector3d::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Drops the Z component.
    pub fn to_2d(self) -> Vector2d {
        Vector2d::new(self.x, self.y)
    }
}

impl From<[f64; 3]> for Vector3d {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Vector3d> for [f64; 3] {
    fn from(v: Vector3d) -> Self {
        [v.x, v.y, v.z]
    }
}

/// A 4x4 affine transform, 16 row-major floats on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix3d(pub [f64; 16]);

impl Matrix3d {
    /// The identity transform.
    pub const IDENTITY: Matrix3d = Matrix3d([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// A pure translation by `offset`.
    pub fn displacement(offset: Vector3d) -> Self {
        let mut m = Self::IDENTITY.0;
        m[3] = offset.x;
        m[7] = offset.y;
        m[11] = offset.z;
        Matrix3d(m)
    }

    /// Element at `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[row * 4 + col]
    }

    /// Applies the transform to a point.
    pub fn transform_point(&self, p: Vector3d) -> Vector3d {
        let m = &self.0;
        Vector3d::new(
            m[0] * p.x + m[1] * p.y + m[2] * p.z + m[3],
            m[4] * p.x + m[5] * p.y + m[6] * p.z + m[7],
            m[8] * p.x + m[9] * p.y + m[10] * p.z + m[11],
        )
    }

    /// Applies the linear part of the transform to a direction.
    pub fn transform_vector(&self, v: Vector3d) -> Vector3d {
        let m = &self.0;
        Vector3d::new(
            m[0] * v.x + m[1] * v.y + m[2] * v.z,
            m[4] * v.x + m[5] * v.y + m[6] * v.z,
            m[8] * v.x + m[9] * v.y + m[10] * v.z,
        )
    }

    /// `self * other`, so `other` is applied first.
    pub fn multiply(&self, other: &Matrix3d) -> Matrix3d {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = (0..4).map(|k| self.get(row, k) * other.get(k, col)).sum();
            }
        }
        Matrix3d(out)
    }
}

impl Default for Matrix3d {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An axis-aligned bounding box, `[[min], [max]]` on the wire.
///
/// A default box is empty; adding a point makes it valid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[Vector3d; 2]", into = "[Vector3d; 2]")]
pub struct Extents3d {
    bounds: Option<(Vector3d, Vector3d)>,
}

impl Extents3d {
    /// Creates an empty box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a box from its corners.
    pub fn from_corners(min: Vector3d, max: Vector3d) -> Self {
        Self {
            bounds: Some((min, max)),
        }
    }

    /// Creates the smallest box holding all points.
    pub fn from_points(points: impl IntoIterator<Item = Vector3d>) -> Self {
        let mut extents = Self::new();
        for p in points {
            extents.add_point(p);
        }
        extents
    }

    /// Returns true if no point was ever added.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Minimum corner.
    pub fn min_point(&self) -> Option<Vector3d> {
        self.bounds.map(|(min, _)| min)
    }

    /// Maximum corner.
    pub fn max_point(&self) -> Option<Vector3d> {
        self.bounds.map(|(_, max)| max)
    }

    /// Grows the box to include `p`.
    pub fn add_point(&mut self, p: Vector3d) {
        self.bounds = Some(match self.bounds {
            None => (p, p),
            Some((min, max)) => (
                Vector3d::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3d::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            ),
        });
    }

    /// Grows the box to include another box.
    pub fn add_extents(&mut self, other: &Extents3d) {
        if let Some((min, max)) = other.bounds {
            self.add_point(min);
            self.add_point(max);
        }
    }
}

impl From<[Vector3d; 2]> for Extents3d {
    fn from([min, max]: [Vector3d; 2]) -> Self {
        Self::from_corners(min, max)
    }
}

impl From<Extents3d> for [Vector3d; 2] {
    fn from(e: Extents3d) -> Self {
        let (min, max) = e.bounds.unwrap_or((Vector3d::ZERO, Vector3d::ZERO));
        [min, max]
    }
}
