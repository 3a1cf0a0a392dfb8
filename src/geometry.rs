//! 3D geometry primitives for joint positions.
//!
//! Joint coordinates live in the capture's normalized screen space (roughly `[0, 1]` or
//! `[-1, 1]` per axis, +y pointing down). The wrapper keeps the math on
//! [`nalgebra::Vector3<f64>`] while exposing the handful of operations the extractors need.

use std::ops::Sub;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Magnitudes at or below this are treated as zero length.
pub const NORMALIZE_EPSILON: f64 = 1e-9;

/// An immutable 3D position or displacement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3(pub Vector3<f64>);

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vector3::new(x, y, z))
    }

    pub fn zero() -> Self {
        Self(Vector3::zeros())
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    /// Euclidean norm.
    pub fn magnitude(&self) -> f64 {
        self.0.norm()
    }

    /// Unit vector in the same direction, or [`Vec3::zero`] for (near) zero-length input.
    pub fn normalized(&self) -> Vec3 {
        let m = self.magnitude();
        if m <= NORMALIZE_EPSILON {
            return Vec3::zero();
        }
        Vec3(self.0 / m)
    }

    /// Component-wise midpoint of two positions.
    pub fn midpoint(&self, other: &Vec3) -> Vec3 {
        Vec3((self.0 + other.0) / 2.0)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3(self.0 - rhs.0)
    }
}
