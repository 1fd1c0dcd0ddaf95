use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// 3D spatial bounds of a dataset in its own (pre-correction) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsData {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl BoundsData {
    pub fn from_corners(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            min_x: min[0].min(max[0]),
            max_x: min[0].max(max[0]),
            min_y: min[1].min(max[1]),
            max_y: min[1].max(max[1]),
            min_z: min[2].min(max[2]),
            max_z: min[2].max(max[2]),
        }
    }

    /// Calculate center point for box gizmos and picking volumes.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            ((self.max_x + self.min_x) * 0.5) as f32,
            ((self.max_y + self.min_y) * 0.5) as f32,
            ((self.max_z + self.min_z) * 0.5) as f32,
        )
    }

    /// Calculate size dimensions along each axis.
    pub fn size(&self) -> Vec3 {
        Vec3::new(
            (self.max_x - self.min_x) as f32,
            (self.max_y - self.min_y) as f32,
            (self.max_z - self.min_z) as f32,
        )
    }
}
