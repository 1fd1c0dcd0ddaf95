use std::fmt;

use bevy::prelude::*;
use constants::budget::{DEFAULT_POINT_BUDGET, MAX_POINT_BUDGET, MIN_POINT_BUDGET};
use constants::coordinate_system::AXIS_CORRECTION_X_RADIANS;
use constants::render_settings::{DEFAULT_CLIP_EXTENT, DEFAULT_POINT_SIZE};
use serde::{Deserialize, Serialize};

use super::catalog::DatasetKey;
use super::metadata::DatasetMetadata;

/// Maximum number of points a dataset may render, always within
/// `[MIN_POINT_BUDGET, MAX_POINT_BUDGET]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointBudget(u32);

impl PointBudget {
    pub const MIN: Self = Self(MIN_POINT_BUDGET);
    pub const MAX: Self = Self(MAX_POINT_BUDGET);

    /// Out-of-range input is clamped to the nearest bound, never rejected.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(MIN_POINT_BUDGET as i64, MAX_POINT_BUDGET as i64) as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn offset(self, delta: i64) -> Self {
        Self::clamped(self.0 as i64 + delta)
    }
}

impl Default for PointBudget {
    fn default() -> Self {
        Self(DEFAULT_POINT_BUDGET)
    }
}

impl fmt::Display for PointBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How the clip extent is applied when rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipMode {
    #[default]
    Disabled,
    ClipOutside,
    HighlightInside,
    ClipHorizontally,
    ClipVertically,
}

/// Per-dataset material parameters consumed by the point renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCloudMaterial {
    pub size: f32,
    pub clip_mode: ClipMode,
    /// Normalised screen extent `[min_x, min_y, max_x, max_y]`.
    pub clip_extent: [f32; 4],
}

impl Default for PointCloudMaterial {
    fn default() -> Self {
        Self {
            size: 0.05,
            clip_mode: ClipMode::Disabled,
            clip_extent: DEFAULT_CLIP_EXTENT,
        }
    }
}

/// A loaded dataset. Owned by the registry while installed; unloading moves
/// it into the loader's `dispose`.
#[derive(Debug)]
pub struct PointCloudDataset {
    key: DatasetKey,
    metadata: DatasetMetadata,
    pub transform: Transform,
    pub material: PointCloudMaterial,
    pub point_budget: PointBudget,
    entity: Option<Entity>,
}

impl PointCloudDataset {
    pub fn new(key: DatasetKey, metadata: DatasetMetadata) -> Self {
        Self {
            key,
            metadata,
            transform: Transform::IDENTITY,
            material: PointCloudMaterial::default(),
            point_budget: PointBudget::default(),
            entity: None,
        }
    }

    pub fn key(&self) -> &DatasetKey {
        &self.key
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    /// Scene entity this dataset is installed as, if any.
    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    pub(crate) fn attach(&mut self, entity: Entity) {
        self.entity = Some(entity);
    }

    pub(crate) fn detach(&mut self) -> Option<Entity> {
        self.entity.take()
    }

    /// Fixed configuration applied once a load succeeds: Z-up to Y-up axis
    /// correction, unit point size and a full-screen horizontal clip.
    pub fn apply_post_load_defaults(&mut self) {
        self.transform.rotate_x(AXIS_CORRECTION_X_RADIANS);
        self.material.size = DEFAULT_POINT_SIZE;
        self.material.clip_mode = ClipMode::ClipHorizontally;
        self.material.clip_extent = DEFAULT_CLIP_EXTENT;
    }

    /// Unit cube mapped onto the metadata bounds, in world space.
    ///
    /// Degenerate axes are given a tiny thickness so the transform stays invertible.
    pub fn world_box_transform(&self) -> Transform {
        let bounds = &self.metadata.bounds;
        let local = Transform::from_translation(bounds.center())
            .with_scale(bounds.size().max(Vec3::splat(1.0e-4)));
        self.transform.mul_transform(local)
    }
}
