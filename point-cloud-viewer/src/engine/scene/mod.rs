//! Scene integration for loaded datasets.
//!
//! Spawns dataset entities, the pick marker and bounding box gizmos.

/// Pick marker spawning and dataset bounds outlines.
pub mod gizmos;

/// `SceneHost` seam and its `Commands`-backed implementation.
///
/// Installs datasets as `PointCloudInstance` entities and despawns them on unload.
pub mod scene_host;
