//! Shared constants for the point cloud viewer workspace.

pub mod budget;
pub mod camera;
pub mod coordinate_system;
pub mod path;
pub mod render_settings;
