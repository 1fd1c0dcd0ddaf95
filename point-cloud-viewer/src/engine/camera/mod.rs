//! Viewer camera: orbit navigation and the camera seams used by dataset
//! loading and picking.

/// Orbit camera component, controller system and the `CameraView` /
/// `CameraControls` traits implemented over Bevy's camera.
pub mod viewport_camera;
