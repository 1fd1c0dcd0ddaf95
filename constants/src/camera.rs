/// Far plane the camera is reset to after a dataset finishes loading.
pub const DEFAULT_CAMERA_FAR: f32 = 1000.0;

/// Camera position applied after a dataset finishes loading.
pub const DEFAULT_CAMERA_POSITION: [f32; 3] = [0.0, 0.0, 10.0];

/// Point the camera looks at after a dataset finishes loading.
pub const DEFAULT_CAMERA_TARGET: [f32; 3] = [0.0, 0.0, 0.0];

/// Orbit radius limits for the navigation controller.
pub const MIN_ORBIT_RADIUS: f32 = 0.5;
pub const MAX_ORBIT_RADIUS: f32 = 5000.0;

/// Pitch is kept short of the poles so `looking_at` stays well defined.
pub const MAX_ORBIT_PITCH: f32 = 1.5;
