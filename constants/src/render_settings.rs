/// Radius of the pick marker sphere mesh before scaling.
pub const MARKER_SPHERE_RADIUS: f32 = 0.01;

/// Marker scale per unit of camera distance; keeps its on-screen size roughly constant.
pub const MARKER_SCALE_COEFFICIENT: f32 = 0.5;

/// Marker colour (sRGB).
pub const MARKER_COLOUR: [f32; 3] = [1.0, 0.0, 0.0];

/// Point size written into a dataset's material after loading.
pub const DEFAULT_POINT_SIZE: f32 = 1.0;

/// Clip extent written into a dataset's material after loading: [min_x, min_y, max_x, max_y].
pub const DEFAULT_CLIP_EXTENT: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

/// Colour of the bounding box outline drawn around installed datasets (sRGB).
pub const DATASET_BOUNDS_COLOUR: [f32; 3] = [0.2, 0.8, 1.0];
