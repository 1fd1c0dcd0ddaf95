/// Rotation about X applied to every loaded dataset. Source clouds are
/// Z-up, the viewer is Y-up (Z becomes Y, -Y becomes Z).
pub const AXIS_CORRECTION_X_RADIANS: f32 = -std::f32::consts::FRAC_PI_2;
