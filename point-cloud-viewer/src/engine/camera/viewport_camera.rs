use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use constants::camera::{
    DEFAULT_CAMERA_POSITION, DEFAULT_CAMERA_TARGET, MAX_ORBIT_PITCH, MAX_ORBIT_RADIUS,
    MIN_ORBIT_RADIUS,
};

/// Marks the camera that datasets reset and picking rays come from.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct ViewerCamera;

/// Orbit parameters around a focus point. The transform is derived from these.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub focus: Vec3,
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl OrbitCamera {
    pub fn from_position(position: Vec3, focus: Vec3) -> Self {
        let offset = position - focus;
        let radius = offset.length().clamp(MIN_ORBIT_RADIUS, MAX_ORBIT_RADIUS);
        let (yaw, pitch) = if offset.length_squared() > f32::EPSILON {
            let dir = offset.normalize();
            (dir.x.atan2(dir.z), dir.y.clamp(-1.0, 1.0).asin())
        } else {
            (0.0, 0.0)
        };
        Self {
            focus,
            radius,
            yaw,
            pitch: pitch.clamp(-MAX_ORBIT_PITCH, MAX_ORBIT_PITCH),
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.focus
            + self.radius * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn apply_to_transform(&self, transform: &mut Transform) {
        *transform = Transform::from_translation(self.position()).looking_at(self.focus, Vec3::Y);
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_position(
            Vec3::from_array(DEFAULT_CAMERA_POSITION),
            Vec3::from_array(DEFAULT_CAMERA_TARGET),
        )
    }
}

/// Read-only view of the camera used for picking.
pub trait CameraView {
    fn position(&self) -> Vec3;

    /// World-space ray through a point in normalised device coordinates.
    fn ray_through(&self, ndc: Vec2) -> Option<Ray3d>;
}

/// Camera operations applied after a dataset finishes loading.
pub trait CameraControls {
    fn set_far(&mut self, far: f32);
    fn set_position(&mut self, position: Vec3);
    fn look_at(&mut self, target: Vec3);
    fn update_projection(&mut self);
}

/// Ray from the camera through `ndc` (`[-1, 1]`, Y up).
pub fn camera_ray(transform: &Transform, projection: &Projection, ndc: Vec2) -> Option<Ray3d> {
    match projection {
        Projection::Perspective(perspective) => {
            let half_height = (perspective.fov * 0.5).tan();
            let half_width = half_height * perspective.aspect_ratio;
            let local = Vec3::new(ndc.x * half_width, ndc.y * half_height, -1.0);
            let direction = Dir3::new(transform.rotation * local).ok()?;
            Some(Ray3d::new(transform.translation, direction))
        }
        Projection::Orthographic(orthographic) => {
            let area = orthographic.area;
            let uv = (ndc + Vec2::ONE) * 0.5;
            let local = area.min + (area.max - area.min) * uv;
            let origin = transform.translation
                + transform.rotation * Vec3::new(local.x, local.y, 0.0);
            Some(Ray3d::new(origin, transform.forward()))
        }
        _ => None,
    }
}

/// Borrowed camera state for pick queries.
pub struct CameraSnapshot<'a> {
    pub transform: &'a Transform,
    pub projection: &'a Projection,
}

impl CameraView for CameraSnapshot<'_> {
    fn position(&self) -> Vec3 {
        self.transform.translation
    }

    fn ray_through(&self, ndc: Vec2) -> Option<Ray3d> {
        camera_ray(self.transform, self.projection, ndc)
    }
}

/// Mutable camera entity handed to the load completion system.
pub struct CameraRig<'a> {
    pub transform: Mut<'a, Transform>,
    pub projection: Mut<'a, Projection>,
    pub orbit: Mut<'a, OrbitCamera>,
}

impl CameraControls for CameraRig<'_> {
    fn set_far(&mut self, far: f32) {
        match &mut *self.projection {
            Projection::Perspective(perspective) => perspective.far = far,
            Projection::Orthographic(orthographic) => orthographic.far = far,
            _ => {}
        }
    }

    fn set_position(&mut self, position: Vec3) {
        self.transform.translation = position;
    }

    fn look_at(&mut self, target: Vec3) {
        self.transform.look_at(target, Vec3::Y);
        *self.orbit = OrbitCamera::from_position(self.transform.translation, target);
    }

    fn update_projection(&mut self) {
        self.projection.set_changed();
    }
}

/// Right-drag orbits, middle-drag pans, the wheel zooms.
pub fn camera_controller(
    mut camera_query: Query<(&mut Transform, &mut OrbitCamera), With<ViewerCamera>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();

    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }

    let Ok((mut transform, mut orbit)) = camera_query.single_mut() else {
        return;
    };

    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        let yaw_sens = 0.0035;
        let pitch_sens = 0.0030;
        orbit.yaw -= mouse_delta.x * yaw_sens;
        orbit.pitch = (orbit.pitch + mouse_delta.y * pitch_sens)
            .clamp(-MAX_ORBIT_PITCH, MAX_ORBIT_PITCH);
    }

    if mouse_button.pressed(MouseButton::Middle) && mouse_delta != Vec2::ZERO {
        let pan_speed = orbit.radius * 0.002;
        let right = transform.right();
        let up = transform.up();
        orbit.focus += (-mouse_delta.x * *right + mouse_delta.y * *up) * pan_speed;
    }

    if scroll_accum.abs() > f32::EPSILON {
        let zoom = if scroll_accum > 0.0 { 0.9 } else { 1.1 };
        orbit.radius = (orbit.radius * zoom).clamp(MIN_ORBIT_RADIUS, MAX_ORBIT_RADIUS);
    }

    if orbit.is_changed() {
        orbit.apply_to_transform(&mut transform);
    }
}
