use bevy::prelude::*;
use constants::render_settings::MARKER_SCALE_COEFFICIENT;

use super::pick_query::{ActivePickQuery, BoundsPickQuery, PickPoint, PickQuery};
use crate::engine::assets::dataset::PointCloudDataset;
use crate::engine::camera::viewport_camera::{CameraSnapshot, CameraView, ViewerCamera};
use crate::engine::loading::registry::DatasetRegistry;
use crate::engine::loading::systems::poll_dataset_loads;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkerState {
    #[default]
    Hidden,
    Shown,
}

/// The sphere that follows the cursor over loaded datasets.
#[derive(Component, Debug, Default)]
pub struct PickMarker {
    pub state: MarkerState,
}

/// What a pointer move does to the marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickOutcome {
    Unchanged,
    Hide,
    Show { position: Vec3, scale: f32 },
}

impl PickOutcome {
    pub fn apply(self, marker: &mut PickMarker, transform: &mut Transform, visibility: &mut Visibility) {
        match self {
            Self::Unchanged => {}
            Self::Hide => {
                marker.state = MarkerState::Hidden;
                *visibility = Visibility::Hidden;
            }
            Self::Show { position, scale } => {
                marker.state = MarkerState::Shown;
                transform.translation = position;
                transform.scale = Vec3::splat(scale);
                *visibility = Visibility::Visible;
            }
        }
    }
}

/// Window pixel position to `[-1, 1]` with Y pointing up. `None` for an empty viewport.
pub fn normalized_device_coords(screen: Vec2, viewport: Vec2) -> Option<Vec2> {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        screen.x / viewport.x * 2.0 - 1.0,
        -(screen.y / viewport.y) * 2.0 + 1.0,
    ))
}

/// Decide the marker update for one pointer move.
///
/// The pick query is skipped entirely when no dataset is installed.
pub fn resolve_pointer_move(
    screen: Vec2,
    viewport: Vec2,
    camera: &dyn CameraView,
    datasets: &[&PointCloudDataset],
    query: &dyn PickQuery,
) -> PickOutcome {
    let Some(ndc) = normalized_device_coords(screen, viewport) else {
        return PickOutcome::Unchanged;
    };
    let Some(ray) = camera.ray_through(ndc) else {
        return PickOutcome::Unchanged;
    };
    if datasets.is_empty() {
        return PickOutcome::Hide;
    }

    match query.pick(datasets, camera, ray) {
        None => PickOutcome::Hide,
        Some(PickPoint { position: None, .. }) => PickOutcome::Unchanged,
        Some(PickPoint {
            position: Some(position),
            ..
        }) => PickOutcome::Show {
            position,
            scale: MARKER_SCALE_COEFFICIENT * camera.position().distance(position),
        },
    }
}

pub fn update_pick_marker(
    mut cursor_moved: EventReader<CursorMoved>,
    windows: Query<&Window>,
    camera_query: Query<(&Transform, &Projection), With<ViewerCamera>>,
    mut marker_query: Query<
        (&mut PickMarker, &mut Transform, &mut Visibility),
        Without<ViewerCamera>,
    >,
    registry: Res<DatasetRegistry>,
    pick_query: Res<ActivePickQuery>,
) {
    let Ok((camera_transform, projection)) = camera_query.single() else {
        return;
    };
    let Ok((mut marker, mut marker_transform, mut visibility)) = marker_query.single_mut() else {
        return;
    };
    let camera = CameraSnapshot {
        transform: camera_transform,
        projection,
    };
    let datasets: Vec<&PointCloudDataset> = registry.installed().collect();

    // Last dataset gone: nothing left under the cursor, even if it has not moved.
    if registry.is_changed() && datasets.is_empty() {
        PickOutcome::Hide.apply(&mut marker, &mut marker_transform, &mut visibility);
    }

    for event in cursor_moved.read() {
        let Ok(window) = windows.get(event.window) else {
            continue;
        };
        let viewport = Vec2::new(window.width(), window.height());
        resolve_pointer_move(
            event.position,
            viewport,
            &camera,
            &datasets,
            pick_query.0.as_ref(),
        )
        .apply(&mut marker, &mut marker_transform, &mut visibility);
    }
}

pub struct PickIndicatorPlugin;

impl Plugin for PickIndicatorPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<ActivePickQuery>() {
            app.insert_resource(ActivePickQuery(Box::new(BoundsPickQuery)));
        }
        app.add_systems(Update, update_pick_marker.after(poll_dataset_loads));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::engine::assets::dataset::test_support::dataset;
    use bevy::window::WindowResolution;

    struct FixedCamera;

    impl CameraView for FixedCamera {
        fn position(&self) -> Vec3 {
            Vec3::new(0.0, 0.0, 10.0)
        }

        fn ray_through(&self, _ndc: Vec2) -> Option<Ray3d> {
            Some(Ray3d::new(self.position(), Dir3::NEG_Z))
        }
    }

    struct StubQuery {
        result: Option<PickPoint>,
        calls: AtomicUsize,
    }

    impl StubQuery {
        fn returning(result: Option<PickPoint>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PickQuery for StubQuery {
        fn pick(&self, _: &[&PointCloudDataset], _: &dyn CameraView, _: Ray3d) -> Option<PickPoint> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    const SCREEN: Vec2 = Vec2::new(400.0, 300.0);
    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn ndc_inverts_y() {
        assert_eq!(normalized_device_coords(Vec2::ZERO, VIEWPORT), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(normalized_device_coords(SCREEN, VIEWPORT), Some(Vec2::ZERO));
        assert_eq!(normalized_device_coords(VIEWPORT, VIEWPORT), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(normalized_device_coords(SCREEN, Vec2::new(0.0, 600.0)), None);
    }

    #[test]
    fn no_datasets_hides_without_querying() {
        let query = StubQuery::returning(None);
        let outcome = resolve_pointer_move(SCREEN, VIEWPORT, &FixedCamera, &[], &query);

        assert_eq!(outcome, PickOutcome::Hide);
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn hit_scales_with_camera_distance() {
        let loaded = dataset("v1");
        let point = Vec3::new(0.0, 0.0, 4.0);
        let query = StubQuery::returning(Some(PickPoint {
            position: Some(point),
            dataset: "v1".into(),
        }));

        let outcome = resolve_pointer_move(SCREEN, VIEWPORT, &FixedCamera, &[&loaded], &query);
        assert_eq!(
            outcome,
            PickOutcome::Show {
                position: point,
                scale: 3.0
            }
        );
        assert_eq!(query.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn miss_hides_and_positionless_hit_is_ignored() {
        let loaded = dataset("v1");
        let miss = StubQuery::returning(None);
        assert_eq!(
            resolve_pointer_move(SCREEN, VIEWPORT, &FixedCamera, &[&loaded], &miss),
            PickOutcome::Hide
        );

        let vague = StubQuery::returning(Some(PickPoint {
            position: None,
            dataset: "v1".into(),
        }));
        assert_eq!(
            resolve_pointer_move(SCREEN, VIEWPORT, &FixedCamera, &[&loaded], &vague),
            PickOutcome::Unchanged
        );
    }

    #[test]
    fn marker_state_follows_outcomes() {
        let mut marker = PickMarker::default();
        let mut transform = Transform::default();
        let mut visibility = Visibility::Hidden;
        assert_eq!(marker.state, MarkerState::Hidden);

        PickOutcome::Show {
            position: Vec3::X,
            scale: 2.0,
        }
        .apply(&mut marker, &mut transform, &mut visibility);
        assert_eq!(marker.state, MarkerState::Shown);
        assert_eq!(transform.translation, Vec3::X);
        assert_eq!(transform.scale, Vec3::splat(2.0));
        assert_eq!(visibility, Visibility::Visible);

        PickOutcome::Unchanged.apply(&mut marker, &mut transform, &mut visibility);
        assert_eq!(marker.state, MarkerState::Shown);

        PickOutcome::Hide.apply(&mut marker, &mut transform, &mut visibility);
        assert_eq!(marker.state, MarkerState::Hidden);
        assert_eq!(visibility, Visibility::Hidden);
    }

    fn marker_app(registry: DatasetRegistry) -> (App, Entity, Entity) {
        let mut app = App::new();
        app.add_event::<CursorMoved>()
            .insert_resource(registry)
            .insert_resource(ActivePickQuery(Box::new(BoundsPickQuery)))
            .add_systems(Update, update_pick_marker);

        let window = app
            .world_mut()
            .spawn(Window {
                resolution: WindowResolution::new(800.0, 600.0),
                ..default()
            })
            .id();
        app.world_mut().spawn((
            ViewerCamera,
            Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
            Projection::default(),
        ));
        let marker = app
            .world_mut()
            .spawn((PickMarker::default(), Transform::default(), Visibility::Hidden))
            .id();
        (app, window, marker)
    }

    #[test]
    fn cursor_over_dataset_shows_marker() {
        let mut registry = DatasetRegistry::default();
        registry.set(&"v1".into(), dataset("v1"));
        let (mut app, window, marker) = marker_app(registry);

        app.world_mut().send_event(CursorMoved {
            window,
            position: SCREEN,
            delta: None,
        });
        app.update();

        let world = app.world();
        assert_eq!(world.get::<PickMarker>(marker).unwrap().state, MarkerState::Shown);
        assert_eq!(*world.get::<Visibility>(marker).unwrap(), Visibility::Visible);
        let transform = world.get::<Transform>(marker).unwrap();
        assert!(transform.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-4));
        assert!((transform.scale.x - 4.5).abs() < 1e-4);
    }

    #[test]
    fn unloading_last_dataset_hides_marker_without_cursor_move() {
        let mut registry = DatasetRegistry::default();
        registry.set(&"v1".into(), dataset("v1"));
        let (mut app, window, marker) = marker_app(registry);

        app.world_mut().send_event(CursorMoved {
            window,
            position: SCREEN,
            delta: None,
        });
        app.update();
        assert_eq!(app.world().get::<PickMarker>(marker).unwrap().state, MarkerState::Shown);

        app.update();
        assert_eq!(app.world().get::<PickMarker>(marker).unwrap().state, MarkerState::Shown);

        app.world_mut()
            .resource_mut::<DatasetRegistry>()
            .clear(&"v1".into());
        app.update();

        let world = app.world();
        assert_eq!(world.get::<PickMarker>(marker).unwrap().state, MarkerState::Hidden);
        assert_eq!(*world.get::<Visibility>(marker).unwrap(), Visibility::Hidden);
    }
}
