use bevy::prelude::*;
use constants::render_settings::{DATASET_BOUNDS_COLOUR, MARKER_COLOUR, MARKER_SPHERE_RADIUS};

use crate::engine::loading::registry::DatasetRegistry;
use crate::tools::pick_indicator::PickMarker;

/// Spawn the hidden pick marker sphere.
pub fn spawn_pick_marker(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let [r, g, b] = MARKER_COLOUR;
    commands.spawn((
        Name::new("Pick marker"),
        Mesh3d(meshes.add(Sphere::new(MARKER_SPHERE_RADIUS))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(r, g, b),
            unlit: true,
            ..default()
        })),
        Transform::default(),
        Visibility::Hidden,
        PickMarker::default(),
    ));
}

/// Outline every installed dataset's oriented bounding box.
pub fn draw_dataset_bounds(mut gizmos: Gizmos, registry: Res<DatasetRegistry>) {
    let [r, g, b] = DATASET_BOUNDS_COLOUR;
    for dataset in registry.installed() {
        gizmos.cuboid(dataset.world_box_transform(), Color::srgb(r, g, b));
    }
}
