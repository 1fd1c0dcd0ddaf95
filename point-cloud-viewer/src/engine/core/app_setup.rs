use std::sync::Arc;

use bevy::asset::AssetMetaCheck;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use constants::camera::{DEFAULT_CAMERA_FAR, DEFAULT_CAMERA_POSITION, DEFAULT_CAMERA_TARGET};

// Crate engine modules
use crate::engine::camera::viewport_camera::{OrbitCamera, ViewerCamera, camera_controller};
use crate::engine::core::config::ViewerConfig;
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::loader::{AssetDatasetLoader, DatasetAssetsPlugin, DatasetLoader};
use crate::engine::loading::systems::DatasetSessionPlugin;
use crate::engine::scene::gizmos::{draw_dataset_bounds, spawn_pick_marker};
// Crate tools modules
use crate::tools::dataset_controls::DatasetControlsPlugin;
use crate::tools::pick_indicator::PickIndicatorPlugin;
// Web RPC
use crate::rpc::web_rpc::WebRpcPlugin;

#[cfg(not(target_arch = "wasm32"))]
use crate::tools::control_panel::ControlPanelPlugin;

pub fn create_app(config: &ViewerConfig) -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins(&config.log_filter))
        .add_plugins(DatasetAssetsPlugin);

    let loader: Arc<dyn DatasetLoader> =
        Arc::new(AssetDatasetLoader::from_world(app.world(), config.data_root.clone()));

    app.add_plugins(DatasetControlsPlugin)
        .add_plugins(DatasetSessionPlugin {
            catalog: config.catalog(),
            loader,
        })
        .add_plugins(PickIndicatorPlugin)
        .add_plugins(WebRpcPlugin);

    // Native dataset panel; the web build is driven over RPC
    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_plugins(ControlPanelPlugin);
    }

    app.add_systems(Startup, (setup, spawn_pick_marker))
        .add_systems(Update, (camera_controller, draw_dataset_bounds));

    app
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

fn spawn_viewer_camera(commands: &mut Commands) {
    let position = Vec3::from_array(DEFAULT_CAMERA_POSITION);
    let target = Vec3::from_array(DEFAULT_CAMERA_TARGET);
    commands.spawn((
        Name::new("Viewer camera"),
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            far: DEFAULT_CAMERA_FAR,
            ..default()
        }),
        Transform::from_translation(position).looking_at(target, Vec3::Y),
        OrbitCamera::from_position(position, target),
        ViewerCamera,
    ));
}

// Startup system that only handles basic initialisation
fn setup(mut commands: Commands) {
    spawn_lighting(&mut commands);
    spawn_viewer_camera(&mut commands);

    #[cfg(not(target_arch = "wasm32"))]
    {
        create_native_overlays(&mut commands);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn create_native_overlays(commands: &mut Commands) {
    commands.spawn((
        Text::new("1-9: load   Shift+1-9: unload   RMB: orbit   MMB: pan   Wheel: zoom"),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgb(0.8, 0.8, 0.8)),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
    ));
}

fn create_default_plugins(log_filter: &str) -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        filter: log_filter.to_string(),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}
