use std::sync::Arc;

use bevy::prelude::*;

use super::budget::set_budget;
use super::lifecycle::{DatasetLifecycle, LoadRequest, LoadSettlement, UnloadRequest};
use super::loader::{ActiveLoader, DatasetLoader, LoadError};
use super::registry::DatasetRegistry;
use crate::engine::assets::catalog::{DatasetCatalog, DatasetKey};
use crate::engine::assets::dataset::PointBudget;
use crate::engine::camera::viewport_camera::{CameraControls, CameraRig, OrbitCamera, ViewerCamera};
use crate::engine::scene::scene_host::CommandsSceneHost;
use crate::tools::dataset_controls::{DatasetAction, DatasetCommand};

/// Outcome notifications for the control panel and RPC bridge.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum DatasetStatus {
    Loading { key: DatasetKey },
    Loaded { key: DatasetKey, point_count: u64 },
    Unloaded { key: DatasetKey },
    LoadFailed { key: DatasetKey, reason: String },
    BudgetChanged { key: DatasetKey, budget: PointBudget },
}

impl DatasetStatus {
    pub fn key(&self) -> &DatasetKey {
        match self {
            Self::Loading { key }
            | Self::Loaded { key, .. }
            | Self::Unloaded { key }
            | Self::LoadFailed { key, .. }
            | Self::BudgetChanged { key, .. } => key,
        }
    }
}

pub fn handle_dataset_commands(
    mut events: EventReader<DatasetCommand>,
    catalog: Res<DatasetCatalog>,
    loader: Res<ActiveLoader>,
    mut registry: ResMut<DatasetRegistry>,
    mut lifecycle: ResMut<DatasetLifecycle>,
    mut status: EventWriter<DatasetStatus>,
    mut commands: Commands,
) {
    for event in events.read() {
        let key = event.action.key();
        let Some(source) = catalog.source(key) else {
            warn!("Ignoring {:?} command for unknown dataset {}", event.source, key);
            if let DatasetAction::Load { .. } = event.action {
                status.write(DatasetStatus::LoadFailed {
                    key: key.clone(),
                    reason: LoadError::UnknownDataset(key.clone()).to_string(),
                });
            }
            continue;
        };

        match &event.action {
            DatasetAction::Load { key } => {
                match lifecycle.request_load(&mut registry, loader.0.as_ref(), key, source) {
                    LoadRequest::Started => {
                        info!("Loading dataset {} via {:?}", key, event.source);
                        status.write(DatasetStatus::Loading { key: key.clone() });
                    }
                    LoadRequest::CancelWithdrawn => {
                        info!("Pending unload of {} withdrawn, load continues", key);
                        status.write(DatasetStatus::Loading { key: key.clone() });
                    }
                    ignored => debug!("Load of {} ignored: {:?}", key, ignored),
                }
            }
            DatasetAction::Unload { key } => {
                let mut scene = CommandsSceneHost {
                    commands: &mut commands,
                };
                match lifecycle.request_unload(&mut registry, loader.0.as_ref(), &mut scene, key) {
                    UnloadRequest::Unloaded => {
                        info!("Unloaded dataset {} via {:?}", key, event.source);
                        status.write(DatasetStatus::Unloaded { key: key.clone() });
                    }
                    UnloadRequest::CancelPending => {
                        info!("Dataset {} still loading, result will be discarded", key);
                    }
                    UnloadRequest::NotLoaded => debug!("Unload of {} ignored: not loaded", key),
                }
            }
            DatasetAction::SetBudget { key, value } => match set_budget(&mut registry, key, *value) {
                Some(budget) => {
                    info!("Point budget of {} set to {}", key, budget);
                    status.write(DatasetStatus::BudgetChanged {
                        key: key.clone(),
                        budget,
                    });
                }
                None => debug!("Budget change for {} ignored: not loaded", key),
            },
        }
    }
}

/// Poll in-flight loads once per frame and install, discard or report them.
pub fn poll_dataset_loads(
    loader: Res<ActiveLoader>,
    mut registry: ResMut<DatasetRegistry>,
    mut lifecycle: ResMut<DatasetLifecycle>,
    mut camera_query: Query<
        (&mut Transform, &mut Projection, &mut OrbitCamera),
        With<ViewerCamera>,
    >,
    mut status: EventWriter<DatasetStatus>,
    mut commands: Commands,
) {
    if lifecycle.is_idle() {
        return;
    }

    let mut rig = camera_query
        .single_mut()
        .ok()
        .map(|(transform, projection, orbit)| CameraRig {
            transform,
            projection,
            orbit,
        });
    let mut scene = CommandsSceneHost {
        commands: &mut commands,
    };
    let settled = lifecycle.poll_pending(
        &mut registry,
        loader.0.as_ref(),
        &mut scene,
        rig.as_mut().map(|rig| rig as &mut dyn CameraControls),
    );

    for settlement in settled {
        match settlement {
            LoadSettlement::Installed(key) => {
                let point_count = registry
                    .get(&key)
                    .map_or(0, |dataset| dataset.metadata().point_count);
                info!("✓ Dataset {} loaded ({} points)", key, point_count);
                status.write(DatasetStatus::Loaded { key, point_count });
            }
            LoadSettlement::Discarded(key) => {
                info!("Dataset {} discarded: unloaded while loading", key);
                status.write(DatasetStatus::Unloaded { key });
            }
            LoadSettlement::Failed(key, error) => {
                error!("Failed to load dataset {}: {}", key, error);
                status.write(DatasetStatus::LoadFailed {
                    key,
                    reason: error.to_string(),
                });
            }
        }
    }
}

/// Dataset registry, lifecycle and the systems that drive them.
pub struct DatasetSessionPlugin {
    pub catalog: DatasetCatalog,
    pub loader: Arc<dyn DatasetLoader>,
}

impl Plugin for DatasetSessionPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DatasetRegistry::with_keys(self.catalog.keys()))
            .insert_resource(self.catalog.clone())
            .insert_resource(ActiveLoader(self.loader.clone()))
            .init_resource::<DatasetLifecycle>()
            .add_event::<DatasetCommand>()
            .add_event::<DatasetStatus>()
            .add_systems(
                Update,
                (handle_dataset_commands, poll_dataset_loads).chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;
    use std::sync::Mutex;

    use super::*;
    use crate::engine::assets::catalog::SourceDescriptor;
    use crate::engine::assets::dataset::PointCloudDataset;
    use crate::engine::assets::dataset::test_support::dataset;
    use crate::engine::loading::lifecycle::test_support::GatedLoader;
    use crate::engine::loading::loader::LoadFuture;
    use crate::engine::loading::registry::SlotState;
    use crate::engine::scene::scene_host::PointCloudInstance;
    use crate::tools::dataset_controls::CommandSource;

    #[derive(Default)]
    struct ImmediateLoader {
        disposed: Mutex<Vec<DatasetKey>>,
    }

    impl DatasetLoader for ImmediateLoader {
        fn load(&self, key: &DatasetKey, _source: &SourceDescriptor) -> LoadFuture {
            Box::pin(ready(Ok(dataset(key.as_str()))))
        }

        fn dispose(&self, dataset: PointCloudDataset) {
            self.disposed.lock().unwrap().push(dataset.key().clone());
        }
    }

    fn app(loader: Arc<dyn DatasetLoader>) -> App {
        let mut app = App::new();
        app.add_plugins(DatasetSessionPlugin {
            catalog: DatasetCatalog::builtin(),
            loader,
        });
        app.world_mut().spawn((
            ViewerCamera,
            OrbitCamera::from_position(Vec3::new(3.0, 3.0, 3.0), Vec3::ONE),
            Transform::from_xyz(3.0, 3.0, 3.0),
            Projection::default(),
        ));
        app
    }

    fn send(app: &mut App, command: DatasetCommand) {
        app.world_mut().send_event(command);
    }

    fn statuses(app: &mut App) -> Vec<DatasetStatus> {
        app.world_mut()
            .resource_mut::<Events<DatasetStatus>>()
            .drain()
            .collect()
    }

    fn instances(app: &mut App) -> usize {
        app.world_mut()
            .query::<&PointCloudInstance>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn load_installs_dataset_and_resets_camera() {
        let mut app = app(Arc::new(ImmediateLoader::default()));
        send(&mut app, DatasetCommand::load("v1".into(), CommandSource::Panel));
        app.update();

        let registry = app.world().resource::<DatasetRegistry>();
        assert_eq!(registry.state(&"v1".into()), SlotState::Loaded);
        assert_eq!(instances(&mut app), 1);

        let mut camera = app
            .world_mut()
            .query_filtered::<(&Transform, &Projection), With<ViewerCamera>>();
        let (transform, projection) = camera.single(app.world()).unwrap();
        assert!(transform.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 10.0), 1e-5));
        assert!(transform.forward().abs_diff_eq(Vec3::NEG_Z, 1e-5));
        match projection {
            Projection::Perspective(perspective) => assert_eq!(perspective.far, 1000.0),
            other => panic!("unexpected projection {other:?}"),
        }

        assert_eq!(
            statuses(&mut app),
            vec![
                DatasetStatus::Loading { key: "v1".into() },
                DatasetStatus::Loaded {
                    key: "v1".into(),
                    point_count: 1000
                },
            ]
        );
    }

    #[test]
    fn unload_despawns_and_disposes_once() {
        let loader = Arc::new(ImmediateLoader::default());
        let mut app = app(loader.clone());
        send(&mut app, DatasetCommand::load("v2".into(), CommandSource::Rpc));
        app.update();
        send(&mut app, DatasetCommand::unload("v2".into(), CommandSource::Rpc));
        send(&mut app, DatasetCommand::unload("v2".into(), CommandSource::Rpc));
        app.update();

        assert!(!app.world().resource::<DatasetRegistry>().is_loaded(&"v2".into()));
        assert_eq!(instances(&mut app), 0);
        assert_eq!(loader.disposed.lock().unwrap().len(), 1);
    }

    #[test]
    fn unload_during_load_never_reaches_the_scene() {
        let loader = Arc::new(GatedLoader::default());
        let mut app = app(loader.clone());
        send(&mut app, DatasetCommand::load("v1".into(), CommandSource::Keyboard));
        send(&mut app, DatasetCommand::load("v1".into(), CommandSource::Keyboard));
        app.update();
        send(&mut app, DatasetCommand::unload("v1".into(), CommandSource::Keyboard));
        app.update();
        assert_eq!(loader.load_count(), 1);

        loader.succeed("v1");
        app.update();

        let registry = app.world().resource::<DatasetRegistry>();
        assert_eq!(registry.state(&"v1".into()), SlotState::Unloaded);
        assert_eq!(loader.dispose_count(), 1);
        assert_eq!(instances(&mut app), 0);
        assert!(statuses(&mut app).contains(&DatasetStatus::Unloaded { key: "v1".into() }));
    }

    #[test]
    fn failure_is_reported_and_reverted() {
        let loader = Arc::new(GatedLoader::default());
        let mut app = app(loader.clone());
        send(&mut app, DatasetCommand::load("v2".into(), CommandSource::Panel));
        app.update();
        loader.fail("v2");
        app.update();

        assert!(!app.world().resource::<DatasetRegistry>().is_loaded(&"v2".into()));
        let failed = statuses(&mut app)
            .into_iter()
            .any(|status| matches!(status, DatasetStatus::LoadFailed { key, .. } if key.as_str() == "v2"));
        assert!(failed);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut app = app(Arc::new(ImmediateLoader::default()));
        send(&mut app, DatasetCommand::load("v9".into(), CommandSource::Rpc));
        app.update();

        assert_eq!(
            statuses(&mut app),
            vec![DatasetStatus::LoadFailed {
                key: "v9".into(),
                reason: "unknown dataset `v9`".to_string(),
            }]
        );
    }

    #[test]
    fn budget_command_updates_installed_dataset() {
        let mut app = app(Arc::new(ImmediateLoader::default()));
        send(&mut app, DatasetCommand::set_budget("v1".into(), 1, CommandSource::Panel));
        app.update();
        assert!(statuses(&mut app).is_empty());

        send(&mut app, DatasetCommand::load("v1".into(), CommandSource::Panel));
        app.update();
        send(&mut app, DatasetCommand::set_budget("v1".into(), 1, CommandSource::Panel));
        app.update();

        let registry = app.world().resource::<DatasetRegistry>();
        assert_eq!(
            registry.get(&"v1".into()).unwrap().point_budget,
            PointBudget::MIN
        );
    }
}
