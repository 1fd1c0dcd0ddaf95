use std::collections::HashMap;

use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future};
use constants::camera::{DEFAULT_CAMERA_FAR, DEFAULT_CAMERA_POSITION, DEFAULT_CAMERA_TARGET};

use super::loader::{DatasetLoader, LoadError, LoadFuture, LoadResult};
use super::registry::{DatasetRegistry, SlotState};
use crate::engine::assets::catalog::{DatasetKey, SourceDescriptor};
use crate::engine::camera::viewport_camera::CameraControls;
use crate::engine::scene::scene_host::SceneHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    Started,
    AlreadyLoaded,
    AlreadyLoading,
    /// An unload was pending for the in-flight load and has been withdrawn.
    CancelWithdrawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadRequest {
    NotLoaded,
    Unloaded,
    /// The load is still in flight; its result will be disposed on arrival.
    CancelPending,
}

#[derive(Debug)]
pub enum LoadSettlement {
    Installed(DatasetKey),
    Discarded(DatasetKey),
    Failed(DatasetKey, LoadError),
}

impl LoadSettlement {
    pub fn key(&self) -> &DatasetKey {
        match self {
            Self::Installed(key) | Self::Discarded(key) | Self::Failed(key, _) => key,
        }
    }
}

/// Drives dataset loads and unloads against the registry.
///
/// At most one future per key is held. A load settles through
/// [`DatasetLifecycle::poll_pending`]; an unload that arrives while the load
/// is in flight only marks the slot, and the completion disposes the result
/// without installing it.
#[derive(Resource, Default)]
pub struct DatasetLifecycle {
    pending: HashMap<DatasetKey, LoadFuture>,
}

impl DatasetLifecycle {
    pub fn request_load(
        &mut self,
        registry: &mut DatasetRegistry,
        loader: &dyn DatasetLoader,
        key: &DatasetKey,
        source: &SourceDescriptor,
    ) -> LoadRequest {
        match registry.state(key) {
            SlotState::Loaded => LoadRequest::AlreadyLoaded,
            SlotState::Loading => LoadRequest::AlreadyLoading,
            SlotState::CancelPending => {
                registry.withdraw_cancel(key);
                LoadRequest::CancelWithdrawn
            }
            SlotState::Unloaded => {
                if !registry.begin_loading(key) {
                    return LoadRequest::AlreadyLoading;
                }
                self.pending.insert(key.clone(), loader.load(key, source));
                LoadRequest::Started
            }
        }
    }

    pub fn request_unload(
        &mut self,
        registry: &mut DatasetRegistry,
        loader: &dyn DatasetLoader,
        scene: &mut dyn SceneHost,
        key: &DatasetKey,
    ) -> UnloadRequest {
        match registry.state(key) {
            SlotState::Unloaded => UnloadRequest::NotLoaded,
            SlotState::Loading | SlotState::CancelPending => {
                registry.request_cancel(key);
                UnloadRequest::CancelPending
            }
            SlotState::Loaded => {
                if let Some(mut dataset) = registry.clear(key) {
                    scene.remove(&mut dataset);
                    loader.dispose(dataset);
                }
                UnloadRequest::Unloaded
            }
        }
    }

    /// Poll every in-flight load once and settle the ones that finished.
    pub fn poll_pending(
        &mut self,
        registry: &mut DatasetRegistry,
        loader: &dyn DatasetLoader,
        scene: &mut dyn SceneHost,
        mut camera: Option<&mut dyn CameraControls>,
    ) -> Vec<LoadSettlement> {
        let mut ready: Vec<(DatasetKey, LoadResult)> = Vec::new();
        self.pending.retain(|key, load| match block_on(future::poll_once(load)) {
            Some(result) => {
                ready.push((key.clone(), result));
                false
            }
            None => true,
        });
        ready.sort_by(|(a, _), (b, _)| a.cmp(b));

        ready
            .into_iter()
            .map(|(key, result)| match result {
                Err(error) => {
                    registry.revert(&key);
                    LoadSettlement::Failed(key, error)
                }
                Ok(dataset) if registry.state(&key) != SlotState::Loading => {
                    registry.revert(&key);
                    loader.dispose(dataset);
                    LoadSettlement::Discarded(key)
                }
                Ok(mut dataset) => {
                    dataset.apply_post_load_defaults();
                    if let Some(camera) = camera.as_mut() {
                        reset_camera(&mut **camera);
                    }
                    scene.add(&mut dataset);
                    if let Some(displaced) = registry.set(&key, dataset) {
                        loader.dispose(displaced);
                    }
                    LoadSettlement::Installed(key)
                }
            })
            .collect()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn in_flight(&self, key: &DatasetKey) -> bool {
        self.pending.contains_key(key)
    }
}

fn reset_camera(camera: &mut dyn CameraControls) {
    camera.set_far(DEFAULT_CAMERA_FAR);
    camera.update_projection();
    camera.set_position(Vec3::from_array(DEFAULT_CAMERA_POSITION));
    camera.look_at(Vec3::from_array(DEFAULT_CAMERA_TARGET));
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};

    use super::*;
    use crate::engine::assets::dataset::PointCloudDataset;
    use crate::engine::assets::dataset::test_support::dataset;

    type Slot = Arc<Mutex<Option<LoadResult>>>;

    /// Future that stays pending until its slot is filled.
    struct Gate(Slot);

    impl Future for Gate {
        type Output = LoadResult;

        fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<LoadResult> {
            match self.0.lock().unwrap().take() {
                Some(result) => Poll::Ready(result),
                None => Poll::Pending,
            }
        }
    }

    /// Loader whose loads complete only when the test resolves them.
    #[derive(Default)]
    pub struct GatedLoader {
        gates: Mutex<HashMap<DatasetKey, Slot>>,
        pub loads: Mutex<Vec<DatasetKey>>,
        pub disposed: Mutex<Vec<DatasetKey>>,
    }

    impl GatedLoader {
        pub fn succeed(&self, key: &str) {
            self.resolve(key, Ok(dataset(key)));
        }

        pub fn fail(&self, key: &str) {
            self.resolve(key, Err(LoadError::Backend("boom".to_string())));
        }

        fn resolve(&self, key: &str, result: LoadResult) {
            let gates = self.gates.lock().unwrap();
            let slot = gates.get(&DatasetKey::new(key)).expect("load was started");
            *slot.lock().unwrap() = Some(result);
        }

        pub fn load_count(&self) -> usize {
            self.loads.lock().unwrap().len()
        }

        pub fn dispose_count(&self) -> usize {
            self.disposed.lock().unwrap().len()
        }
    }

    impl DatasetLoader for GatedLoader {
        fn load(&self, key: &DatasetKey, _source: &SourceDescriptor) -> LoadFuture {
            self.loads.lock().unwrap().push(key.clone());
            let slot = Slot::default();
            self.gates.lock().unwrap().insert(key.clone(), slot.clone());
            Box::pin(Gate(slot))
        }

        fn dispose(&self, dataset: PointCloudDataset) {
            self.disposed.lock().unwrap().push(dataset.key().clone());
        }
    }

    #[derive(Default)]
    pub struct RecordingScene {
        pub added: Vec<DatasetKey>,
        pub removed: Vec<DatasetKey>,
    }

    impl SceneHost for RecordingScene {
        fn add(&mut self, dataset: &mut PointCloudDataset) {
            self.added.push(dataset.key().clone());
        }

        fn remove(&mut self, dataset: &mut PointCloudDataset) {
            self.removed.push(dataset.key().clone());
        }
    }
}
