use std::collections::HashMap;
use std::future::{Future, ready};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bevy::asset::{AssetLoadError, LoadState, UntypedAssetId};
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use thiserror::Error;

use crate::engine::assets::catalog::{DatasetKey, SourceDescriptor, SourceFormat};
use crate::engine::assets::dataset::PointCloudDataset;
use crate::engine::assets::metadata::{CloudJs, DatasetMetadata, MetadataAsset, MetadataJson};
use crate::engine::loading::systems::poll_dataset_loads;

pub type LoadResult = Result<PointCloudDataset, LoadError>;

/// In-flight load. Polled once per frame by the session systems.
pub type LoadFuture = Pin<Box<dyn Future<Output = LoadResult> + Send + Sync + 'static>>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unknown dataset `{0}`")]
    UnknownDataset(DatasetKey),

    #[error("unsupported dataset source `{0}`")]
    UnsupportedSource(String),

    #[error("failed to load {path}: {source}")]
    Asset {
        path: String,
        #[source]
        source: Arc<AssetLoadError>,
    },

    #[error("loader backend failed: {0}")]
    Backend(String),
}

/// Produces dataset handles from source descriptors and releases them again.
pub trait DatasetLoader: Send + Sync + 'static {
    fn load(&self, key: &DatasetKey, source: &SourceDescriptor) -> LoadFuture;

    /// Takes ownership so a handle can only be released once.
    fn dispose(&self, dataset: PointCloudDataset);
}

/// Loader shared by the command and completion systems.
#[derive(Resource, Clone)]
pub struct ActiveLoader(pub Arc<dyn DatasetLoader>);

/// Metadata of loaded `cloud.js` / `metadata.json` assets, by asset id.
///
/// Filled from asset events so an in-flight load can pick its result up
/// without access to `Assets<T>`.
#[derive(Resource, Clone, Default)]
pub struct MetadataInbox(Arc<Mutex<HashMap<UntypedAssetId, DatasetMetadata>>>);

impl MetadataInbox {
    fn insert(&self, id: UntypedAssetId, metadata: DatasetMetadata) {
        if let Ok(mut loaded) = self.0.lock() {
            loaded.insert(id, metadata);
        }
    }

    fn remove(&self, id: UntypedAssetId) {
        if let Ok(mut loaded) = self.0.lock() {
            loaded.remove(&id);
        }
    }

    fn get(&self, id: UntypedAssetId) -> Option<DatasetMetadata> {
        self.0.lock().ok()?.get(&id).cloned()
    }
}

pub fn collect_loaded_metadata<A: MetadataAsset>(
    mut events: EventReader<AssetEvent<A>>,
    assets: Res<Assets<A>>,
    inbox: Res<MetadataInbox>,
) {
    for event in events.read() {
        match event {
            AssetEvent::LoadedWithDependencies { id } | AssetEvent::Modified { id } => {
                if let Some(asset) = assets.get(*id) {
                    inbox.insert(id.untyped(), asset.to_metadata());
                }
            }
            AssetEvent::Unused { id } | AssetEvent::Removed { id } => inbox.remove(id.untyped()),
            AssetEvent::Added { .. } => {}
        }
    }
}

/// Join `data_root`, `url` and `file` into an asset path.
pub fn asset_path(data_root: &str, source: &SourceDescriptor) -> String {
    [data_root, source.url.as_str(), source.file.as_str()]
        .iter()
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Loads dataset metadata through the asset server, so the same code path
/// reads from disk natively and fetches over HTTP on the web.
#[derive(Clone)]
pub struct AssetDatasetLoader {
    server: AssetServer,
    inbox: MetadataInbox,
    data_root: String,
}

impl AssetDatasetLoader {
    pub fn new(server: AssetServer, inbox: MetadataInbox, data_root: impl Into<String>) -> Self {
        Self {
            server,
            inbox,
            data_root: data_root.into(),
        }
    }

    /// Build from the resources `AssetPlugin` and `DatasetAssetsPlugin` insert.
    pub fn from_world(world: &World, data_root: impl Into<String>) -> Self {
        let server = world.resource::<AssetServer>().clone();
        let inbox = world.resource::<MetadataInbox>().clone();
        Self::new(server, inbox, data_root)
    }
}

impl DatasetLoader for AssetDatasetLoader {
    fn load(&self, key: &DatasetKey, source: &SourceDescriptor) -> LoadFuture {
        if source.is_remote() {
            return Box::pin(ready(Err(LoadError::UnsupportedSource(source.url.clone()))));
        }

        let path = asset_path(&self.data_root, source);
        let handle = match source.format {
            SourceFormat::V1 => self.server.load::<CloudJs>(path.clone()).untyped(),
            SourceFormat::V2 => self.server.load::<MetadataJson>(path.clone()).untyped(),
        };
        Box::pin(MetadataLoad {
            server: self.server.clone(),
            inbox: self.inbox.clone(),
            handle,
            path,
            key: key.clone(),
        })
    }

    fn dispose(&self, dataset: PointCloudDataset) {
        debug!(
            "Released dataset {} ({} points)",
            dataset.key(),
            dataset.metadata().point_count
        );
    }
}

/// Resolves once the metadata asset is loaded (and collected) or has failed.
/// Holds the strong handle until then.
struct MetadataLoad {
    server: AssetServer,
    inbox: MetadataInbox,
    handle: UntypedHandle,
    path: String,
    key: DatasetKey,
}

impl Future for MetadataLoad {
    type Output = LoadResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<LoadResult> {
        let id = self.handle.id();
        match self.server.load_state(id) {
            LoadState::Failed(source) => Poll::Ready(Err(LoadError::Asset {
                path: self.path.clone(),
                source,
            })),
            LoadState::Loaded => match self.inbox.get(id) {
                Some(metadata) => Poll::Ready(Ok(PointCloudDataset::new(self.key.clone(), metadata))),
                None => {
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            },
            LoadState::NotLoaded | LoadState::Loading => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }
}

/// JSON asset loaders for both metadata layouts and the systems that hand
/// their results to in-flight loads.
pub struct DatasetAssetsPlugin;

impl Plugin for DatasetAssetsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(JsonAssetPlugin::<CloudJs>::new(&["js"]))
            .add_plugins(JsonAssetPlugin::<MetadataJson>::new(&["json"]))
            .init_resource::<MetadataInbox>()
            .add_systems(
                Update,
                (
                    collect_loaded_metadata::<CloudJs>,
                    collect_loaded_metadata::<MetadataJson>,
                )
                    .before(poll_dataset_loads),
            );
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use bevy::asset::AssetMetaCheck;
    use bevy::tasks::block_on;
    use bevy::tasks::futures_lite::future;

    use super::*;

    const METADATA_JSON: &str = r#"{
        "version": "2.0",
        "name": "lion",
        "points": 42,
        "spacing": 0.5,
        "boundingBox": { "min": [0.0, 0.0, 0.0], "max": [1.0, 2.0, 3.0] }
    }"#;

    const CLOUD_JS: &str = r#"{
        "version": "1.7",
        "points": 7,
        "spacing": 0.1,
        "boundingBox": { "lx": 0.0, "ly": 0.0, "lz": 0.0, "ux": 2.0, "uy": 2.0, "uz": 2.0 }
    }"#;

    fn asset_app(root: &std::path::Path) -> App {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            AssetPlugin {
                file_path: root.to_string_lossy().into_owned(),
                meta_check: AssetMetaCheck::Never,
                ..default()
            },
            DatasetAssetsPlugin,
        ));
        app
    }

    // Asset IO runs on the task pools; give it real time between frames.
    fn drive(app: &mut App, mut load: LoadFuture) -> LoadResult {
        for _ in 0..500 {
            app.update();
            if let Some(result) = block_on(future::poll_once(&mut load)) {
                return result;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("load did not settle");
    }

    #[test]
    fn asset_path_joins_non_empty_segments() {
        let source = SourceDescriptor::new("cloud.js", "/lion/", SourceFormat::V1);
        assert_eq!(asset_path("pointclouds", &source), "pointclouds/lion/cloud.js");
        assert_eq!(asset_path("", &source), "lion/cloud.js");
    }

    #[test]
    fn loads_metadata_json_through_the_asset_server() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pointclouds/lion")).unwrap();
        fs::write(dir.path().join("pointclouds/lion/metadata.json"), METADATA_JSON).unwrap();

        let mut app = asset_app(dir.path());
        let loader = AssetDatasetLoader::from_world(app.world(), "pointclouds");
        let source = SourceDescriptor::new("metadata.json", "lion", SourceFormat::V2);
        let dataset = drive(&mut app, loader.load(&"v2".into(), &source)).unwrap();

        assert_eq!(dataset.key().as_str(), "v2");
        assert_eq!(dataset.metadata().point_count, 42);
        assert_eq!(dataset.metadata().bounds.max_z, 3.0);
    }

    #[test]
    fn loads_cloud_js_through_the_asset_server() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("vol")).unwrap();
        fs::write(dir.path().join("vol/cloud.js"), CLOUD_JS).unwrap();

        let mut app = asset_app(dir.path());
        let loader = AssetDatasetLoader::from_world(app.world(), "");
        let source = SourceDescriptor::new("cloud.js", "vol", SourceFormat::V1);
        let dataset = drive(&mut app, loader.load(&"v1".into(), &source)).unwrap();

        assert_eq!(dataset.metadata().format, SourceFormat::V1);
        assert_eq!(dataset.metadata().point_count, 7);
    }

    #[test]
    fn missing_file_fails_with_its_asset_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = asset_app(dir.path());
        let loader = AssetDatasetLoader::from_world(app.world(), "pointclouds");
        let source = SourceDescriptor::new("cloud.js", "missing", SourceFormat::V1);

        let err = drive(&mut app, loader.load(&"v1".into(), &source)).unwrap_err();
        match &err {
            LoadError::Asset { path, .. } => assert_eq!(path, "pointclouds/missing/cloud.js"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_metadata_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cloud.js"), "{ \"version\": ").unwrap();
        let mut app = asset_app(dir.path());
        let loader = AssetDatasetLoader::from_world(app.world(), "");
        let source = SourceDescriptor::new("cloud.js", "", SourceFormat::V1);

        let err = drive(&mut app, loader.load(&"v1".into(), &source)).unwrap_err();
        assert!(matches!(err, LoadError::Asset { .. }));
    }

    #[test]
    fn remote_sources_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = asset_app(dir.path());
        let loader = AssetDatasetLoader::from_world(app.world(), "");
        let source = SourceDescriptor::new("cloud.js", "https://example.org/lion/", SourceFormat::V1);

        let err = block_on(loader.load(&"v1".into(), &source)).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedSource(url) if url.starts_with("https://")));
    }
}
