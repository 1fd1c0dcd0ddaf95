use bevy::prelude::*;

use crate::engine::assets::catalog::DatasetKey;
use crate::engine::assets::dataset::PointCloudDataset;

/// Scene graph seam used by the dataset lifecycle.
pub trait SceneHost {
    fn add(&mut self, dataset: &mut PointCloudDataset);
    fn remove(&mut self, dataset: &mut PointCloudDataset);
}

/// Scene entity of an installed dataset.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct PointCloudInstance {
    pub key: DatasetKey,
}

/// Spawns and despawns dataset entities through deferred commands.
pub struct CommandsSceneHost<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
}

impl SceneHost for CommandsSceneHost<'_, '_, '_> {
    fn add(&mut self, dataset: &mut PointCloudDataset) {
        let entity = self
            .commands
            .spawn((
                Name::new(format!("Point cloud {}", dataset.key())),
                PointCloudInstance {
                    key: dataset.key().clone(),
                },
                dataset.transform,
                Visibility::Visible,
            ))
            .id();
        dataset.attach(entity);
    }

    fn remove(&mut self, dataset: &mut PointCloudDataset) {
        if let Some(entity) = dataset.detach() {
            self.commands.entity(entity).despawn();
        }
    }
}
