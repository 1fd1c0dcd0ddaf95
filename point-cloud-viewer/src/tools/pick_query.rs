use bevy::prelude::*;

use super::ray::ray_hits_obb;
use crate::engine::assets::catalog::DatasetKey;
use crate::engine::assets::dataset::PointCloudDataset;
use crate::engine::camera::viewport_camera::CameraView;

/// Result of a pick query. `position` may be absent when the backend knows
/// which dataset was hit but cannot place the point.
#[derive(Debug, Clone, PartialEq)]
pub struct PickPoint {
    pub position: Option<Vec3>,
    pub dataset: DatasetKey,
}

/// Ray query against the installed datasets.
pub trait PickQuery: Send + Sync + 'static {
    fn pick(
        &self,
        datasets: &[&PointCloudDataset],
        camera: &dyn CameraView,
        ray: Ray3d,
    ) -> Option<PickPoint>;
}

#[derive(Resource)]
pub struct ActivePickQuery(pub Box<dyn PickQuery>);

/// Picks the nearest dataset bounding box along the ray.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundsPickQuery;

impl PickQuery for BoundsPickQuery {
    fn pick(
        &self,
        datasets: &[&PointCloudDataset],
        _camera: &dyn CameraView,
        ray: Ray3d,
    ) -> Option<PickPoint> {
        datasets
            .iter()
            .filter_map(|dataset| {
                ray_hits_obb(ray, &dataset.world_box_transform()).map(|t| (t, *dataset))
            })
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(t, dataset)| PickPoint {
                position: Some(ray.get_point(t)),
                dataset: dataset.key().clone(),
            })
    }
}
