use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::bounds::BoundsData;
use super::catalog::SourceFormat;

/// Format-independent summary of a dataset's metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub format: SourceFormat,
    pub version: String,
    pub name: Option<String>,
    pub point_count: u64,
    pub spacing: f64,
    pub bounds: BoundsData,
}

/// A metadata file loaded through the asset server.
pub trait MetadataAsset: Asset {
    fn to_metadata(&self) -> DatasetMetadata;
}

/// Potree 1.x `cloud.js` box, lower (`l*`) and upper (`u*`) corners.
#[derive(Debug, Deserialize)]
struct CornerBox {
    lx: f64,
    ly: f64,
    lz: f64,
    ux: f64,
    uy: f64,
    uz: f64,
}

impl CornerBox {
    fn to_bounds(&self) -> BoundsData {
        BoundsData::from_corners([self.lx, self.ly, self.lz], [self.ux, self.uy, self.uz])
    }
}

/// Potree 1.x `cloud.js`.
#[derive(Asset, TypePath, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudJs {
    version: String,
    #[serde(default)]
    points: u64,
    spacing: f64,
    bounding_box: CornerBox,
    #[serde(default)]
    tight_bounding_box: Option<CornerBox>,
}

// The regular box is padded to a cube for the octree; prefer the tight one.
impl MetadataAsset for CloudJs {
    fn to_metadata(&self) -> DatasetMetadata {
        let bounds = self
            .tight_bounding_box
            .as_ref()
            .unwrap_or(&self.bounding_box)
            .to_bounds();
        DatasetMetadata {
            format: SourceFormat::V1,
            version: self.version.clone(),
            name: None,
            point_count: self.points,
            spacing: self.spacing,
            bounds,
        }
    }
}

/// Potree 2.0 `metadata.json` box.
#[derive(Debug, Deserialize)]
struct MinMaxBox {
    min: [f64; 3],
    max: [f64; 3],
}

/// Potree 2.0 `metadata.json`.
#[derive(Asset, TypePath, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataJson {
    version: String,
    #[serde(default)]
    name: Option<String>,
    points: u64,
    spacing: f64,
    bounding_box: MinMaxBox,
}

impl MetadataAsset for MetadataJson {
    fn to_metadata(&self) -> DatasetMetadata {
        DatasetMetadata {
            format: SourceFormat::V2,
            version: self.version.clone(),
            name: self.name.clone().filter(|name| !name.is_empty()),
            point_count: self.points,
            spacing: self.spacing,
            bounds: BoundsData::from_corners(self.bounding_box.min, self.bounding_box.max),
        }
    }
}
