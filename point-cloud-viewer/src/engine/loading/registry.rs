use std::collections::HashMap;

use bevy::prelude::*;

use crate::engine::assets::catalog::DatasetKey;
use crate::engine::assets::dataset::PointCloudDataset;

/// Observable state of one dataset slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Unloaded,
    Loading,
    /// Loading, but an unload arrived first; the result will be disposed.
    CancelPending,
    Loaded,
}

impl SlotState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::CancelPending => "cancelling",
            Self::Loaded => "loaded",
        }
    }
}

#[derive(Debug, Default)]
enum DatasetSlot {
    #[default]
    Unloaded,
    Loading {
        cancel_requested: bool,
    },
    Loaded(PointCloudDataset),
}

/// Per-key loaded flag and dataset handle. Pure state, no I/O.
///
/// `is_loaded` is raised as soon as a load begins, ahead of the handle, so a
/// second request for the same key arriving mid-load sees the slot as taken.
#[derive(Resource, Debug, Default)]
pub struct DatasetRegistry {
    slots: HashMap<DatasetKey, DatasetSlot>,
}

impl DatasetRegistry {
    pub fn with_keys<'a>(keys: impl IntoIterator<Item = &'a DatasetKey>) -> Self {
        Self {
            slots: keys
                .into_iter()
                .map(|key| (key.clone(), DatasetSlot::Unloaded))
                .collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &DatasetKey> {
        self.slots.keys()
    }

    pub fn state(&self, key: &DatasetKey) -> SlotState {
        match self.slots.get(key) {
            None | Some(DatasetSlot::Unloaded) => SlotState::Unloaded,
            Some(DatasetSlot::Loading {
                cancel_requested: false,
            }) => SlotState::Loading,
            Some(DatasetSlot::Loading {
                cancel_requested: true,
            }) => SlotState::CancelPending,
            Some(DatasetSlot::Loaded(_)) => SlotState::Loaded,
        }
    }

    /// True while loading or loaded.
    pub fn is_loaded(&self, key: &DatasetKey) -> bool {
        self.state(key) != SlotState::Unloaded
    }

    pub fn get(&self, key: &DatasetKey) -> Option<&PointCloudDataset> {
        match self.slots.get(key) {
            Some(DatasetSlot::Loaded(dataset)) => Some(dataset),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &DatasetKey) -> Option<&mut PointCloudDataset> {
        match self.slots.get_mut(key) {
            Some(DatasetSlot::Loaded(dataset)) => Some(dataset),
            _ => None,
        }
    }

    /// Install a handle. Returns a handle it displaced, which the caller owns.
    pub fn set(&mut self, key: &DatasetKey, dataset: PointCloudDataset) -> Option<PointCloudDataset> {
        match self.slots.insert(key.clone(), DatasetSlot::Loaded(dataset)) {
            Some(DatasetSlot::Loaded(previous)) => Some(previous),
            _ => None,
        }
    }

    /// Return the slot to unloaded, handing back the handle if one was installed.
    pub fn clear(&mut self, key: &DatasetKey) -> Option<PointCloudDataset> {
        match self.slots.get_mut(key).map(std::mem::take) {
            Some(DatasetSlot::Loaded(dataset)) => Some(dataset),
            _ => None,
        }
    }

    /// Check-then-commit of the eager loading flag. False if the slot is taken.
    pub fn begin_loading(&mut self, key: &DatasetKey) -> bool {
        let slot = self.slots.entry(key.clone()).or_default();
        if !matches!(slot, DatasetSlot::Unloaded) {
            return false;
        }
        *slot = DatasetSlot::Loading {
            cancel_requested: false,
        };
        true
    }

    /// Mark an in-flight load for disposal on completion. False if not loading.
    pub fn request_cancel(&mut self, key: &DatasetKey) -> bool {
        match self.slots.get_mut(key) {
            Some(DatasetSlot::Loading { cancel_requested }) => {
                *cancel_requested = true;
                true
            }
            _ => false,
        }
    }

    /// Undo a pending cancel so the in-flight load installs normally.
    pub fn withdraw_cancel(&mut self, key: &DatasetKey) -> bool {
        match self.slots.get_mut(key) {
            Some(DatasetSlot::Loading { cancel_requested }) if *cancel_requested => {
                *cancel_requested = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_cancel_requested(&self, key: &DatasetKey) -> bool {
        self.state(key) == SlotState::CancelPending
    }

    /// Drop the loading flag after a load settles without installing.
    pub fn revert(&mut self, key: &DatasetKey) {
        if let Some(slot) = self.slots.get_mut(key) {
            if matches!(slot, DatasetSlot::Loading { .. }) {
                *slot = DatasetSlot::Unloaded;
            }
        }
    }

    /// Installed handles, i.e. the set the pick query runs against.
    pub fn installed(&self) -> impl Iterator<Item = &PointCloudDataset> {
        self.slots.values().filter_map(|slot| match slot {
            DatasetSlot::Loaded(dataset) => Some(dataset),
            _ => None,
        })
    }
}
