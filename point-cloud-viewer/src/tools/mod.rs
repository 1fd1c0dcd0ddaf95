//! Interactive controls for the dataset session: keyboard shortcuts, the
//! native control panel and the cursor pick marker.
//!
//! ## Command Flow
//!
//! ```text
//! Keyboard / Panel / RPC input
//!   └─> DatasetCommand
//!       └─> handle_dataset_commands()
//!           ├─> load, unload or re-budget via DatasetLifecycle
//!           └─> DatasetStatus ──> panel labels, RPC notifications
//! ```
//!
//! ## Cross-Platform Considerations
//!
//! ### Native Builds
//! - `1`..`9` load the matching catalog dataset, `Shift` + number unloads it
//! - Control panel with Load / Unload / budget buttons and a status label
//!
//! ### WASM Builds
//! - No keyboard shortcuts or panel; datasets are driven over JSON-RPC
//!
//! ## Pick Marker
//!
//! Every cursor move casts a ray from the viewer camera. Over an installed
//! dataset the marker is shown at the hit point, scaled with its distance to
//! the camera; otherwise it is hidden.

/// Native dataset panel built with `bevy_ui`.
pub mod control_panel;

/// `DatasetCommand` events and keyboard shortcuts.
pub mod dataset_controls;

/// Marker state machine and the cursor-move system that drives it.
pub mod pick_indicator;

/// `PickQuery` seam and the bounding-box implementation.
pub mod pick_query;

/// Slab-method ray / box intersection.
pub mod ray;
