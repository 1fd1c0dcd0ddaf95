//! Dataset session: which datasets are loaded, and the systems that load,
//! unload and re-budget them.
//!
//! Commands arrive as `DatasetCommand` events and are applied by
//! `handle_dataset_commands`; `poll_dataset_loads` then drives in-flight
//! loads once per frame and publishes `DatasetStatus` events.

/// Per-dataset point budget updates.
pub mod budget;

/// Load and unload orchestration, including loads cancelled mid-flight.
pub mod lifecycle;

/// `DatasetLoader` seam, load errors and the file-backed loader.
///
/// Reads Potree `cloud.js` / `metadata.json` files on the IO task pool.
pub mod loader;

/// Per-key load state and installed dataset handles.
pub mod registry;

/// Bevy systems, status events and `DatasetSessionPlugin`.
pub mod systems;
