//! Dataset descriptions and loaded dataset handles.
//!
//! Covers the configured catalog of dataset slots, Potree metadata parsing
//! and the in-memory handle the session owns once a load succeeds.

/// Spatial bounds data structures for dataset coordinate systems.
pub mod bounds;

/// Dataset keys, source descriptors and the configured catalog.
pub mod catalog;

/// Loaded dataset handle with material, orientation and point budget.
pub mod dataset;

/// Potree 1.x (`cloud.js`) and 2.0 (`metadata.json`) metadata parsing.
pub mod metadata;
