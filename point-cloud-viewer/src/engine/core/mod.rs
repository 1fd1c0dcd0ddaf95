//! Core application setup and configuration.
//!
//! Reads the viewer configuration and assembles the Bevy app for both
//! native and WASM targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Installs the dataset session, picking, controls and RPC plugins and
/// spawns the camera, light and pick marker.
pub mod app_setup;

/// Viewer configuration file: data root, log filter and dataset catalog.
pub mod config;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
