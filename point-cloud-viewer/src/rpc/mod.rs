//! JSON-RPC 2.0 communication layer for embedding the viewer in a web page.
//!
//! Implements bidirectional messaging between the Bevy app and its host page
//! via iframe postMessage, supporting both request-response and notification
//! patterns.
//!
//! ## Message Flow
//!
//! ```text
//! Host page (parent window)  <──postMessage──>  Bevy (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ DatasetCommand event
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        │ <────────── Notification (no ID) ─────┤  (from DatasetStatus)
//! ```
//!
//! A response only acknowledges that a command was accepted. Whether a load
//! succeeded is reported later by a notification.
//!
//! ## Methods
//!
//! - `load_dataset { key }`: start loading a catalog dataset
//! - `unload_dataset { key }`: unload it, or discard an in-flight load
//! - `set_point_budget { key, value }`: clamp and apply a point budget
//! - `list_datasets`: keys, formats, states and budgets
//!
//! ## Notifications
//!
//! - `dataset_loaded { key, point_count }`
//! - `dataset_unloaded { key }`
//! - `dataset_load_failed { key, reason }`
//! - `point_budget_changed { key, point_budget }`
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params (including unknown dataset keys)

/// JSON-RPC 2.0 bidirectional communication system for the host page.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
