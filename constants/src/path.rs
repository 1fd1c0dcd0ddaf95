/// Viewer configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "viewer_config.json";

/// Environment variable overriding `DEFAULT_CONFIG_PATH`.
pub const CONFIG_PATH_ENV: &str = "POINT_CLOUD_VIEWER_CONFIG";

/// Asset path prefix dataset `url` values are resolved against, relative to
/// the asset folder (served alongside the page on the web build).
pub const DEFAULT_DATA_ROOT: &str = "pointclouds";
