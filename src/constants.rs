//! Application-wide constants.

/// Directory name under the platform config directory.
pub const APP_DIR_NAME: &str = "LazyLayout";

/// Environment variable that overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "LAZYLAYOUT_CONFIG_DIR";
