//! Application-wide constants.

/// Application name, used for the config directory and generated headers.
pub const APP_NAME: &str = "l10nsync";

/// Config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "l10nsync.json";

/// Config file inside the user config directory.
pub const USER_CONFIG_FILENAME: &str = "config.json";

/// First line of every generated file.
pub const GENERATED_NOTICE: &str = "Generated by l10nsync. Do not edit.";
