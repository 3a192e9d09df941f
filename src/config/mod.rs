//! Configuration module for EEQL.
//!
//! Handles the `eeql.toml` settings file and environment variables.

mod settings;

pub use settings::{
    expand_env_vars, CatalogSettings, CompileSettings, LoggingSettings, Settings, SettingsError,
};
