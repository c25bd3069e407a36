// SPDX-License-Identifier: GPL-3.0-only

//! User configuration loaded from a JSON file.
//!
//! Every field has a default, so an empty object (or no file at all) yields
//! a working configuration:
//!
//! ```json
//! {
//!     "storage": { "area": "local", "live_update": true, "path": "state.json" },
//!     "keyboard_root_id": "kiosk-keyboard-root",
//!     "log_filter": "kiosk_keyboard=debug"
//! }
//! ```

use crate::app_settings;
use crate::store::StoreOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config at line {}: {source}", .source.line())]
    Json {
        #[source]
        source: serde_json::Error,
    },
}

/// Where the focus state is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub options: StoreOptions,
    /// JSON file backing the store; in-memory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// User configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    /// Id of the element hosting the keyboard widget
    pub keyboard_root_id: String,
    /// `tracing` filter directives
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            keyboard_root_id: app_settings::KEYBOARD_ROOT_ID.to_string(),
            log_filter: app_settings::DEFAULT_LOG_DIRECTIVE.to_string(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Json { source })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
