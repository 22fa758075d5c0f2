//! Engine settings.
//!
//! [`EngineSettings`] is a plain serde struct with defaults for every field,
//! so a settings file only needs to name what it changes. Missing files load
//! as defaults.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use populace_config::ConfigError;
use populace_core::resolve::DEFAULT_DELIMITER;

/// Name of the global override layer applied before the per-world layer.
pub const DEFAULT_GLOBAL_LAYER: &str = "Master";

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Field delimiter of override records.
    pub delimiter: char,
    /// Store world name of the global override layer.
    pub global_layer: String,
    /// Despawn thresholds.
    pub despawn: DespawnSettings,
    /// Living groups: group name -> member entity kinds. A group gets its own
    /// policy, seeded from its first registered member.
    pub groups: BTreeMap<String, Vec<String>>,
    /// Capability assignments: entity kind -> capability name.
    pub capabilities: BTreeMap<String, String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            global_layer: DEFAULT_GLOBAL_LAYER.to_owned(),
            despawn: DespawnSettings::default(),
            groups: BTreeMap::new(),
            capabilities: BTreeMap::new(),
        }
    }
}

impl EngineSettings {
    /// Load settings from a JSON file. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file exists but cannot be read, and
    /// [`ConfigError::Parse`] if it is not valid settings JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save settings as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Thresholds of the despawn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DespawnSettings {
    /// Entities must be older than this many ticks to be culled.
    pub age_threshold: u32,
    /// An old, far entity is culled with probability `1 / chance_denominator`
    /// per evaluation.
    pub chance_denominator: u32,
    /// Squared distance beyond which an observer counts as far (32 blocks).
    pub far_distance_sq: f64,
}

impl Default for DespawnSettings {
    fn default() -> Self {
        Self {
            age_threshold: 600,
            chance_denominator: 16,
            far_distance_sq: 1024.0,
        }
    }
}
