//! Application config file.
//!
//! Lives at `~/.config/romm-sync/config.toml` unless a path is given. A
//! missing file means defaults; a malformed one is an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use romm_sync_client::Host;

use crate::error::SyncError;

pub const APP_NAME: &str = "romm-sync";

/// Canonical path to the config file: `~/.config/romm-sync/config.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join(APP_NAME).join("config.toml")
}

/// Per-platform overrides of the layout's folder conventions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryMapping {
    /// ROM folder relative to the ROM root.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub relative_path: String,
    /// Save folder relative to the save root.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub save_directory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device layout name (`muos`, `nextui`, `knulli`); falls back to `$CFW`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rom_directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Directory whose BIOS table files replace the embedded ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bios_override_dir: Option<PathBuf>,
    pub api_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub log_level: String,
    pub hosts: Vec<Host>,
    pub directory_mappings: BTreeMap<String, DirectoryMapping>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: None,
            base_path: None,
            rom_directory: None,
            cache_dir: None,
            bios_override_dir: None,
            api_timeout_secs: 30,
            download_timeout_secs: 600,
            log_level: "info".to_string(),
            hosts: Vec::new(),
            directory_mappings: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&contents).map_err(|source| SyncError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write atomically to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = toml::to_string_pretty(self)
            .map_err(|e| SyncError::config(format!("Failed to serialize config: {e}")))?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// The host used for all remote operations.
    pub fn primary_host(&self) -> Option<&Host> {
        self.hosts.first()
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn mapping(&self, platform_slug: &str) -> Option<&DirectoryMapping> {
        self.directory_mappings.get(platform_slug)
    }

    /// Directory holding catalog caches and freshness signatures.
    pub fn cache_root(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        match dirs::cache_dir() {
            Some(dir) => dir.join(APP_NAME),
            None => PathBuf::from(".cache"),
        }
    }

    /// Pretty TOML for display, with host passwords masked.
    pub fn to_display_string(&self) -> Result<String, SyncError> {
        let mut shown = self.clone();
        for host in &mut shown.hosts {
            if !host.password.is_empty() {
                host.password = "********".to_string();
            }
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| SyncError::config(format!("Failed to serialize config: {e}")))
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
