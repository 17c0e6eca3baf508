//! On-device path resolution.
//!
//! Every directory is resolved with the same precedence: config file, then
//! environment, then the layout's convention.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use romm_sync_core::DeviceLayout;
use romm_sync_core::layout::{MUOS_SD1, MUOS_SD2};

use crate::error::SyncError;
use crate::settings::{Config, DirectoryMapping};

pub const LAYOUT_ENV: &str = "CFW";
pub const ROM_DIRECTORY_ENV: &str = "ROM_DIRECTORY";

/// Resolved directories for the device this process runs on.
#[derive(Debug, Clone)]
pub struct DevicePaths {
    pub layout: DeviceLayout,
    pub base: PathBuf,
    pub rom_root: PathBuf,
    pub save_root: PathBuf,
    mappings: BTreeMap<String, DirectoryMapping>,
}

impl DevicePaths {
    /// Layout defaults under `base`, with no overrides.
    pub fn new(layout: DeviceLayout, base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            layout,
            rom_root: layout.rom_root(&base),
            save_root: layout.save_root(&base),
            base,
            mappings: BTreeMap::new(),
        }
    }

    pub fn with_rom_root(mut self, rom_root: impl Into<PathBuf>) -> Self {
        self.rom_root = rom_root.into();
        self
    }

    pub fn with_mappings(mut self, mappings: BTreeMap<String, DirectoryMapping>) -> Self {
        self.mappings = mappings;
        self
    }

    /// Resolve from config and the process environment.
    pub fn resolve(config: &Config) -> Result<Self, SyncError> {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Resolve from config and an environment lookup.
    pub fn resolve_with(
        config: &Config,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SyncError> {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());

        let layout_name = config
            .layout
            .clone()
            .or_else(|| env(LAYOUT_ENV))
            .ok_or_else(|| {
                SyncError::config(format!(
                    "no device layout configured; set `layout` in the config or ${LAYOUT_ENV}"
                ))
            })?;
        let layout: DeviceLayout = layout_name
            .parse()
            .map_err(romm_sync_core::CoreError::from)?;

        let base = match config.base_path.clone() {
            Some(p) => p,
            None => match env(layout.base_path_env()) {
                Some(p) => PathBuf::from(p),
                None => default_base(layout),
            },
        };

        let mut paths = Self::new(layout, base).with_mappings(config.directory_mappings.clone());
        if let Some(dir) = config
            .rom_directory
            .clone()
            .or_else(|| env(ROM_DIRECTORY_ENV).map(PathBuf::from))
        {
            paths.rom_root = dir;
        }
        log::debug!(
            "{} layout: base {}, roms {}, saves {}",
            layout,
            paths.base.display(),
            paths.rom_root.display(),
            paths.save_root.display()
        );
        Ok(paths)
    }

    pub fn mapping(&self, platform_slug: &str) -> Option<&DirectoryMapping> {
        self.mappings.get(platform_slug)
    }

    /// Folder a platform's ROMs are read from and downloaded into.
    pub fn platform_rom_dir(&self, platform_slug: &str) -> PathBuf {
        let relative = match self.mapping(platform_slug) {
            Some(m) if !m.relative_path.is_empty() => m.relative_path.clone(),
            _ => self.layout.default_platform_dir(platform_slug),
        };
        self.rom_root.join(relative)
    }

    /// Folders holding a platform's saves. A configured save directory
    /// replaces the layout's list.
    pub fn platform_save_dirs(&self, platform_slug: &str) -> Vec<PathBuf> {
        if let Some(m) = self.mapping(platform_slug) {
            if !m.save_directory.is_empty() {
                return vec![self.save_root.join(&m.save_directory)];
            }
        }
        self.layout
            .save_dirs(platform_slug)
            .iter()
            .map(|dir| self.save_root.join(dir))
            .collect()
    }

    pub fn bios_dirs(&self, platform_slug: &str) -> Vec<PathBuf> {
        self.layout.bios_dirs(&self.base, platform_slug)
    }
}

/// muOS boots from either SD slot; the second one wins when it carries a
/// muOS install.
fn default_base(layout: DeviceLayout) -> PathBuf {
    if layout == DeviceLayout::MuOs {
        if Path::new(MUOS_SD2).join("MUOS").join("info").is_dir() {
            return PathBuf::from(MUOS_SD2);
        }
        return PathBuf::from(MUOS_SD1);
    }
    PathBuf::from(layout.default_base_path())
}

#[cfg(test)]
#[path = "tests/paths_tests.rs"]
mod tests;
