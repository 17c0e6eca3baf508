//! BIOS requirement tables.
//!
//! Two JSON tables are compiled into the binary: platform slug to libretro
//! core names, and core name to the BIOS files that core wants. A file of the
//! same name in an override directory replaces the embedded copy wholesale.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Suffix libretro core names carry in the platform table but not in the
/// requirements table.
pub const CORE_SUFFIX: &str = "_libretro";

pub const PLATFORM_CORES_FILE: &str = "platform_cores.json";
pub const CORE_BIOS_FILE: &str = "core_bios.json";

const EMBEDDED_PLATFORM_CORES: &str = include_str!("../data/bios/platform_cores.json");
const EMBEDDED_CORE_BIOS: &str = include_str!("../data/bios/core_bios.json");

/// A single firmware file an emulator core may need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiosFile {
    pub file_name: String,
    /// Path relative to the BIOS directory, e.g. `PPSSPP/ppge_atlas.zim`.
    pub relative_path: String,
    /// Expected MD5 (lowercase hex), when known.
    #[serde(rename = "md5", default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub optional: bool,
}

/// All BIOS files one core wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreBiosRequirement {
    /// Normalized core name; filled from the table key on load.
    #[serde(default)]
    pub core_name: String,
    pub display_name: String,
    #[serde(default)]
    pub files: Vec<BiosFile>,
}

/// Strip the libretro suffix from a core name.
pub fn normalize_core_name(name: &str) -> &str {
    name.strip_suffix(CORE_SUFFIX).unwrap_or(name)
}

/// The platform and core BIOS tables, immutable once loaded.
#[derive(Debug, Clone)]
pub struct BiosTables {
    platform_cores: HashMap<String, Vec<String>>,
    cores: HashMap<String, CoreBiosRequirement>,
}

impl BiosTables {
    /// Tables compiled into the binary.
    pub fn embedded() -> Result<Self, CoreError> {
        Self::from_json(EMBEDDED_PLATFORM_CORES, EMBEDDED_CORE_BIOS)
    }

    /// Load tables, letting files in `override_dir` replace the embedded ones.
    pub fn load(override_dir: Option<&Path>) -> Result<Self, CoreError> {
        let platform_cores = read_override(override_dir, PLATFORM_CORES_FILE)?;
        let core_bios = read_override(override_dir, CORE_BIOS_FILE)?;
        Self::from_json(
            platform_cores.as_deref().unwrap_or(EMBEDDED_PLATFORM_CORES),
            core_bios.as_deref().unwrap_or(EMBEDDED_CORE_BIOS),
        )
    }

    pub fn from_json(platform_cores: &str, core_bios: &str) -> Result<Self, CoreError> {
        let platform_cores: HashMap<String, Vec<String>> = serde_json::from_str(platform_cores)
            .map_err(|e| CoreError::json(PLATFORM_CORES_FILE, e))?;
        let raw: HashMap<String, CoreBiosRequirement> =
            serde_json::from_str(core_bios).map_err(|e| CoreError::json(CORE_BIOS_FILE, e))?;

        let cores = raw
            .into_iter()
            .map(|(name, mut req)| {
                let name = normalize_core_name(&name).to_string();
                req.core_name = name.clone();
                for file in &mut req.files {
                    // Generated tables use "" for unknown hashes.
                    file.checksum = file
                        .checksum
                        .take()
                        .map(|c| c.trim().to_lowercase())
                        .filter(|c| !c.is_empty());
                }
                (name, req)
            })
            .collect();

        Ok(Self {
            platform_cores,
            cores,
        })
    }

    /// Core names listed for a platform, as written in the table.
    pub fn cores_for_platform(&self, platform_slug: &str) -> &[String] {
        self.platform_cores
            .get(platform_slug)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Requirements for a core, by either its raw or normalized name.
    pub fn core(&self, core_name: &str) -> Option<&CoreBiosRequirement> {
        self.cores.get(normalize_core_name(core_name))
    }

    /// Every BIOS file any of a platform's cores may need.
    ///
    /// Files are deduplicated by file name; the first core listing a file
    /// wins. Unknown platforms and cores contribute nothing.
    pub fn required_files(&self, platform_slug: &str) -> Vec<BiosFile> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for core_name in self.cores_for_platform(platform_slug) {
            let Some(core) = self.core(core_name) else {
                log::debug!("No BIOS table entry for core {}", core_name);
                continue;
            };
            for file in &core.files {
                if seen.insert(file.file_name.clone()) {
                    files.push(file.clone());
                }
            }
        }
        files
    }

    /// Platform slugs that need at least one BIOS file, sorted.
    pub fn platforms_with_bios(&self) -> Vec<&str> {
        let mut slugs: Vec<&str> = self
            .platform_cores
            .keys()
            .filter(|slug| !self.required_files(slug).is_empty())
            .map(String::as_str)
            .collect();
        slugs.sort_unstable();
        slugs
    }
}

fn read_override(dir: Option<&Path>, name: &str) -> Result<Option<String>, CoreError> {
    let Some(dir) = dir else {
        return Ok(None);
    };
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            log::debug!("Using BIOS table override {}", path.display());
            Ok(Some(contents))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CoreError::io(path, e)),
    }
}

#[cfg(test)]
#[path = "tests/bios_tests.rs"]
mod tests;
