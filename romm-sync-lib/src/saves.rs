//! Save sync decisions and local save files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};

use romm_sync_client::Save;

use crate::catalog_cache::cache_key;
use crate::error::SyncError;
use crate::paths::DevicePaths;

/// Folder inside a save directory that holds backups of overwritten saves.
pub const BACKUP_DIR: &str = ".backup";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    Skip,
    Upload,
    Download,
}

impl std::fmt::Display for SyncDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip",
            Self::Upload => "upload",
            Self::Download => "download",
        })
    }
}

/// A save file found on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSave {
    pub platform_slug: String,
    pub path: PathBuf,
    pub last_modified: DateTime<Utc>,
}

impl LocalSave {
    /// Build from a file's metadata.
    pub fn from_path(platform_slug: &str, path: &Path) -> std::io::Result<Self> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Self {
            platform_slug: platform_slug.to_string(),
            path: path.to_path_buf(),
            last_modified: modified.into(),
        })
    }

    pub fn file_name(&self) -> &str {
        self.path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
    }

    /// Copy this save into `<dir>/.backup/` under a timestamped name.
    pub fn backup(&self) -> Result<PathBuf, SyncError> {
        let dir = self
            .path
            .parent()
            .map(|p| p.join(BACKUP_DIR))
            .unwrap_or_else(|| PathBuf::from(BACKUP_DIR));
        std::fs::create_dir_all(&dir)?;
        let dest = dir.join(timestamped_file_name(self.file_name(), Local::now()));
        std::fs::copy(&self.path, &dest)?;
        log::debug!("Backed up {} to {}", self.path.display(), dest.display());
        Ok(dest)
    }
}

/// `game.sav` at 2024-03-01 14:05:09 becomes `game [2024-03-01 14-05-09].sav`.
pub fn timestamped_file_name(file_name: &str, at: DateTime<Local>) -> String {
    let stamp = at.format("%Y-%m-%d %H-%M-%S");
    match file_name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => format!("{base} [{stamp}].{ext}"),
        _ => format!("{file_name} [{stamp}]"),
    }
}

/// The most recently updated remote save. Equal timestamps go to the
/// highest save id, then to the earliest in the list.
pub fn latest_remote_save(remote: &[Save]) -> Option<&Save> {
    remote.iter().reduce(|best, candidate| {
        if (candidate.updated_at, candidate.id) > (best.updated_at, best.id) {
            candidate
        } else {
            best
        }
    })
}

/// Decide which way a save should travel.
pub fn decide(local: Option<&LocalSave>, remote: &[Save]) -> SyncDecision {
    match (local, latest_remote_save(remote)) {
        (None, None) => SyncDecision::Skip,
        (Some(_), None) => SyncDecision::Upload,
        (None, Some(_)) => SyncDecision::Download,
        (Some(local), Some(latest)) => match local.last_modified.cmp(&latest.updated_at) {
            std::cmp::Ordering::Less => SyncDecision::Download,
            std::cmp::Ordering::Equal => SyncDecision::Skip,
            std::cmp::Ordering::Greater => SyncDecision::Upload,
        },
    }
}

/// Save files of one platform, keyed by extension-stripped file name.
///
/// Directories are read in parallel. When two directories hold the same
/// name, the more recently modified file wins.
pub fn find_save_files(platform_slug: &str, dirs: &[PathBuf]) -> HashMap<String, LocalSave> {
    let found: Vec<Vec<LocalSave>> = std::thread::scope(|scope| {
        let handles: Vec<_> = dirs
            .iter()
            .map(|dir| scope.spawn(move || read_save_dir(platform_slug, dir)))
            .collect();
        handles
            .into_iter()
            .filter_map(|h| h.join().ok())
            .collect()
    });

    let mut saves: HashMap<String, LocalSave> = HashMap::new();
    for save in found.into_iter().flatten() {
        let key = cache_key(save.file_name()).to_string();
        match saves.get(&key) {
            Some(existing) if existing.last_modified >= save.last_modified => {}
            _ => {
                saves.insert(key, save);
            }
        }
    }
    saves
}

fn read_save_dir(platform_slug: &str, dir: &Path) -> Vec<LocalSave> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Cannot read save directory {}: {}", dir.display(), e);
            }
            return Vec::new();
        }
    };
    let mut saves = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !path.is_file() {
            continue;
        }
        match LocalSave::from_path(platform_slug, &path) {
            Ok(save) => saves.push(save),
            Err(e) => log::warn!("Skipping save {}: {}", path.display(), e),
        }
    }
    saves
}

/// Directory a downloaded save for `platform_slug` is written to, created
/// if needed.
///
/// A configured save directory wins; otherwise the layout folder whose name
/// contains the save's emulator, otherwise the first layout folder.
pub fn save_directory_for(
    paths: &DevicePaths,
    platform_slug: &str,
    emulator: Option<&str>,
) -> Result<PathBuf, SyncError> {
    let dirs = paths.platform_save_dirs(platform_slug);
    let by_emulator = emulator.filter(|e| !e.is_empty()).and_then(|emulator| {
        let emulator = emulator.to_lowercase();
        dirs.iter().find(|dir| {
            dir.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.to_lowercase().contains(&emulator))
        })
    });
    let dir = by_emulator
        .or_else(|| dirs.first())
        .cloned()
        .ok_or_else(|| SyncError::NoSaveDirectory(platform_slug.to_string()))?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
#[path = "tests/saves_tests.rs"]
mod tests;
