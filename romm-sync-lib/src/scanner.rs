//! Local filesystem scanner.
//!
//! Walks the device's ROM folders, skipping non-content files, hashes each
//! ROM and pairs it with a local save of the same base name.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use romm_sync_client::{CatalogApi, Save};
use romm_sync_core::{FolderGrouping, parse_tag};

use crate::catalog_cache::{CatalogCache, cache_key};
use crate::hasher;
use crate::paths::DevicePaths;
use crate::saves::{LocalSave, find_save_files};

const SKIPPED_EXTENSIONS: &[&str] = &[
    "txt", "nfo", "diz", "db", "ini", "cfg", "conf", "jpg", "jpeg", "png", "gif", "bmp", "m3u",
    "cue", "srm", "sav", "state", "part",
];

const SKIPPED_NAMES: &[&str] = &["desktop.ini", "thumbs.db", ".ds_store"];

/// A ROM found on the device.
#[derive(Debug, Clone)]
pub struct LocalRomFile {
    /// Remote identifier, once resolved.
    pub identifier: Option<u64>,
    /// Remote display name, once resolved.
    pub name: Option<String>,
    pub platform_slug: String,
    pub path: PathBuf,
    pub file_name: String,
    /// Lowercase hex SHA-1, absent when the file could not be read.
    pub sha1: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub remote_saves: Vec<Save>,
    pub local_save: Option<LocalSave>,
}

impl LocalRomFile {
    /// File name without its extension.
    pub fn base_name(&self) -> &str {
        cache_key(&self.file_name)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.base_name())
    }
}

/// Whether a directory entry is something other than game content.
pub fn should_skip_file(file_name: &str) -> bool {
    if file_name.starts_with('.') {
        return true;
    }
    let lower = file_name.to_lowercase();
    if SKIPPED_NAMES.contains(&lower.as_str()) {
        return true;
    }
    match lower.rsplit_once('.') {
        Some((_, ext)) => SKIPPED_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Scan one platform.
pub fn scan_platform(paths: &DevicePaths, platform_slug: &str) -> Vec<LocalRomFile> {
    scan_all(paths, &[platform_slug])
        .remove(platform_slug)
        .unwrap_or_default()
}

/// Scan several platforms, bucketed by slug. Platforms with no folder on
/// the device get an empty bucket.
pub fn scan_all(paths: &DevicePaths, platform_slugs: &[&str]) -> BTreeMap<String, Vec<LocalRomFile>> {
    let mut results = BTreeMap::new();
    for (slug, dirs) in rom_dirs(paths, platform_slugs) {
        let saves = find_save_files(&slug, &paths.platform_save_dirs(&slug));
        let mut roms = Vec::new();
        for dir in dirs {
            roms.extend(scan_rom_directory(&slug, &dir, &saves));
        }
        roms.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        log::debug!("{}: {} ROMs, {} saves", slug, roms.len(), saves.len());
        results.insert(slug, roms);
    }
    results
}

/// ROM folders per platform.
fn rom_dirs(paths: &DevicePaths, platform_slugs: &[&str]) -> Vec<(String, Vec<PathBuf>)> {
    match paths.layout.grouping() {
        FolderGrouping::Direct => platform_slugs
            .iter()
            .map(|slug| (slug.to_string(), vec![paths.platform_rom_dir(slug)]))
            .collect(),
        FolderGrouping::TagGrouped => tagged_rom_dirs(paths, platform_slugs),
    }
}

/// Match every folder under the ROM root by its tag against each
/// platform's tags, plus the tag of a configured folder.
fn tagged_rom_dirs(paths: &DevicePaths, platform_slugs: &[&str]) -> Vec<(String, Vec<PathBuf>)> {
    let tags: Vec<(String, Vec<String>)> = platform_slugs
        .iter()
        .map(|slug| {
            let mut tags: Vec<String> = paths
                .layout
                .platform_tags(slug)
                .into_iter()
                .map(String::from)
                .collect();
            if let Some(tag) = paths.mapping(slug).and_then(|m| parse_tag(&m.relative_path)) {
                if !tags.iter().any(|t| t == tag) {
                    tags.push(tag.to_string());
                }
            }
            (slug.to_string(), tags)
        })
        .collect();

    let mut dirs: Vec<(String, Vec<PathBuf>)> =
        tags.iter().map(|(slug, _)| (slug.clone(), Vec::new())).collect();
    let entries = match std::fs::read_dir(&paths.rom_root) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot read ROM root {}: {}", paths.rom_root.display(), e);
            return dirs;
        }
    };
    let mut folders: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    folders.sort();

    for folder in folders {
        let Some(tag) = folder.file_name().and_then(|n| n.to_str()).and_then(parse_tag) else {
            continue;
        };
        for ((_, platform_tags), (_, bucket)) in tags.iter().zip(dirs.iter_mut()) {
            if platform_tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                bucket.push(folder.clone());
            }
        }
    }
    dirs
}

/// Scan one folder's ROMs, pairing each with a save from `saves`.
///
/// Unreadable entries are logged and skipped.
pub fn scan_rom_directory(
    platform_slug: &str,
    dir: &Path,
    saves: &HashMap<String, LocalSave>,
) -> Vec<LocalRomFile> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                log::debug!("{}: no ROM folder at {}", platform_slug, dir.display());
            } else {
                log::warn!("Cannot read {}: {}", dir.display(), e);
            }
            return Vec::new();
        }
    };

    let mut roms = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if should_skip_file(&file_name) || !path.is_file() {
            continue;
        }
        let last_modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t.into(),
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let sha1 = match hasher::sha1_file(&path) {
            Ok(hash) => Some(hash),
            Err(e) => {
                log::warn!("Failed to hash {}: {}", path.display(), e);
                None
            }
        };
        let local_save = saves.get(cache_key(&file_name)).cloned();
        roms.push(LocalRomFile {
            identifier: None,
            name: None,
            platform_slug: platform_slug.to_string(),
            path,
            file_name,
            sha1,
            last_modified,
            remote_saves: Vec::new(),
            local_save,
        });
    }
    roms
}

/// Fill in remote identifiers: from the catalog cache first, then by hash
/// lookup against the server, writing hits back to the cache. Returns how
/// many ROMs ended up resolved.
pub async fn resolve_identifiers<A: CatalogApi>(
    api: &A,
    cache: &CatalogCache,
    roms: &mut [LocalRomFile],
) -> usize {
    let mut resolved = 0;
    for rom in roms.iter_mut() {
        if rom.identifier.is_none() {
            if let Some(entry) = cache.lookup(&rom.platform_slug, &rom.file_name) {
                rom.identifier = Some(entry.identifier);
                rom.name = Some(entry.name);
            }
        }
        if rom.identifier.is_none() {
            if let Some(sha1) = rom.sha1.as_deref() {
                match api.rom_by_hash(sha1).await {
                    Ok(Some(remote)) => {
                        cache.store(&rom.platform_slug, &rom.file_name, remote.id, remote.display_name());
                        rom.identifier = Some(remote.id);
                        rom.name = Some(remote.display_name().to_string());
                    }
                    Ok(None) => log::debug!("{}: no remote match by hash", rom.file_name),
                    Err(e) => log::warn!("{}: hash lookup failed: {}", rom.file_name, e),
                }
            }
        }
        if rom.identifier.is_some() {
            resolved += 1;
        }
    }
    resolved
}

#[cfg(test)]
#[path = "tests/scanner_tests.rs"]
mod tests;
