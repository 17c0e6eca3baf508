//! Catalog entry cache.
//!
//! Maps a local file name (extension stripped) to the remote ROM it
//! corresponds to, one JSON file per platform under the cache root. The
//! in-memory maps are authoritative for the life of the process: disk is
//! read once per partition and written after every change, and any disk
//! failure only costs a log line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::locks;

/// Subdirectory of the cache root holding partition files.
pub const CACHE_SUBDIR: &str = "roms";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub identifier: u64,
    pub name: String,
    pub cached_at: DateTime<Utc>,
}

/// On-disk shape of one partition.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PartitionFile {
    #[serde(default)]
    entries: HashMap<String, CacheEntry>,
}

#[derive(Default)]
struct PartitionState {
    entries: HashMap<String, CacheEntry>,
    /// Bumped on every mutation; orders snapshots for persistence.
    generation: u64,
}

struct Partition {
    state: RwLock<PartitionState>,
    /// Generation of the snapshot last written to disk.
    persisted: Mutex<u64>,
}

/// Strip the extension from the final component of a file name.
pub fn cache_key(file_name: &str) -> &str {
    let start = file_name.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match file_name[start..].rfind('.') {
        Some(dot) => &file_name[..start + dot],
        None => file_name,
    }
}

pub struct CatalogCache {
    dir: PathBuf,
    partitions: RwLock<HashMap<String, Arc<OnceLock<Partition>>>>,
}

impl CatalogCache {
    /// Cache stored in `dir` (usually `<cache root>/roms`).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// Cache stored in the standard subdirectory of a cache root.
    pub fn in_root(cache_root: &Path) -> Self {
        Self::new(cache_root.join(CACHE_SUBDIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn lookup(&self, partition: &str, file_name: &str) -> Option<CacheEntry> {
        let slot = self.slot(partition);
        let part = self.materialize(&slot, partition);
        let state = locks::read(&part.state);
        state.entries.get(cache_key(file_name)).cloned()
    }

    pub fn store(&self, partition: &str, file_name: &str, identifier: u64, name: &str) {
        self.store_many(
            partition,
            std::iter::once((file_name.to_string(), identifier, name.to_string())),
        );
    }

    /// Insert a batch of `(file name, identifier, name)` and persist once.
    pub fn store_many(
        &self,
        partition: &str,
        entries: impl IntoIterator<Item = (String, u64, String)>,
    ) -> usize {
        let slot = self.slot(partition);
        let part = self.materialize(&slot, partition);

        let (snapshot, generation, count) = {
            let mut state = locks::write(&part.state);
            let now = Utc::now();
            let mut count = 0;
            for (file_name, identifier, name) in entries {
                state.entries.insert(
                    cache_key(&file_name).to_string(),
                    CacheEntry {
                        identifier,
                        name,
                        cached_at: now,
                    },
                );
                count += 1;
            }
            state.generation += 1;
            let snapshot = PartitionFile {
                entries: state.entries.clone(),
            };
            (snapshot, state.generation, count)
        };

        self.persist(partition, part, &snapshot, generation);
        count
    }

    /// Number of entries in a partition.
    pub fn len(&self, partition: &str) -> usize {
        let slot = self.slot(partition);
        let part = self.materialize(&slot, partition);
        locks::read(&part.state).entries.len()
    }

    /// Whether any partition file exists on disk.
    pub fn has_cache(&self) -> bool {
        !self.partition_files().is_empty()
    }

    /// Partition names with a file on disk, sorted.
    pub fn cached_partitions(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .partition_files()
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        names
    }

    /// Drop every partition, in memory and on disk. Returns files removed.
    pub fn clear(&self) -> std::io::Result<usize> {
        locks::write(&self.partitions).clear();
        let mut removed = 0;
        for path in self.partition_files() {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
        log::debug!("Cleared {} catalog cache files", removed);
        Ok(removed)
    }

    fn partition_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect()
    }

    fn path_for(&self, partition: &str) -> PathBuf {
        let safe: String = partition
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    fn slot(&self, partition: &str) -> Arc<OnceLock<Partition>> {
        if let Some(slot) = locks::read(&self.partitions).get(partition) {
            return Arc::clone(slot);
        }
        let mut partitions = locks::write(&self.partitions);
        Arc::clone(partitions.entry(partition.to_string()).or_default())
    }

    /// Load the partition on first use. Concurrent first users of one
    /// partition wait for a single load; other partitions are unaffected.
    fn materialize<'a>(&self, slot: &'a OnceLock<Partition>, partition: &str) -> &'a Partition {
        slot.get_or_init(|| Partition {
            state: RwLock::new(PartitionState {
                entries: self.load(partition),
                generation: 0,
            }),
            persisted: Mutex::new(0),
        })
    }

    fn load(&self, partition: &str) -> HashMap<String, CacheEntry> {
        let path = self.path_for(partition);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No catalog cache for {}", partition);
                return HashMap::new();
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                return HashMap::new();
            }
        };
        match serde_json::from_str::<PartitionFile>(&contents) {
            Ok(file) => {
                log::debug!(
                    "Loaded {} cached entries for {}",
                    file.entries.len(),
                    partition
                );
                file.entries
            }
            Err(e) => {
                log::warn!("Ignoring corrupt catalog cache {}: {}", path.display(), e);
                HashMap::new()
            }
        }
    }

    fn persist(&self, partition: &str, part: &Partition, snapshot: &PartitionFile, generation: u64) {
        let mut persisted = locks::lock(&part.persisted);
        if *persisted >= generation {
            // A newer snapshot is already on disk.
            return;
        }
        let path = self.path_for(partition);
        match write_atomic(&path, snapshot) {
            Ok(()) => *persisted = generation,
            Err(e) => log::warn!("Failed to save catalog cache {}: {}", path.display(), e),
        }
    }
}

fn write_atomic(path: &Path, snapshot: &PartitionFile) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(snapshot).map_err(std::io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
#[path = "tests/catalog_cache_tests.rs"]
mod tests;
