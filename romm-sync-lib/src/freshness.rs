//! Persisted catalog signatures.
//!
//! Records the signature each partition had when it was last fetched in
//! full, so freshness survives restarts. Same fail-open rules as the
//! catalog cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use romm_sync_client::CatalogSignature;

use crate::locks;

pub const SIGNATURES_FILE: &str = "freshness.json";

pub struct SignatureStore {
    path: PathBuf,
    signatures: RwLock<HashMap<String, CatalogSignature>>,
    file: Mutex<()>,
}

impl SignatureStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let signatures = load(&path);
        Self {
            path,
            signatures: RwLock::new(signatures),
            file: Mutex::new(()),
        }
    }

    pub fn in_root(cache_root: &Path) -> Self {
        Self::open(cache_root.join(SIGNATURES_FILE))
    }

    pub fn get(&self, key: &str) -> Option<CatalogSignature> {
        locks::read(&self.signatures).get(key).cloned()
    }

    pub fn record(&self, key: &str, signature: CatalogSignature) {
        let _file = locks::lock(&self.file);
        let snapshot = {
            let mut map = locks::write(&self.signatures);
            map.insert(key.to_string(), signature);
            map.clone()
        };
        self.persist(&snapshot);
    }

    pub fn forget(&self, key: &str) {
        let _file = locks::lock(&self.file);
        let snapshot = {
            let mut map = locks::write(&self.signatures);
            if map.remove(key).is_none() {
                return;
            }
            map.clone()
        };
        self.persist(&snapshot);
    }

    pub fn clear(&self) -> std::io::Result<()> {
        let _file = locks::lock(&self.file);
        locks::write(&self.signatures).clear();
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Callers hold `file`, so snapshots reach disk in mutation order.
    fn persist(&self, snapshot: &HashMap<String, CatalogSignature>) {
        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(snapshot).map_err(std::io::Error::other)?;
            let tmp = self.path.with_extension("json.tmp");
            std::fs::write(&tmp, json)?;
            std::fs::rename(&tmp, &self.path)
        })();
        if let Err(e) = result {
            log::warn!("Failed to save {}: {}", self.path.display(), e);
        }
    }
}

fn load(path: &Path) -> HashMap<String, CatalogSignature> {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    serde_json::from_str(&contents).unwrap_or_else(|e| {
        log::warn!("Ignoring corrupt {}: {}", path.display(), e);
        HashMap::new()
    })
}
