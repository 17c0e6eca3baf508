//! Cache-and-sync core of romm-sync.
//!
//! Keeps a per-platform catalog cache fresh in the background, scans the
//! device for ROMs and saves, decides and performs save sync, and verifies
//! and fetches BIOS files.

pub mod bios;
pub mod catalog_cache;
pub mod download;
pub mod error;
pub mod freshness;
pub mod hasher;
mod locks;
pub mod paths;
pub mod refresh;
pub mod saves;
pub mod scanner;
pub mod settings;
pub mod sync;

#[cfg(test)]
#[path = "tests/fake_api.rs"]
mod fake_api;

pub use bios::{BiosFileReport, BiosFileStatus, BiosVerifier, MatchStrategy, match_firmware};
pub use catalog_cache::{CacheEntry, CatalogCache};
pub use error::SyncError;
pub use freshness::SignatureStore;
pub use paths::DevicePaths;
pub use refresh::{CoordinatorHandle, PrefetchOutcome, RefreshCoordinator, partition_key};
pub use saves::{LocalSave, SyncDecision, decide};
pub use scanner::{LocalRomFile, scan_all, scan_platform};
pub use settings::Config;
pub use sync::{SaveSync, SyncReport};
