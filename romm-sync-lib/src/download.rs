//! ROM downloads into the device's platform folders.

use std::path::PathBuf;

use romm_sync_client::{CatalogApi, Rom, rom_content_path};

use crate::catalog_cache::CatalogCache;
use crate::error::SyncError;
use crate::paths::DevicePaths;

/// Where a ROM lands on the device.
pub fn rom_destination(paths: &DevicePaths, rom: &Rom) -> PathBuf {
    paths.platform_rom_dir(&rom.platform_slug).join(&rom.fs_name)
}

/// Download `rom` into its platform folder and record it in the cache so
/// the next scan resolves it without asking the server.
pub async fn download_rom<A: CatalogApi>(
    api: &A,
    paths: &DevicePaths,
    cache: &CatalogCache,
    rom: &Rom,
) -> Result<(PathBuf, u64), SyncError> {
    if rom.platform_slug.is_empty() {
        return Err(SyncError::config(format!(
            "{} has no platform slug",
            rom.display_name()
        )));
    }
    let dest = rom_destination(paths, rom);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    log::debug!("Downloading {} to {}", rom.display_name(), dest.display());
    let bytes = api.download_content(&rom_content_path(rom), &dest).await?;
    cache.store(&rom.platform_slug, &rom.fs_name, rom.id, rom.display_name());
    Ok((dest, bytes))
}
