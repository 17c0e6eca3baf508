//! Save sync execution.
//!
//! For each scanned ROM with a remote identifier: fetch its remote saves,
//! decide a direction, then upload or download. Downloads over an existing
//! save back it up first. A dry run only plans.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use romm_sync_client::{SaveApi, Save};

use crate::error::SyncError;
use crate::paths::DevicePaths;
use crate::saves::{LocalSave, SyncDecision, decide, find_save_files, latest_remote_save, save_directory_for};
use crate::scanner::LocalRomFile;

/// What happened to one ROM's save.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub platform_slug: String,
    pub rom_name: String,
    pub decision: SyncDecision,
    /// Local file written or uploaded from.
    pub path: Option<PathBuf>,
    pub error: Option<String>,
}

impl SyncResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub uploaded: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// ROMs the server could not identify.
    pub unresolved: usize,
    /// Local saves with no scanned ROM of the same name.
    pub unmatched_saves: Vec<LocalSave>,
    pub results: Vec<SyncResult>,
}

impl SyncReport {
    fn record(&mut self, result: SyncResult) {
        match (result.succeeded(), result.decision) {
            (false, _) => self.failed += 1,
            (true, SyncDecision::Skip) => self.skipped += 1,
            (true, SyncDecision::Upload) => self.uploaded += 1,
            (true, SyncDecision::Download) => self.downloaded += 1,
        }
        self.results.push(result);
    }
}

pub struct SaveSync<'a, A> {
    api: &'a A,
    paths: &'a DevicePaths,
    platforms: Vec<String>,
    dry_run: bool,
}

impl<'a, A: SaveApi> SaveSync<'a, A> {
    pub fn new(api: &'a A, paths: &'a DevicePaths) -> Self {
        Self {
            api,
            paths,
            platforms: Vec::new(),
            dry_run: false,
        }
    }

    /// Platforms that were scanned. Their save folders are checked for
    /// orphans even when no ROM was found on them.
    pub fn platforms<S: Into<String>>(mut self, slugs: impl IntoIterator<Item = S>) -> Self {
        self.platforms = slugs.into_iter().map(Into::into).collect();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sync every ROM, attaching remote saves as it goes.
    pub async fn run(&self, roms: &mut [LocalRomFile]) -> SyncReport {
        let mut report = SyncReport {
            unmatched_saves: unmatched_saves(self.paths, &self.platforms, roms),
            ..SyncReport::default()
        };
        for rom in roms.iter_mut() {
            let Some(rom_id) = rom.identifier else {
                log::debug!("{}: not in the catalog, skipping", rom.file_name);
                report.unresolved += 1;
                continue;
            };
            match self.api.list_saves(rom_id).await {
                Ok(saves) => rom.remote_saves = saves,
                Err(e) => {
                    log::warn!("{}: failed to list saves: {}", rom.display_name(), e);
                    report.record(failure(rom, SyncDecision::Skip, &SyncError::from(e)));
                    continue;
                }
            }
            let result = self.sync_rom(rom).await;
            report.record(result);
        }
        log::debug!(
            "Sync: {} up, {} down, {} skipped, {} failed",
            report.uploaded,
            report.downloaded,
            report.skipped,
            report.failed
        );
        report
    }

    /// Apply the decision for one ROM whose remote saves are attached.
    pub async fn sync_rom(&self, rom: &LocalRomFile) -> SyncResult {
        let decision = decide(rom.local_save.as_ref(), &rom.remote_saves);
        let outcome = match decision {
            SyncDecision::Skip => Ok(rom.local_save.as_ref().map(|s| s.path.clone())),
            SyncDecision::Upload => self.upload(rom).await.map(Some),
            SyncDecision::Download => self.download(rom).await.map(Some),
        };
        match outcome {
            Ok(path) => {
                if decision != SyncDecision::Skip {
                    log::debug!("{}: {}", rom.display_name(), decision);
                }
                SyncResult {
                    platform_slug: rom.platform_slug.clone(),
                    rom_name: rom.display_name().to_string(),
                    decision,
                    path,
                    error: None,
                }
            }
            Err(e) => {
                log::warn!("{}: {} failed: {}", rom.display_name(), decision, e);
                failure(rom, decision, &e)
            }
        }
    }

    async fn upload(&self, rom: &LocalRomFile) -> Result<PathBuf, SyncError> {
        let (Some(rom_id), Some(save)) = (rom.identifier, rom.local_save.as_ref()) else {
            return Err(SyncError::Unresolved(rom.file_name.clone()));
        };
        if !self.dry_run {
            let emulator = emulator_of(&save.path);
            self.api.upload_save(rom_id, emulator.as_deref(), &save.path).await?;
        }
        Ok(save.path.clone())
    }

    async fn download(&self, rom: &LocalRomFile) -> Result<PathBuf, SyncError> {
        let Some(remote) = latest_remote_save(&rom.remote_saves) else {
            return Err(SyncError::Unresolved(rom.file_name.clone()));
        };
        let dest = match &rom.local_save {
            Some(local) => local.path.clone(),
            None => self.new_save_path(rom, remote, !self.dry_run)?,
        };
        if self.dry_run {
            return Ok(dest);
        }
        if let Some(local) = &rom.local_save {
            local.backup()?;
        }
        self.api.download_content(&remote.content_path(), &dest).await?;
        // Match the server's timestamp so the next run sees the two as equal.
        let file = std::fs::File::options().write(true).open(&dest)?;
        file.set_modified(remote.updated_at.into())?;
        Ok(dest)
    }

    /// Where a save with no local counterpart goes: the ROM's base name with
    /// the remote file's extension, in the platform's save folder.
    fn new_save_path(&self, rom: &LocalRomFile, remote: &Save, create: bool) -> Result<PathBuf, SyncError> {
        let dir = if create {
            save_directory_for(self.paths, &rom.platform_slug, remote.emulator.as_deref())?
        } else {
            self.paths
                .platform_save_dirs(&rom.platform_slug)
                .into_iter()
                .next()
                .ok_or_else(|| SyncError::NoSaveDirectory(rom.platform_slug.clone()))?
        };
        let file_name = match remote.file_name.rsplit_once('.') {
            Some((_, ext)) => format!("{}.{}", rom.base_name(), ext),
            None => rom.base_name().to_string(),
        };
        Ok(dir.join(file_name))
    }
}

fn failure(rom: &LocalRomFile, decision: SyncDecision, error: &SyncError) -> SyncResult {
    SyncResult {
        platform_slug: rom.platform_slug.clone(),
        rom_name: rom.display_name().to_string(),
        decision,
        path: None,
        error: Some(error.to_string()),
    }
}

/// Save folders on some layouts are named after the emulator that wrote them.
fn emulator_of(save: &Path) -> Option<String> {
    save.parent()?
        .file_name()?
        .to_str()
        .map(String::from)
}

/// Local saves, across the scanned platforms, that no scanned ROM claims.
///
/// `platforms` lists the scanned slugs; platforms of `roms` are included
/// as well.
pub fn unmatched_saves(
    paths: &DevicePaths,
    platforms: &[String],
    roms: &[LocalRomFile],
) -> Vec<LocalSave> {
    let mut claimed: BTreeMap<&str, HashSet<&str>> = platforms
        .iter()
        .map(|slug| (slug.as_str(), HashSet::new()))
        .collect();
    for rom in roms {
        claimed
            .entry(rom.platform_slug.as_str())
            .or_default()
            .insert(rom.base_name());
    }
    let mut unmatched = Vec::new();
    for (slug, names) in &claimed {
        let mut saves: Vec<(String, LocalSave)> = find_save_files(slug, &paths.platform_save_dirs(slug))
            .into_iter()
            .filter(|(key, _)| !names.contains(key.as_str()))
            .collect();
        saves.sort_by(|a, b| a.0.cmp(&b.0));
        unmatched.extend(saves.into_iter().map(|(_, save)| save));
    }
    unmatched
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
