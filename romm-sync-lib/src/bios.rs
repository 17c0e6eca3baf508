//! BIOS verification and download.
//!
//! Required files come from the static core tables; each one is looked for
//! in every BIOS folder the layout uses for the platform and checked
//! against its recorded MD5. Files the server hosts are matched to
//! requirements by name or path and written to every candidate location.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use romm_sync_client::{CatalogApi, Firmware, Platform};
use romm_sync_core::{BiosFile, BiosTables};

use crate::error::SyncError;
use crate::hasher;
use crate::paths::DevicePaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiosFileStatus {
    Missing,
    Valid,
    InvalidHash,
    /// Present, but no checksum is recorded to compare against.
    NoHashToVerify,
}

impl BiosFileStatus {
    /// Whether the file is usable as far as can be told.
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Missing)
    }
}

impl std::fmt::Display for BiosFileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Missing => "missing",
            Self::Valid => "valid",
            Self::InvalidHash => "checksum mismatch",
            Self::NoHashToVerify => "present (unverified)",
        })
    }
}

#[derive(Debug, Clone)]
pub struct BiosFileReport {
    pub file: BiosFile,
    pub status: BiosFileStatus,
    /// Where the file was found, if anywhere.
    pub found_at: Option<PathBuf>,
}

/// Every path `file` may live at, given a platform's BIOS folders: the
/// relative path under each folder, then the bare file name when it differs.
pub fn candidate_paths(file: &BiosFile, dirs: &[PathBuf]) -> Vec<PathBuf> {
    let relative = if file.relative_path.is_empty() {
        file.file_name.as_str()
    } else {
        file.relative_path.as_str()
    };
    let mut paths = Vec::new();
    for dir in dirs {
        for candidate in [dir.join(relative), dir.join(&file.file_name)] {
            if !paths.contains(&candidate) {
                paths.push(candidate);
            }
        }
    }
    paths
}

/// Status of `file` at the first candidate path that exists.
pub fn check_status(file: &BiosFile, candidates: &[PathBuf]) -> (BiosFileStatus, Option<PathBuf>) {
    let Some(found) = candidates.iter().find(|p| p.is_file()) else {
        return (BiosFileStatus::Missing, None);
    };
    let Some(expected) = file.checksum.as_deref() else {
        return (BiosFileStatus::NoHashToVerify, Some(found.clone()));
    };
    match hasher::md5_file(found) {
        Ok(actual) if actual.eq_ignore_ascii_case(expected) => {
            (BiosFileStatus::Valid, Some(found.clone()))
        }
        Ok(actual) => {
            log::debug!(
                "{}: expected md5 {}, found {}",
                found.display(),
                expected,
                actual
            );
            (BiosFileStatus::InvalidHash, Some(found.clone()))
        }
        Err(e) => {
            log::warn!("Cannot read {}: {}", found.display(), e);
            (BiosFileStatus::Missing, None)
        }
    }
}

/// Checks a device's BIOS files against the requirement tables.
pub struct BiosVerifier {
    tables: BiosTables,
    paths: DevicePaths,
}

impl BiosVerifier {
    pub fn new(tables: BiosTables, paths: DevicePaths) -> Self {
        Self { tables, paths }
    }

    pub fn tables(&self) -> &BiosTables {
        &self.tables
    }

    pub fn required_files(&self, platform_slug: &str) -> Vec<BiosFile> {
        self.tables.required_files(platform_slug)
    }

    pub fn candidate_paths(&self, file: &BiosFile, platform_slug: &str) -> Vec<PathBuf> {
        candidate_paths(file, &self.paths.bios_dirs(platform_slug))
    }

    pub fn status(&self, file: &BiosFile, platform_slug: &str) -> BiosFileStatus {
        check_status(file, &self.candidate_paths(file, platform_slug)).0
    }

    /// Status of every file the platform's cores need.
    pub fn verify_platform(&self, platform_slug: &str) -> Vec<BiosFileReport> {
        self.required_files(platform_slug)
            .into_iter()
            .map(|file| {
                let (status, found_at) =
                    check_status(&file, &self.candidate_paths(&file, platform_slug));
                BiosFileReport {
                    file,
                    status,
                    found_at,
                }
            })
            .collect()
    }
}

/// How a required file was paired with a server firmware entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    FileName,
    RelativePath,
    RemoteBaseName,
    RelativeBaseName,
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Lookup tables over a server firmware list. The first entry wins when
/// several share a key.
pub struct FirmwareIndex<'a> {
    by_name: HashMap<&'a str, &'a Firmware>,
    by_path: HashMap<&'a str, &'a Firmware>,
    by_base: HashMap<&'a str, &'a Firmware>,
}

impl<'a> FirmwareIndex<'a> {
    pub fn new(firmware: &'a [Firmware]) -> Self {
        let mut index = Self {
            by_name: HashMap::new(),
            by_path: HashMap::new(),
            by_base: HashMap::new(),
        };
        for fw in firmware {
            index.by_name.entry(fw.file_name.as_str()).or_insert(fw);
            if !fw.file_path.is_empty() {
                index.by_path.entry(fw.file_path.as_str()).or_insert(fw);
                index.by_base.entry(base_name(&fw.file_path)).or_insert(fw);
            }
        }
        index
    }

    /// Find the server entry for `file`, trying each strategy in order.
    pub fn find(&self, file: &BiosFile) -> Option<(&'a Firmware, MatchStrategy)> {
        if let Some(fw) = self.by_name.get(file.file_name.as_str()) {
            return Some((*fw, MatchStrategy::FileName));
        }
        if !file.relative_path.is_empty() {
            if let Some(fw) = self.by_path.get(file.relative_path.as_str()) {
                return Some((*fw, MatchStrategy::RelativePath));
            }
        }
        if let Some(fw) = self.by_base.get(file.file_name.as_str()) {
            return Some((*fw, MatchStrategy::RemoteBaseName));
        }
        self.by_base
            .get(base_name(&file.relative_path))
            .map(|fw| (*fw, MatchStrategy::RelativeBaseName))
    }
}

#[derive(Debug, Clone)]
pub struct FirmwareMatch<'a> {
    pub file: BiosFile,
    pub firmware: &'a Firmware,
    pub strategy: MatchStrategy,
}

#[derive(Debug, Clone, Default)]
pub struct FirmwareMatches<'a> {
    pub matched: Vec<FirmwareMatch<'a>>,
    pub unmatched: Vec<BiosFile>,
}

pub fn match_firmware<'a>(required: &[BiosFile], remote: &'a [Firmware]) -> FirmwareMatches<'a> {
    let index = FirmwareIndex::new(remote);
    let mut result = FirmwareMatches::default();
    for file in required {
        match index.find(file) {
            Some((firmware, strategy)) => {
                log::debug!("{}: matched {} by {:?}", file.file_name, firmware.file_name, strategy);
                result.matched.push(FirmwareMatch {
                    file: file.clone(),
                    firmware,
                    strategy,
                });
            }
            None => result.unmatched.push(file.clone()),
        }
    }
    result
}

/// Copy `source` to every target path, creating folders. Returns the paths
/// written.
pub fn save_bios_file(source: &Path, targets: &[PathBuf]) -> Result<Vec<PathBuf>, SyncError> {
    let mut written = Vec::with_capacity(targets.len());
    for target in targets {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(source, target)?;
        written.push(target.clone());
    }
    Ok(written)
}

#[derive(Debug, Default)]
pub struct BiosDownloadReport {
    /// File name and every path it was written to.
    pub downloaded: Vec<(String, Vec<PathBuf>)>,
    /// Already valid on the device.
    pub skipped: Vec<String>,
    /// Written despite an MD5 that differs from the expected one.
    pub checksum_mismatches: Vec<String>,
    pub unmatched: Vec<BiosFile>,
    pub failed: Vec<(String, String)>,
}

/// Download every required file the server has and the device lacks.
///
/// A checksum mismatch is reported and the file is still written.
pub async fn download_bios<A: CatalogApi>(
    api: &A,
    verifier: &BiosVerifier,
    platform: &Platform,
) -> Result<BiosDownloadReport, SyncError> {
    let required = verifier.required_files(&platform.slug);
    let remote = api.list_firmware(platform.id).await?;
    let matches = match_firmware(&required, &remote);

    let mut report = BiosDownloadReport {
        unmatched: matches.unmatched,
        ..BiosDownloadReport::default()
    };
    for m in matches.matched {
        let targets = verifier.candidate_paths(&m.file, &platform.slug);
        if check_status(&m.file, &targets).0 == BiosFileStatus::Valid {
            report.skipped.push(m.file.file_name.clone());
            continue;
        }
        match fetch_one(api, &m, &targets).await {
            Ok((written, checksum_ok)) => {
                if !checksum_ok {
                    report.checksum_mismatches.push(m.file.file_name.clone());
                }
                report.downloaded.push((m.file.file_name.clone(), written));
            }
            Err(e) => {
                log::warn!("{}: download failed: {}", m.file.file_name, e);
                report.failed.push((m.file.file_name.clone(), e.to_string()));
            }
        }
    }
    Ok(report)
}

async fn fetch_one<A: CatalogApi>(
    api: &A,
    m: &FirmwareMatch<'_>,
    targets: &[PathBuf],
) -> Result<(Vec<PathBuf>, bool), SyncError> {
    let Some(first) = targets.first() else {
        return Err(SyncError::config(format!(
            "no BIOS folder for {}",
            m.file.file_name
        )));
    };
    let tmp = first.with_file_name(format!(".{}.part", m.file.file_name));
    if let Some(parent) = tmp.parent() {
        std::fs::create_dir_all(parent)?;
    }
    api.download_content(&m.firmware.content_path(), &tmp).await?;

    let result = verify_and_store(m, &tmp, targets);
    if let Err(e) = std::fs::remove_file(&tmp) {
        log::debug!("Failed to remove {}: {}", tmp.display(), e);
    }
    result
}

fn verify_and_store(
    m: &FirmwareMatch<'_>,
    tmp: &Path,
    targets: &[PathBuf],
) -> Result<(Vec<PathBuf>, bool), SyncError> {
    let expected = m
        .file
        .checksum
        .as_deref()
        .or(m.firmware.md5_hash.as_deref())
        .filter(|c| !c.is_empty());
    let checksum_ok = match expected {
        Some(expected) => {
            let actual = hasher::md5_file(tmp)?;
            let ok = actual.eq_ignore_ascii_case(expected);
            if !ok {
                log::warn!(
                    "{}: MD5 mismatch (expected {}, got {})",
                    m.file.file_name,
                    expected,
                    actual
                );
            }
            ok
        }
        None => true,
    };
    let written = save_bios_file(tmp, targets)?;
    Ok((written, checksum_ok))
}

#[cfg(test)]
#[path = "tests/bios_tests.rs"]
mod tests;
