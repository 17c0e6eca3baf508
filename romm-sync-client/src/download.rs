//! Streaming downloads with partial-file cleanup.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::client::{RommClient, check_status};
use crate::error::ClientError;

/// Sibling path a download is written to before it is complete.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

fn discard(part: &Path) {
    if let Err(e) = std::fs::remove_file(part) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to remove partial download {}: {}", part.display(), e);
        }
    }
}

impl RommClient {
    /// Download server content at `path` to `dest`, returning the byte count.
    ///
    /// Bytes stream into `<dest>.part`, which is renamed over `dest` once the
    /// body is complete and removed on any failure.
    pub async fn download_to(&self, path: &str, dest: &Path) -> Result<u64, ClientError> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let part = part_path(dest);
        let written = match self.stream_to(path, &part).await {
            Ok(n) => n,
            Err(e) => {
                discard(&part);
                return Err(e);
            }
        };
        if let Err(e) = std::fs::rename(&part, dest) {
            discard(&part);
            return Err(e.into());
        }
        log::debug!("Downloaded {} bytes to {}", written, dest.display());
        Ok(written)
    }

    async fn stream_to(&self, path: &str, part: &Path) -> Result<u64, ClientError> {
        let resp = self.get(path).send().await?;
        let mut resp = check_status(resp).await?;
        let mut out = BufWriter::new(File::create(part)?);
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            out.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        out.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
#[path = "tests/download_tests.rs"]
mod tests;
