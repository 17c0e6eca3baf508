//! Traits the sync core uses to reach the server.
//!
//! `RommClient` implements both; tests substitute in-memory fakes.

use std::future::Future;
use std::path::Path;

use crate::client::RommClient;
use crate::error::ClientError;
use crate::types::{CatalogSignature, Firmware, Rom, RomPage, Save};

pub trait CatalogApi: Send + Sync {
    /// One page of a platform's catalog. Pages are 1-based.
    fn list_roms(
        &self,
        platform_id: u64,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<RomPage, ClientError>> + Send;

    fn catalog_signature(
        &self,
        platform_id: u64,
    ) -> impl Future<Output = Result<CatalogSignature, ClientError>> + Send;

    fn list_firmware(
        &self,
        platform_id: u64,
    ) -> impl Future<Output = Result<Vec<Firmware>, ClientError>> + Send;

    fn rom_by_hash(
        &self,
        sha1: &str,
    ) -> impl Future<Output = Result<Option<Rom>, ClientError>> + Send;

    /// Download server content to `dest`, leaving nothing behind on failure.
    fn download_content(
        &self,
        path: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<u64, ClientError>> + Send;
}

pub trait SaveApi: CatalogApi {
    fn list_saves(&self, rom_id: u64) -> impl Future<Output = Result<Vec<Save>, ClientError>> + Send;

    fn upload_save(
        &self,
        rom_id: u64,
        emulator: Option<&str>,
        path: &Path,
    ) -> impl Future<Output = Result<Save, ClientError>> + Send;
}

impl CatalogApi for RommClient {
    async fn list_roms(&self, platform_id: u64, page: u32, page_size: u32) -> Result<RomPage, ClientError> {
        self.roms_page(platform_id, page, page_size).await
    }

    async fn catalog_signature(&self, platform_id: u64) -> Result<CatalogSignature, ClientError> {
        RommClient::catalog_signature(self, platform_id).await
    }

    async fn list_firmware(&self, platform_id: u64) -> Result<Vec<Firmware>, ClientError> {
        self.firmware(platform_id).await
    }

    async fn rom_by_hash(&self, sha1: &str) -> Result<Option<Rom>, ClientError> {
        RommClient::rom_by_hash(self, sha1).await
    }

    async fn download_content(&self, path: &str, dest: &Path) -> Result<u64, ClientError> {
        self.download_to(path, dest).await
    }
}

impl SaveApi for RommClient {
    async fn list_saves(&self, rom_id: u64) -> Result<Vec<Save>, ClientError> {
        self.saves(rom_id).await
    }

    async fn upload_save(&self, rom_id: u64, emulator: Option<&str>, path: &Path) -> Result<Save, ClientError> {
        RommClient::upload_save(self, rom_id, emulator, path).await
    }
}
