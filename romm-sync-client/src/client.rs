use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{ClientError, ConnectionErrorKind};
use crate::types::{CatalogSignature, Firmware, Host, Platform, Rom, RomPage, Save};

/// HTTP client for the RomM API, authenticated with basic auth.
pub struct RommClient {
    pub(crate) http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl RommClient {
    pub fn new(host: &Host, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = host.base_url();
        if crate::types::Scheme::of_url(&base_url).is_none() {
            return Err(ClientError::invalid_url(format!(
                "{base_url} must start with http:// or https://"
            )));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            username: host.username.clone(),
            password: host.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let sep = if path.starts_with('/') { "" } else { "/" };
        format!("{}{}{}", self.base_url, sep, path)
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let resp = self.get(path).query(query).send().await?;
        let resp = check_status(resp).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            log::debug!(
                "Failed to parse {} response: {}. Response: {}",
                path,
                e,
                &text[..floor_char_boundary(&text, 200)]
            );
            ClientError::Json(e)
        })
    }

    pub async fn platforms(&self) -> Result<Vec<Platform>, ClientError> {
        self.get_json("/api/platforms", &[]).await
    }

    /// One page of a platform's catalog. Pages are 1-based.
    pub async fn roms_page(
        &self,
        platform_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<RomPage, ClientError> {
        let query = [
            ("platform_id", platform_id.to_string()),
            ("page", page.to_string()),
            ("limit", page_size.to_string()),
            ("offset", (u64::from(page.saturating_sub(1)) * u64::from(page_size)).to_string()),
            ("order_by", "name".to_string()),
            ("order_dir", "asc".to_string()),
        ];
        self.get_json("/api/roms", &query).await
    }

    /// Item count and newest update of a platform, from a single-item page.
    pub async fn catalog_signature(&self, platform_id: u64) -> Result<CatalogSignature, ClientError> {
        let query = [
            ("platform_id", platform_id.to_string()),
            ("page", "1".to_string()),
            ("limit", "1".to_string()),
            ("order_by", "updated_at".to_string()),
            ("order_dir", "desc".to_string()),
        ];
        let page: RomPage = self.get_json("/api/roms", &query).await?;
        Ok(CatalogSignature {
            total: page.total,
            latest_update: page.items.first().map(|r| r.updated_at),
        })
    }

    pub async fn rom(&self, rom_id: u64) -> Result<Rom, ClientError> {
        self.get_json(&format!("/api/roms/{rom_id}"), &[]).await
    }

    /// Find a ROM by the SHA-1 of its content. `None` when the server has no match.
    pub async fn rom_by_hash(&self, sha1: &str) -> Result<Option<Rom>, ClientError> {
        match self
            .get_json("/api/roms/by-hash", &[("sha1_hash", sha1.to_string())])
            .await
        {
            Ok(rom) => Ok(Some(rom)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn firmware(&self, platform_id: u64) -> Result<Vec<Firmware>, ClientError> {
        self.get_json("/api/firmware", &[("platform_id", platform_id.to_string())])
            .await
    }

    pub async fn saves(&self, rom_id: u64) -> Result<Vec<Save>, ClientError> {
        self.get_json("/api/saves", &[("rom_id", rom_id.to_string())])
            .await
    }

    /// Upload a local save for a ROM.
    pub async fn upload_save(
        &self,
        rom_id: u64,
        emulator: Option<&str>,
        path: &Path,
    ) -> Result<Save, ClientError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::invalid_url(format!("bad save path {}", path.display())))?
            .to_string();
        let data = std::fs::read(path)?;
        let part = reqwest::multipart::Part::bytes(data).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("saveFile", part);

        let mut query = vec![("rom_id", rom_id.to_string())];
        if let Some(emulator) = emulator {
            query.push(("emulator", emulator.to_string()));
        }

        let resp = self.post("/api/saves").query(&query).multipart(form).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }
}

/// Server-relative content path for a ROM, with the file name percent-encoded.
pub fn rom_content_path(rom: &Rom) -> String {
    let id = rom.id.to_string();
    encoded_path(&["api", "roms", id.as_str(), "content", rom.fs_name.as_str()])
}

fn encoded_path(segments: &[&str]) -> String {
    let Ok(mut url) = reqwest::Url::parse("http://localhost/") else {
        return format!("/{}", segments.join("/"));
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url.path().to_string()
}

/// Turn a non-success response into an error.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ClientError::not_found(resp.url().path().to_string()));
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ConnectionErrorKind::Unauthorized.into());
    }
    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(ConnectionErrorKind::Forbidden.into());
    }
    let text = resp.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        message: text[..floor_char_boundary(&text, 200)].to_string(),
    })
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut end = s.len().min(max);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
