use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// URL scheme of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Http => Self::Https,
            Self::Https => Self::Http,
        }
    }

    /// Scheme of an absolute URL, if it is http or https.
    pub fn of_url(url: &str) -> Option<Self> {
        let (scheme, _) = url.split_once("://")?;
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured RomM server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    #[serde(default)]
    pub display_name: String,
    pub root_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Host {
    /// Base URL with the port appended and no trailing slash.
    pub fn base_url(&self) -> String {
        let root = self.root_uri.trim_end_matches('/');
        match self.port {
            Some(port) if !has_explicit_port(root) => format!("{root}:{port}"),
            _ => root.to_string(),
        }
    }

    /// Name to show the user: the display name, or the URL when unset.
    pub fn label(&self) -> String {
        if self.display_name.is_empty() {
            self.base_url()
        } else {
            self.display_name.clone()
        }
    }
}

fn has_explicit_port(url: &str) -> bool {
    let authority = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let authority = authority.split('/').next().unwrap_or(authority);
    authority
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
}

// Passwords never reach the log.
impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("display_name", &self.display_name)
            .field("root_uri", &self.root_uri)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .finish()
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "********" }
}

/// A platform (partition) in the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub fs_slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rom_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomFile {
    pub file_name: String,
    #[serde(default)]
    pub file_size_bytes: u64,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rom {
    pub id: u64,
    #[serde(default)]
    pub platform_id: u64,
    #[serde(default)]
    pub platform_slug: String,
    #[serde(default)]
    pub name: String,
    pub fs_name: String,
    #[serde(default)]
    pub fs_size_bytes: u64,
    #[serde(default)]
    pub sha1_hash: Option<String>,
    #[serde(default)]
    pub files: Vec<RomFile>,
    pub updated_at: DateTime<Utc>,
}

impl Rom {
    /// Name for display, falling back to the file name.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.fs_name
        } else {
            &self.name
        }
    }
}

/// One page of `/api/roms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomPage {
    #[serde(default)]
    pub items: Vec<Rom>,
    #[serde(default)]
    pub total: u64,
}

/// Cheap "has this partition changed" signal: item count plus the newest
/// update timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSignature {
    pub total: u64,
    pub latest_update: Option<DateTime<Utc>>,
}

impl CatalogSignature {
    /// Signature describing a complete set of items.
    pub fn of_roms(roms: &[Rom]) -> Self {
        Self {
            total: roms.len() as u64,
            latest_update: roms.iter().map(|r| r.updated_at).max(),
        }
    }
}

/// A firmware file hosted by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firmware {
    pub id: u64,
    #[serde(default)]
    pub platform_id: u64,
    pub file_name: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub file_size_bytes: u64,
    #[serde(default)]
    pub md5_hash: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl Firmware {
    /// Server-relative path the file content is served from.
    pub fn content_path(&self) -> String {
        match self.download_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("/api/firmware/{}/content/{}", self.id, self.file_name),
        }
    }
}

/// A save file stored on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Save {
    pub id: u64,
    pub rom_id: u64,
    pub file_name: String,
    #[serde(default)]
    pub emulator: Option<String>,
    #[serde(default)]
    pub file_size_bytes: u64,
    #[serde(default)]
    pub download_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Save {
    /// Server-relative path the save content is served from.
    pub fn content_path(&self) -> String {
        match self.download_path.as_deref() {
            Some(path) if !path.is_empty() => path.to_string(),
            _ => format!("/api/saves/{}/content/{}", self.id, self.file_name),
        }
    }
}
