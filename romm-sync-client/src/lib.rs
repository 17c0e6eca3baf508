//! RomM server client: wire types, connection classification, and the
//! catalog/save API used by the sync core.

pub mod api;
pub mod classify;
pub mod client;
pub mod download;
pub mod error;
pub mod transport;
pub mod types;

pub use api::{CatalogApi, SaveApi};
pub use classify::{authenticate, login, preflight, switch_scheme, validate_connection};
pub use client::{RommClient, rom_content_path};
pub use error::{ClientError, ConnectionErrorKind};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    CatalogSignature, Firmware, Host, Platform, Rom, RomFile, RomPage, Save, Scheme,
};
