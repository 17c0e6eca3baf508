use chrono::{TimeZone, Utc};

use super::*;
use crate::download::part_path;
use crate::types::Scheme;

fn host(root: &str, port: Option<u16>) -> Host {
    Host {
        display_name: String::new(),
        root_uri: root.to_string(),
        port,
        username: "admin".to_string(),
        password: "hunter2".to_string(),
    }
}

#[test]
fn base_url_appends_port_once() {
    assert_eq!(host("http://romm.local/", Some(8080)).base_url(), "http://romm.local:8080");
    assert_eq!(host("http://romm.local:8080", Some(8080)).base_url(), "http://romm.local:8080");
    assert_eq!(host("https://romm.local", None).base_url(), "https://romm.local");
}

#[test]
fn host_debug_masks_password() {
    let rendered = format!("{:?}", host("http://h", None));
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("********"));
}

#[test]
fn client_rejects_schemeless_host() {
    let err = RommClient::new(&host("romm.local", None), Duration::from_secs(1)).err();
    assert!(matches!(err, Some(ClientError::InvalidUrl(_))));
}

#[test]
fn client_joins_relative_paths() {
    let client = RommClient::new(&host("http://h:1/", None), Duration::from_secs(1)).unwrap();
    assert_eq!(client.url("/api/roms"), "http://h:1/api/roms");
    assert_eq!(client.url("api/roms"), "http://h:1/api/roms");
    assert_eq!(client.url("https://cdn/x"), "https://cdn/x");
}

#[test]
fn rom_content_path_encodes_file_name() {
    let rom: Rom = serde_json::from_str(
        r#"{"id": 7, "fs_name": "Metroid #1 (USA).zip", "updated_at": "2024-05-01T10:00:00Z"}"#,
    )
    .unwrap();
    assert_eq!(rom_content_path(&rom), "/api/roms/7/content/Metroid%20%231%20(USA).zip");
}

#[test]
fn rom_page_parses_with_missing_optional_fields() {
    let page: RomPage = serde_json::from_str(
        r#"{"items": [{"id": 1, "name": "Tetris", "fs_name": "Tetris.gb",
            "updated_at": "2024-05-01T10:00:00Z", "unknown_field": true}],
            "total": 1, "limit": 50, "offset": 0}"#,
    )
    .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].display_name(), "Tetris");
    assert!(page.items[0].sha1_hash.is_none());
}

#[test]
fn signature_of_roms_uses_newest_update() {
    let mk = |id, secs| Rom {
        id,
        platform_id: 1,
        platform_slug: String::new(),
        name: String::new(),
        fs_name: format!("{id}.gb"),
        fs_size_bytes: 0,
        sha1_hash: None,
        files: Vec::new(),
        updated_at: Utc.timestamp_opt(secs, 0).unwrap(),
    };
    let sig = CatalogSignature::of_roms(&[mk(1, 100), mk(2, 300), mk(3, 200)]);
    assert_eq!(sig.total, 3);
    assert_eq!(sig.latest_update, Some(Utc.timestamp_opt(300, 0).unwrap()));
    assert_eq!(CatalogSignature::of_roms(&[]).latest_update, None);
}

#[test]
fn firmware_and_save_content_paths() {
    let fw: Firmware =
        serde_json::from_str(r#"{"id": 3, "file_name": "gba_bios.bin"}"#).unwrap();
    assert_eq!(fw.content_path(), "/api/firmware/3/content/gba_bios.bin");

    let save: Save = serde_json::from_str(
        r#"{"id": 9, "rom_id": 1, "file_name": "a.sav", "download_path": "/api/raw/assets/a.sav",
            "updated_at": "2024-05-01T10:00:00Z"}"#,
    )
    .unwrap();
    assert_eq!(save.content_path(), "/api/raw/assets/a.sav");
}

#[test]
fn scheme_of_url() {
    assert_eq!(Scheme::of_url("HTTPS://x"), Some(Scheme::Https));
    assert_eq!(Scheme::of_url("http://x"), Some(Scheme::Http));
    assert_eq!(Scheme::of_url("x"), None);
}

#[test]
fn part_path_is_a_sibling() {
    let p = part_path(std::path::Path::new("/roms/gba/game.zip"));
    assert_eq!(p, std::path::Path::new("/roms/gba/game.zip.part"));
}

#[test]
fn error_kinds_from_status() {
    let err = ClientError::Status {
        status: 503,
        message: String::new(),
    };
    assert_eq!(err.kind(), ConnectionErrorKind::ServerError);
    assert_eq!(
        ClientError::from(ConnectionErrorKind::Forbidden).kind(),
        ConnectionErrorKind::Forbidden
    );
}
