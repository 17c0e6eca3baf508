use super::*;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("config.toml")).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.api_timeout(), Duration::from_secs(30));
    assert_eq!(config.log_level, "info");
}

#[test]
fn parses_hosts_and_mappings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
layout = "nextui"
api_timeout_secs = 12

[[hosts]]
display_name = "Home"
root_uri = "http://romm.local"
port = 8080
username = "me"
password = "secret"

[directory_mappings.gba]
relative_path = "Game Boy Advance (MGBA)"
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.layout.as_deref(), Some("nextui"));
    assert_eq!(config.api_timeout_secs, 12);
    assert_eq!(config.download_timeout_secs, 600);
    let host = config.primary_host().unwrap();
    assert_eq!(host.base_url(), "http://romm.local:8080");
    let mapping = config.mapping("gba").unwrap();
    assert_eq!(mapping.relative_path, "Game Boy Advance (MGBA)");
    assert!(mapping.save_directory.is_empty());
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "hosts = 3\n[[").unwrap();
    assert!(matches!(
        Config::load(&path),
        Err(SyncError::ConfigParse { .. })
    ));
}

#[test]
fn save_round_trips_and_creates_parents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let mut config = Config::default();
    config.layout = Some("knulli".to_string());
    config.directory_mappings.insert(
        "psx".to_string(),
        DirectoryMapping {
            relative_path: "playstation".to_string(),
            save_directory: String::new(),
        },
    );
    config.save(&path).unwrap();
    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn display_string_masks_passwords() {
    let mut config = Config::default();
    config.hosts.push(Host {
        display_name: "Home".to_string(),
        root_uri: "http://h".to_string(),
        port: None,
        username: "me".to_string(),
        password: "secret".to_string(),
    });
    let shown = config.to_display_string().unwrap();
    assert!(!shown.contains("secret"));
    assert!(shown.contains("********"));
}

#[test]
fn explicit_cache_dir_wins() {
    let config = Config {
        cache_dir: Some(PathBuf::from("/tmp/romm-cache")),
        ..Config::default()
    };
    assert_eq!(config.cache_root(), PathBuf::from("/tmp/romm-cache"));
}
