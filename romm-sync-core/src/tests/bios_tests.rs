use super::*;

#[test]
fn embedded_tables_parse() {
    let tables = BiosTables::embedded().unwrap();
    assert!(!tables.cores_for_platform("gba").is_empty());
    assert!(tables.core("mgba_libretro").is_some());
}

#[test]
fn core_names_are_normalized() {
    assert_eq!(normalize_core_name("mgba_libretro"), "mgba");
    assert_eq!(normalize_core_name("mgba"), "mgba");
    let tables = BiosTables::embedded().unwrap();
    assert_eq!(tables.core("gpsp_libretro").unwrap().core_name, "gpsp");
}

#[test]
fn required_files_dedupe_by_file_name_first_wins() {
    let platform_cores = r#"{"gba": ["a_libretro", "b_libretro"]}"#;
    let core_bios = r#"{
        "a": {"display_name": "A", "files": [
            {"file_name": "gba_bios.bin", "relative_path": "gba_bios.bin", "md5": "AAAA", "optional": true}
        ]},
        "b": {"display_name": "B", "files": [
            {"file_name": "gba_bios.bin", "relative_path": "other/gba_bios.bin", "md5": "bbbb"},
            {"file_name": "extra.bin", "relative_path": "extra.bin"}
        ]}
    }"#;
    let tables = BiosTables::from_json(platform_cores, core_bios).unwrap();
    let files = tables.required_files("gba");
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].relative_path, "gba_bios.bin");
    assert_eq!(files[0].checksum.as_deref(), Some("aaaa"));
    assert!(files[0].optional);
    assert_eq!(files[1].file_name, "extra.bin");
    assert_eq!(files[1].checksum, None);
}

#[test]
fn unknown_platform_and_core_yield_nothing() {
    let tables =
        BiosTables::from_json(r#"{"x": ["missing_libretro"]}"#, r#"{}"#).unwrap();
    assert!(tables.required_files("x").is_empty());
    assert!(tables.required_files("nope").is_empty());
}

#[test]
fn empty_checksum_becomes_none() {
    let tables = BiosTables::embedded().unwrap();
    let files = tables.required_files("neogeo");
    assert_eq!(files[0].file_name, "neogeo.zip");
    assert_eq!(files[0].checksum, None);
}

#[test]
fn override_directory_replaces_embedded_table() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(PLATFORM_CORES_FILE),
        r#"{"gba": ["gpsp_libretro"]}"#,
    )
    .unwrap();

    let tables = BiosTables::load(Some(dir.path())).unwrap();
    assert_eq!(tables.cores_for_platform("gba"), ["gpsp_libretro".to_string()]);
    // The core table was not overridden, so the embedded one is used.
    assert!(tables.core("gpsp").is_some());
    assert!(tables.cores_for_platform("psx").is_empty());
}

#[test]
fn malformed_override_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CORE_BIOS_FILE), "{not json").unwrap();
    let err = BiosTables::load(Some(dir.path())).unwrap_err();
    assert!(matches!(err, CoreError::Json { .. }));
}
