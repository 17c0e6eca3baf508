use std::time::{Duration, SystemTime};

use chrono::TimeZone;

use super::*;
use crate::fake_api::save;
use romm_sync_core::DeviceLayout;

fn local_at(secs: i64) -> LocalSave {
    LocalSave {
        platform_slug: "gba".to_string(),
        path: PathBuf::from("/saves/game.sav"),
        last_modified: Utc.timestamp_opt(secs, 0).unwrap(),
    }
}

fn touch(path: &Path, secs_after_epoch: u64) {
    std::fs::write(path, b"save").unwrap();
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch))
        .unwrap();
}

#[test]
fn nothing_anywhere_is_skipped() {
    assert_eq!(decide(None, &[]), SyncDecision::Skip);
}

#[test]
fn local_only_uploads_and_remote_only_downloads() {
    assert_eq!(decide(Some(&local_at(100)), &[]), SyncDecision::Upload);
    assert_eq!(decide(None, &[save(1, 1, "game.sav", 100)]), SyncDecision::Download);
}

#[test]
fn newest_remote_decides_direction() {
    let remote = [
        save(1, 1, "game.sav", 100),
        save(2, 1, "game.sav", 300),
        save(3, 1, "game.sav", 200),
    ];
    assert_eq!(decide(Some(&local_at(250)), &remote), SyncDecision::Download);
    assert_eq!(decide(Some(&local_at(300)), &remote), SyncDecision::Skip);
    assert_eq!(decide(Some(&local_at(301)), &remote), SyncDecision::Upload);
}

#[test]
fn decisions_are_repeatable() {
    let remote = [save(4, 1, "a.sav", 50), save(5, 1, "a.sav", 50)];
    let local = local_at(20);
    let first = decide(Some(&local), &remote);
    for _ in 0..10 {
        assert_eq!(decide(Some(&local), &remote), first);
    }
}

#[test]
fn timestamp_ties_go_to_the_highest_id() {
    let remote = [
        save(7, 1, "a.sav", 500),
        save(9, 1, "b.sav", 500),
        save(8, 1, "c.sav", 500),
        save(10, 1, "d.sav", 400),
    ];
    assert_eq!(latest_remote_save(&remote).unwrap().id, 9);
    assert!(latest_remote_save(&[]).is_none());
}

#[test]
fn timestamped_name_keeps_extension() {
    let at = Local.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap();
    assert_eq!(
        timestamped_file_name("Pokemon Emerald.sav", at),
        "Pokemon Emerald [2024-03-01 14-05-09].sav"
    );
    assert_eq!(timestamped_file_name("noext", at), "noext [2024-03-01 14-05-09]");
}

#[test]
fn backup_copies_into_hidden_folder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.srm");
    std::fs::write(&path, b"progress").unwrap();
    let local = LocalSave::from_path("snes", &path).unwrap();

    let backup = local.backup().unwrap();

    assert_eq!(backup.parent().unwrap(), dir.path().join(BACKUP_DIR));
    assert!(backup.file_name().unwrap().to_string_lossy().starts_with("game ["));
    assert_eq!(std::fs::read(&backup).unwrap(), b"progress");
    assert!(path.exists());
}

#[test]
fn find_save_files_merges_dirs_newest_wins() {
    let root = tempfile::tempdir().unwrap();
    let a = root.path().join("mGBA");
    let b = root.path().join("gpSP");
    std::fs::create_dir_all(&a).unwrap();
    std::fs::create_dir_all(&b).unwrap();
    touch(&a.join("zelda.sav"), 1_000);
    touch(&b.join("zelda.srm"), 2_000);
    touch(&b.join("metroid.sav"), 1_500);
    touch(&b.join(".hidden.sav"), 1_500);

    let missing = root.path().join("nope");
    let saves = find_save_files("gba", &[a, b.clone(), missing]);

    assert_eq!(saves.len(), 2);
    assert_eq!(saves["zelda"].path, b.join("zelda.srm"));
    assert_eq!(saves["metroid"].platform_slug, "gba");
}

#[test]
fn save_directory_prefers_emulator_folder() {
    let base = tempfile::tempdir().unwrap();
    let paths = DevicePaths::new(DeviceLayout::MuOs, base.path());

    let dir = save_directory_for(&paths, "gba", Some("gpsp")).unwrap();
    assert_eq!(dir, paths.save_root.join("gpSP"));
    assert!(dir.is_dir());

    let dir = save_directory_for(&paths, "gba", None).unwrap();
    assert_eq!(dir, paths.save_root.join("mGBA"));

    assert!(matches!(
        save_directory_for(&paths, "unknown-platform", None),
        Err(SyncError::NoSaveDirectory(_))
    ));
}

#[test]
fn configured_save_directory_wins() {
    let base = tempfile::tempdir().unwrap();
    let mut mappings = std::collections::BTreeMap::new();
    mappings.insert(
        "gba".to_string(),
        crate::settings::DirectoryMapping {
            relative_path: String::new(),
            save_directory: "Custom GBA".to_string(),
        },
    );
    let paths = DevicePaths::new(DeviceLayout::MuOs, base.path()).with_mappings(mappings);

    let dir = save_directory_for(&paths, "gba", Some("mgba")).unwrap();
    assert_eq!(dir, paths.save_root.join("Custom GBA"));
}
