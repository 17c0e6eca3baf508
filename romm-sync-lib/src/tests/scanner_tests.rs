use std::collections::BTreeMap;

use super::*;
use crate::fake_api::{FakeApi, rom};
use crate::settings::DirectoryMapping;
use romm_sync_core::DeviceLayout;

#[test]
fn skips_non_content_files() {
    for name in [
        ".hidden.gba",
        "readme.txt",
        "cover.PNG",
        "game.sav",
        "game.state",
        "list.m3u",
        "Thumbs.db",
        "desktop.ini",
        ".DS_Store",
        "game.zip.part",
    ] {
        assert!(should_skip_file(name), "{name} should be skipped");
    }
    for name in ["game.zip", "Tetris.gb", "disc.chd", "noext"] {
        assert!(!should_skip_file(name), "{name} should be kept");
    }
}

#[test]
fn rom_with_matching_save_and_readme() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("game.zip"), b"rom bytes").unwrap();
    std::fs::write(dir.path().join("game.sav"), b"save bytes").unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"hello").unwrap();

    let saves = find_save_files("gba", &[dir.path().to_path_buf()]);
    let roms = scan_rom_directory("gba", dir.path(), &saves);

    assert_eq!(roms.len(), 1);
    let rom = &roms[0];
    assert_eq!(rom.file_name, "game.zip");
    assert_eq!(rom.platform_slug, "gba");
    assert_eq!(rom.sha1.as_deref(), Some(hasher::sha1_reader(&mut &b"rom bytes"[..]).unwrap().as_str()));
    let save = rom.local_save.as_ref().unwrap();
    assert_eq!(save.path, dir.path().join("game.sav"));
    assert!(rom.identifier.is_none());
}

#[test]
fn missing_rom_folder_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let roms = scan_rom_directory("gba", &dir.path().join("absent"), &HashMap::new());
    assert!(roms.is_empty());
}

#[test]
fn direct_layout_uses_platform_folder_and_save_dirs() {
    let base = tempfile::tempdir().unwrap();
    let paths = DevicePaths::new(DeviceLayout::Knulli, base.path());
    let gba = paths.rom_root.join("gba");
    std::fs::create_dir_all(&gba).unwrap();
    std::fs::write(gba.join("b.gba"), b"b").unwrap();
    std::fs::write(gba.join("a.gba"), b"a").unwrap();
    let saves = paths.save_root.join("gba");
    std::fs::create_dir_all(&saves).unwrap();
    std::fs::write(saves.join("a.srm"), b"save").unwrap();

    let roms = scan_platform(&paths, "gba");

    let names: Vec<&str> = roms.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, ["a.gba", "b.gba"]);
    assert!(roms[0].local_save.is_some());
    assert!(roms[1].local_save.is_none());
}

#[test]
fn tag_grouped_layout_matches_folders_by_tag() {
    let base = tempfile::tempdir().unwrap();
    let mut mappings = BTreeMap::new();
    mappings.insert(
        "gb".to_string(),
        DirectoryMapping {
            relative_path: "My Handheld (MYGB)".to_string(),
            save_directory: String::new(),
        },
    );
    let paths = DevicePaths::new(DeviceLayout::NextUi, base.path()).with_mappings(mappings);
    for folder in [
        "Game Boy Advance (GBA)",
        "GBA Hacks (MGBA)",
        "My Handheld (MYGB)",
        "Game Boy (GB)",
        "Untagged",
    ] {
        let dir = paths.rom_root.join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{folder}.bin")), folder.as_bytes()).unwrap();
    }

    let results = scan_all(&paths, &["gba", "gb", "psx"]);

    let names = |slug: &str| -> Vec<String> {
        results[slug].iter().map(|r| r.file_name.clone()).collect()
    };
    assert_eq!(names("gba"), ["GBA Hacks (MGBA).bin", "Game Boy Advance (GBA).bin"]);
    assert_eq!(names("gb"), ["Game Boy (GB).bin", "My Handheld (MYGB).bin"]);
    assert!(results["psx"].is_empty());
}

#[tokio::test]
async fn identifiers_come_from_cache_then_hash_lookup() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cached.gba"), b"one").unwrap();
    std::fs::write(dir.path().join("hashed.gba"), b"two").unwrap();
    std::fs::write(dir.path().join("unknown.gba"), b"three").unwrap();
    let cache = CatalogCache::new(dir.path().join("cache"));
    cache.store("gba", "cached.zip", 11, "Cached Game");

    let api = FakeApi::default();
    let two = hasher::sha1_reader(&mut &b"two"[..]).unwrap();
    let mut remote = rom(22, "hashed.gba", 0);
    remote.name = "Hashed Game".to_string();
    api.by_hash.lock().unwrap().insert(two, remote);

    let mut roms = scan_rom_directory("gba", dir.path(), &HashMap::new());
    roms.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    let resolved = resolve_identifiers(&api, &cache, &mut roms).await;

    assert_eq!(resolved, 2);
    assert_eq!(roms[0].identifier, Some(11));
    assert_eq!(roms[0].display_name(), "Cached Game");
    assert_eq!(roms[1].identifier, Some(22));
    assert_eq!(roms[2].identifier, None);
    assert_eq!(roms[2].display_name(), "unknown");
    // Cache hit skips the server; the two misses each cost one lookup.
    assert_eq!(api.hash_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(cache.lookup("gba", "hashed.gba").unwrap().identifier, 22);
}
