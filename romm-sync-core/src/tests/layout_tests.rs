use std::path::Path;

use super::*;

#[test]
fn short_names_round_trip() {
    for &layout in DeviceLayout::all() {
        let parsed: DeviceLayout = layout.short_name().parse().unwrap();
        assert_eq!(parsed, layout);
    }
}

#[test]
fn parsing_is_case_insensitive() {
    assert_eq!("MUOS".parse::<DeviceLayout>().unwrap(), DeviceLayout::MuOs);
    assert_eq!("NextUI".parse::<DeviceLayout>().unwrap(), DeviceLayout::NextUi);
    assert_eq!(" knulli ".parse::<DeviceLayout>().unwrap(), DeviceLayout::Knulli);
}

#[test]
fn unknown_layout_is_rejected() {
    let err = "onion".parse::<DeviceLayout>().unwrap_err();
    assert!(err.to_string().contains("onion"));
}

#[test]
fn parse_tag_takes_last_parenthesised_group() {
    assert_eq!(parse_tag("Game Boy Advance (GBA)"), Some("GBA"));
    assert_eq!(parse_tag("Arcade (Neo) (FBN)"), Some("FBN"));
    assert_eq!(parse_tag("Sega CD (SEGACD) "), Some("SEGACD"));
}

#[test]
fn parse_tag_rejects_untagged_names() {
    assert_eq!(parse_tag("gba"), None);
    assert_eq!(parse_tag("Empty ()"), None);
    assert_eq!(parse_tag("Trailing (GBA) text"), None);
}

#[test]
fn only_nextui_groups_by_tag() {
    assert_eq!(DeviceLayout::NextUi.grouping(), FolderGrouping::TagGrouped);
    assert_eq!(DeviceLayout::MuOs.grouping(), FolderGrouping::Direct);
    assert_eq!(DeviceLayout::Knulli.grouping(), FolderGrouping::Direct);
}

#[test]
fn nextui_tags_are_deduplicated() {
    let tags = DeviceLayout::NextUi.platform_tags("gba");
    assert_eq!(tags, vec!["GBA", "MGBA"]);
    assert!(DeviceLayout::Knulli.platform_tags("gba").is_empty());
}

#[test]
fn default_platform_dir_falls_back_to_lowercase_slug() {
    assert_eq!(DeviceLayout::Knulli.default_platform_dir("genesis"), "megadrive");
    assert_eq!(DeviceLayout::Knulli.default_platform_dir("Virtual-Boy"), "virtual-boy");
}

#[test]
fn roots_follow_layout_conventions() {
    let base = Path::new("/sd");
    assert_eq!(DeviceLayout::NextUi.rom_root(base), Path::new("/sd/Roms"));
    assert_eq!(DeviceLayout::Knulli.rom_root(base), Path::new("/sd/roms"));
    assert_eq!(DeviceLayout::MuOs.rom_root(base), Path::new(MUOS_ROMS_UNION));
    assert_eq!(
        DeviceLayout::MuOs.save_root(base),
        Path::new("/sd/MUOS/save/file")
    );
    assert_eq!(DeviceLayout::NextUi.save_root(base), Path::new("/sd/Saves"));
}

#[test]
fn nextui_bios_dirs_include_tag_folders_then_root() {
    let dirs = DeviceLayout::NextUi.bios_dirs(Path::new("/sd"), "gba");
    assert_eq!(
        dirs,
        vec![
            Path::new("/sd/Bios/GBA").to_path_buf(),
            Path::new("/sd/Bios/MGBA").to_path_buf(),
            Path::new("/sd/Bios").to_path_buf(),
        ]
    );
}

#[test]
fn every_platform_has_save_dirs() {
    for &layout in DeviceLayout::all() {
        for slug in layout.platform_slugs() {
            assert!(
                !layout.save_dirs(slug).is_empty(),
                "{} has no save dirs for {}",
                layout,
                slug
            );
        }
    }
}
