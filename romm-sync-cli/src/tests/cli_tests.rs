use clap::Parser;
use log::LevelFilter;

use romm_sync_client::Platform;
use romm_sync_core::{BiosFile, DeviceLayout};
use romm_sync_lib::{BiosFileReport, BiosFileStatus, DevicePaths};

use crate::cli_types::{Cli, Commands, PlatformArgs};
use crate::commands::bios::missing_required;
use crate::commands::cache::format_bytes;
use crate::commands::scan::platform_slugs;
use crate::context::select_platforms;
use crate::logging::level_for;

fn platform(id: u64, slug: &str) -> Platform {
    Platform {
        id,
        slug: slug.to_string(),
        fs_slug: slug.to_string(),
        name: slug.to_uppercase(),
        rom_count: 0,
    }
}

#[test]
fn quiet_beats_verbose_and_config() {
    assert_eq!(level_for(true, true, "trace"), LevelFilter::Warn);
    assert_eq!(level_for(false, true, "warn"), LevelFilter::Debug);
    assert_eq!(level_for(false, false, "error"), LevelFilter::Error);
    assert_eq!(level_for(false, false, "nonsense"), LevelFilter::Info);
}

#[test]
fn select_platforms_filters_by_slug() {
    let all = vec![platform(1, "gba"), platform(2, "psx"), platform(3, "snes")];
    let wanted = vec!["psx".to_string(), "gba".to_string()];

    let picked = select_platforms(all.clone(), Some(&wanted)).unwrap();
    let ids: Vec<u64> = picked.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);

    assert_eq!(select_platforms(all, None).unwrap().len(), 3);
}

#[test]
fn select_platforms_rejects_unknown_slug() {
    let all = vec![platform(1, "gba")];
    let wanted = vec!["n64".to_string()];
    let err = select_platforms(all, Some(&wanted)).unwrap_err();
    assert!(err.to_string().contains("n64"));
}

#[test]
fn platform_slugs_default_to_layout_without_duplicates() {
    let paths = DevicePaths::new(DeviceLayout::MuOs, "/mnt/sdcard");
    let slugs = platform_slugs(&paths, &PlatformArgs { platforms: None });
    assert!(!slugs.is_empty());
    let mut deduped = slugs.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), slugs.len());

    let chosen = platform_slugs(
        &paths,
        &PlatformArgs {
            platforms: Some(vec!["gba".to_string()]),
        },
    );
    assert_eq!(chosen, vec!["gba".to_string()]);
}

#[test]
fn format_bytes_scales_units() {
    assert_eq!(format_bytes(512), "512 B");
    assert_eq!(format_bytes(2048), "2.0 KB");
    assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
}

#[test]
fn sync_parses_platform_list_and_dry_run() {
    let cli = Cli::try_parse_from(["romm-sync", "sync", "-p", "gba,psx", "-n"]).unwrap();
    match cli.command {
        Commands::Sync { platforms, dry_run } => {
            assert!(dry_run);
            assert_eq!(
                platforms.platforms,
                Some(vec!["gba".to_string(), "psx".to_string()])
            );
        }
        _ => panic!("expected sync"),
    }
}

#[test]
fn global_flags_follow_subcommand() {
    let cli = Cli::try_parse_from(["romm-sync", "bios", "psx", "--download", "--quiet"]).unwrap();
    assert!(cli.quiet);
    assert!(matches!(cli.command, Commands::Bios { ref slug, download: true } if slug == "psx"));
}

fn report(name: &str, optional: bool, status: BiosFileStatus) -> BiosFileReport {
    BiosFileReport {
        file: BiosFile {
            file_name: name.to_string(),
            relative_path: name.to_string(),
            checksum: None,
            description: String::new(),
            optional,
        },
        status,
        found_at: None,
    }
}

#[test]
fn optional_bios_files_are_left_out_of_the_count() {
    let reports = vec![
        report("scph5501.bin", false, BiosFileStatus::Missing),
        report("scph5500.bin", false, BiosFileStatus::Valid),
        report("scph5502.bin", true, BiosFileStatus::Missing),
    ];
    assert_eq!(missing_required(&reports), (1, 2));
}
