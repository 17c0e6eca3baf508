use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romm_sync_lib::scanner::resolve_identifiers;
use romm_sync_lib::{DevicePaths, LocalRomFile, scan_all};

use crate::CliError;
use crate::cli_types::PlatformArgs;
use crate::context::{AppContext, runtime};
use crate::spinner::spinner;

/// Slugs to walk: the ones asked for, or every platform the layout knows.
pub(crate) fn platform_slugs(paths: &DevicePaths, args: &PlatformArgs) -> Vec<String> {
    match &args.platforms {
        Some(slugs) => slugs.clone(),
        None => {
            let mut slugs: Vec<String> = Vec::new();
            for slug in paths.layout.platform_slugs() {
                if !slugs.iter().any(|s| s == slug) {
                    slugs.push(slug.to_string());
                }
            }
            slugs
        }
    }
}

/// Scan the device and resolve what can be resolved.
///
/// With `offline`, only the catalog cache is consulted.
pub(crate) fn scan_device(
    ctx: &AppContext,
    paths: &DevicePaths,
    args: &PlatformArgs,
    offline: bool,
) -> Result<Vec<LocalRomFile>, CliError> {
    let slugs = platform_slugs(paths, args);
    let slug_refs: Vec<&str> = slugs.iter().map(String::as_str).collect();

    let pb = spinner(format!("Scanning {}...", paths.rom_root.display()), ctx.quiet);
    let mut roms: Vec<LocalRomFile> = scan_all(paths, &slug_refs).into_values().flatten().collect();
    pb.finish_and_clear();

    let cache = ctx.cache();
    if offline {
        for rom in &mut roms {
            if let Some(entry) = cache.lookup(&rom.platform_slug, &rom.file_name) {
                rom.identifier = Some(entry.identifier);
                rom.name = Some(entry.name);
            }
        }
    } else {
        let client = ctx.client()?;
        let rt = runtime()?;
        let pb = spinner("Matching ROMs against the server...", ctx.quiet);
        rt.block_on(resolve_identifiers(&client, &cache, &mut roms));
        pb.finish_and_clear();
    }
    Ok(roms)
}

pub(crate) fn run_scan(ctx: &AppContext, args: PlatformArgs, offline: bool) -> Result<(), CliError> {
    let paths = ctx.paths()?;
    let roms = scan_device(ctx, &paths, &args, offline)?;

    if roms.is_empty() {
        log::info!(
            "{}",
            format!("No ROMs found under {}", paths.rom_root.display())
                .if_supports_color(Stdout, |t| t.dimmed()),
        );
        return Ok(());
    }

    let mut current = "";
    for rom in &roms {
        if rom.platform_slug != current {
            current = &rom.platform_slug;
            log::info!("");
            log::info!("{}", current.if_supports_color(Stdout, |t| t.bold()));
        }
        let id = match rom.identifier {
            Some(id) => format!("#{id}").if_supports_color(Stdout, |t| t.cyan()).to_string(),
            None => "unmatched".if_supports_color(Stdout, |t| t.dimmed()).to_string(),
        };
        let save = if rom.local_save.is_some() { " [save]" } else { "" };
        log::info!("  {} ({}){}", rom.display_name(), id, save);
    }

    let matched = roms.iter().filter(|r| r.identifier.is_some()).count();
    let with_saves = roms.iter().filter(|r| r.local_save.is_some()).count();
    log::info!("");
    log::info!(
        "Total: {} ROMs, {} matched, {} with saves",
        roms.len(),
        matched,
        with_saves
    );
    Ok(())
}
