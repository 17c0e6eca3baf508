use std::sync::Arc;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romm_sync_lib::scanner::resolve_identifiers;
use romm_sync_lib::{RefreshCoordinator, SaveSync, SyncDecision, partition_key, scan_all};

use crate::CliError;
use crate::cli_types::PlatformArgs;
use crate::commands::scan::platform_slugs;
use crate::context::{AppContext, runtime};
use crate::spinner::spinner;

pub(crate) fn run_sync(ctx: &AppContext, args: PlatformArgs, dry_run: bool) -> Result<(), CliError> {
    let paths = ctx.paths()?;
    let client = Arc::new(ctx.download_client()?);
    let cache = ctx.cache();
    let slugs = platform_slugs(&paths, &args);
    let rt = runtime()?;

    let report = rt.block_on(async {
        // Warm the cache so most ROMs resolve without a hash lookup.
        let pb = spinner("Checking catalog...", ctx.quiet);
        let platforms: Vec<_> = client
            .platforms()
            .await?
            .into_iter()
            .filter(|p| slugs.contains(&p.slug))
            .collect();
        let (handle, startup) = RefreshCoordinator::launch(
            Arc::clone(&client),
            Arc::clone(&cache),
            ctx.signatures(),
            platforms.clone(),
        );
        startup
            .await
            .map_err(|e| CliError::runtime(format!("Refresh task failed: {}", e)))?;
        for platform in &platforms {
            if handle.is_fresh(&partition_key(platform.id)) != Some(true) {
                log::debug!("{}: catalog cache is stale, falling back to hash lookups", platform.slug);
            }
        }

        pb.set_message("Scanning device...");
        let slug_refs: Vec<&str> = slugs.iter().map(String::as_str).collect();
        let mut roms: Vec<_> = scan_all(&paths, &slug_refs).into_values().flatten().collect();
        pb.set_message("Matching ROMs...");
        resolve_identifiers(client.as_ref(), &cache, &mut roms).await;

        pb.set_message(if dry_run { "Planning..." } else { "Syncing saves..." });
        let report = SaveSync::new(client.as_ref(), &paths)
            .platforms(slugs.iter().cloned())
            .dry_run(dry_run)
            .run(&mut roms)
            .await;
        pb.finish_and_clear();
        Ok::<_, CliError>(report)
    })?;

    let verb = |decision: SyncDecision| match (decision, dry_run) {
        (SyncDecision::Upload, false) => "Uploaded",
        (SyncDecision::Upload, true) => "Would upload",
        (SyncDecision::Download, false) => "Downloaded",
        (SyncDecision::Download, true) => "Would download",
        (SyncDecision::Skip, _) => "Up to date",
    };
    for result in &report.results {
        match &result.error {
            None if result.decision == SyncDecision::Skip => {
                log::debug!("{}: up to date", result.rom_name);
            }
            None => log::info!(
                "{} {} {}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                verb(result.decision),
                result.rom_name.if_supports_color(Stdout, |t| t.bold()),
            ),
            Some(e) => log::warn!(
                "{} {} ({}): {}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                result.rom_name,
                result.decision,
                e,
            ),
        }
    }
    for save in &report.unmatched_saves {
        log::info!(
            "  {} no ROM for save {}",
            "?".if_supports_color(Stdout, |t| t.yellow()),
            save.path.display(),
        );
    }

    log::info!("");
    log::info!(
        "{}: {} uploaded, {} downloaded, {} up to date, {} failed, {} not on server",
        if dry_run { "Plan" } else { "Done" },
        report.uploaded,
        report.downloaded,
        report.skipped,
        report.failed,
        report.unresolved,
    );
    Ok(())
}
