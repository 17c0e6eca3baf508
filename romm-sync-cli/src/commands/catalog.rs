use std::sync::Arc;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romm_sync_lib::{PrefetchOutcome, RefreshCoordinator, partition_key};

use crate::CliError;
use crate::cli_types::PlatformArgs;
use crate::context::{AppContext, runtime, select_platforms};
use crate::spinner::{PlatformSpinners, spinner};

/// List the server's platforms with local cache state.
pub(crate) fn run_platforms(ctx: &AppContext) -> Result<(), CliError> {
    let client = ctx.client()?;
    let rt = runtime()?;
    let pb = spinner("Fetching platforms...", ctx.quiet);
    let platforms = rt.block_on(client.platforms());
    pb.finish_and_clear();
    let mut platforms = platforms?;
    platforms.sort_by(|a, b| a.name.cmp(&b.name));

    if platforms.is_empty() {
        log::info!(
            "{}",
            "The server has no platforms.".if_supports_color(Stdout, |t| t.dimmed()),
        );
        return Ok(());
    }

    let cache = ctx.cache();
    log::info!(
        "{}",
        format!("Platforms on {}:", client.base_url()).if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");
    for platform in &platforms {
        let cached = cache.len(&platform.slug);
        log::info!(
            "  {:<10} {} ({} ROMs, {} cached)",
            platform.slug.if_supports_color(Stdout, |t| t.bold()),
            platform.name.if_supports_color(Stdout, |t| t.cyan()),
            platform.rom_count,
            cached,
        );
    }
    Ok(())
}

/// Validate and refetch the catalog cache for the selected platforms.
pub(crate) fn run_prefetch(ctx: &AppContext, args: PlatformArgs, force: bool) -> Result<(), CliError> {
    let client = Arc::new(ctx.client()?);
    let rt = runtime()?;

    rt.block_on(async {
        let platforms = select_platforms(client.platforms().await?, args.platforms.as_deref())?;
        let cache = ctx.cache();
        let coordinator = RefreshCoordinator::new(Arc::clone(&client), Arc::clone(&cache), ctx.signatures());

        let spinners = PlatformSpinners::new(
            platforms.iter().map(|p| (p.id, p.name.as_str())),
            ctx.quiet,
        );
        let tasks = platforms.iter().map(|platform| {
            let coordinator = Arc::clone(&coordinator);
            let spinners = &spinners;
            let cache = &cache;
            async move {
                let fresh = !force && coordinator.validate(platform).await;
                let outcome = if fresh { None } else { Some(coordinator.prefetch(platform).await) };
                let msg = match outcome {
                    None => format!(
                        "{} {} up to date ({} entries)",
                        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                        platform.name,
                        cache.len(&platform.slug),
                    ),
                    Some(PrefetchOutcome::Fetched(n)) => format!(
                        "{} {} refreshed ({} entries)",
                        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                        platform.name,
                        n,
                    ),
                    Some(PrefetchOutcome::Joined) => format!(
                        "{} {} refreshed by another task",
                        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                        platform.name,
                    ),
                    Some(PrefetchOutcome::Failed) => format!(
                        "{} {} failed",
                        "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                        platform.name,
                    ),
                };
                spinners.finish(platform.id, msg);
                coordinator.is_fresh(&partition_key(platform.id)) == Some(true)
            }
        });
        let results = futures::future::join_all(tasks).await;
        spinners.clear_all();

        let failed = results.iter().filter(|ok| !**ok).count();
        if failed > 0 {
            log::warn!(
                "{} {} of {} platforms could not be refreshed",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                failed,
                results.len(),
            );
        }
        Ok::<(), CliError>(())
    })
}
