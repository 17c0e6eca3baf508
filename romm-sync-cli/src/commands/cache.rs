use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::CliError;
use crate::context::AppContext;

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// List cached platforms with entry counts.
pub(crate) fn run_cache_info(ctx: &AppContext) -> Result<(), CliError> {
    let cache = ctx.cache();
    if !cache.has_cache() {
        log::info!(
            "{}",
            "No cached catalogs.".if_supports_color(Stdout, |t| t.dimmed()),
        );
        log::info!("Run 'romm-sync prefetch' to build the cache.");
        return Ok(());
    }

    log::info!(
        "{}",
        format!("Catalog cache in {}:", cache.dir().display()).if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");
    let partitions = cache.cached_partitions();
    let mut total = 0;
    for partition in &partitions {
        let entries = cache.len(partition);
        total += entries;
        log::info!(
            "  {:<10} {} entries",
            partition.if_supports_color(Stdout, |t| t.bold()),
            entries,
        );
    }
    log::info!("");
    log::info!("Total: {} platforms, {} entries", partitions.len(), total);
    Ok(())
}

/// Delete every cached catalog and freshness record.
pub(crate) fn run_cache_clear(ctx: &AppContext) -> Result<(), CliError> {
    let removed = ctx.cache().clear()?;
    ctx.signatures().clear()?;
    log::info!(
        "{} Cache cleared ({} platform{} removed)",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        removed,
        if removed == 1 { "" } else { "s" },
    );
    Ok(())
}
