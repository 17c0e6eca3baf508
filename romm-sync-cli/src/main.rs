//! romm-sync CLI
//!
//! Keeps a handheld's ROMs, saves and BIOS files in step with a RomM server.

mod cli_types;
mod commands;
mod context;
mod error;
mod logging;
mod spinner;

use clap::Parser;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

use cli_types::{CacheAction, Cli, Commands, ConfigAction};
use commands::bios::run_bios;
use commands::cache::{run_cache_clear, run_cache_info};
use commands::catalog::{run_platforms, run_prefetch};
use commands::config::{run_config_path, run_config_show};
use commands::connection::{run_login, run_validate};
use commands::download::run_download;
use commands::scan::run_scan;
use commands::sync::run_sync;
use context::AppContext;

pub(crate) use error::CliError;

fn main() {
    let cli = Cli::parse();

    let ctx = match AppContext::load(cli.config, cli.quiet) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{} {}", "\u{2718}".if_supports_color(Stderr, |t| t.red()), e);
            std::process::exit(1);
        }
    };

    let level = logging::level_for(cli.quiet, cli.verbose, &ctx.config.log_level);
    if let Err(e) = logging::init(level, cli.verbose, cli.logfile.as_deref()) {
        eprintln!("Failed to open log file: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Validate => run_validate(&ctx),
        Commands::Login => run_login(&ctx),
        Commands::Platforms => run_platforms(&ctx),
        Commands::Prefetch { platforms, force } => run_prefetch(&ctx, platforms, force),
        Commands::Scan { platforms, offline } => run_scan(&ctx, platforms, offline),
        Commands::Sync { platforms, dry_run } => run_sync(&ctx, platforms, dry_run),
        Commands::Bios { slug, download } => run_bios(&ctx, &slug, download),
        Commands::Download { rom_id } => run_download(&ctx, rom_id),
        Commands::Cache { action } => match action {
            CacheAction::Info => run_cache_info(&ctx),
            CacheAction::Clear => run_cache_clear(&ctx),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => run_config_show(&ctx),
            ConfigAction::Path => {
                run_config_path(&ctx);
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        log::error!("{} {}", "\u{2718}".if_supports_color(Stderr, |t| t.red()), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
