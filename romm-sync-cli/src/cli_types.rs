//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "romm-sync")]
#[command(about = "Sync ROMs, saves and BIOS files between a handheld and a RomM server", long_about = None)]
pub(crate) struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Platform selection shared by commands that walk the device.
#[derive(Args, Clone)]
pub(crate) struct PlatformArgs {
    /// Platform slugs (e.g., gba,snes,psx); defaults to every known platform
    #[arg(short, long, value_delimiter = ',')]
    pub platforms: Option<Vec<String>>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Quick reachability check against the configured server
    Validate,

    /// Check the configured credentials
    Login,

    /// List the server's platforms
    Platforms,

    /// Refresh the local catalog cache from the server
    Prefetch {
        #[command(flatten)]
        platforms: PlatformArgs,

        /// Refetch even when the cache is current
        #[arg(long)]
        force: bool,
    },

    /// List ROMs and saves found on the device
    Scan {
        #[command(flatten)]
        platforms: PlatformArgs,

        /// Resolve ROMs from the local cache only
        #[arg(long)]
        offline: bool,
    },

    /// Upload and download saves
    Sync {
        #[command(flatten)]
        platforms: PlatformArgs,

        /// Show what would be transferred without doing it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Check (and optionally fetch) BIOS files for a platform
    Bios {
        /// Platform slug (e.g., psx)
        slug: String,

        /// Download missing files from the server
        #[arg(short, long)]
        download: bool,
    },

    /// Download a ROM by its server identifier
    Download {
        rom_id: u64,
    },

    /// Manage the local catalog cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Show cached platforms and entry counts
    Info,

    /// Delete every cached catalog and freshness record
    Clear,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print the effective configuration (passwords masked)
    Show,

    /// Print the config file path
    Path,
}
