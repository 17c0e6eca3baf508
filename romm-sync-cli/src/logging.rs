//! Logger setup.
//!
//! User-facing output goes through `log::info!`, so the logger writes plain
//! messages to stdout. `--verbose` adds timestamps, levels and debug
//! messages; `--logfile` copies everything to a file without ANSI codes.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Duplicates log output to stdout and a file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(&strip_ansi_escapes::strip(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

/// Level for the given flags; `configured` is the config file's `log_level`.
pub(crate) fn level_for(quiet: bool, verbose: bool, configured: &str) -> LevelFilter {
    if quiet {
        LevelFilter::Warn
    } else if verbose {
        LevelFilter::Debug
    } else {
        configured.parse().unwrap_or(LevelFilter::Info)
    }
}

pub(crate) fn init(level: LevelFilter, verbose: bool, logfile: Option<&Path>) -> io::Result<()> {
    let mut builder = Builder::new();
    builder.filter_level(level);
    // Keep dependency chatter out of debug output.
    for noisy in ["reqwest", "hyper", "hyper_util", "rustls", "h2"] {
        builder.filter_module(noisy, LevelFilter::Warn);
    }

    if verbose {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        });
    } else {
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    }

    match logfile {
        Some(path) => {
            let file = File::create(path)?;
            builder.target(Target::Pipe(Box::new(Tee { file })));
        }
        None => {
            builder.target(Target::Stdout);
        }
    }
    builder.init();
    Ok(())
}
