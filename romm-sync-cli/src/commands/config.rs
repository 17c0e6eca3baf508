use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::CliError;
use crate::context::AppContext;

/// Print the effective configuration with passwords masked.
pub(crate) fn run_config_show(ctx: &AppContext) -> Result<(), CliError> {
    let exists = ctx.config_path.exists();
    log::info!(
        "{} {}{}",
        "Config file:".if_supports_color(Stdout, |t| t.bold()),
        ctx.config_path.display(),
        if exists { "" } else { " (not found, showing defaults)" },
    );
    log::info!("");
    log::info!("{}", ctx.config.to_display_string()?);
    Ok(())
}

pub(crate) fn run_config_path(ctx: &AppContext) {
    log::info!("{}", ctx.config_path.display());
}
