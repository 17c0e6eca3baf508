use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romm_sync_client::{ConnectionErrorKind, authenticate, preflight};

use crate::CliError;
use crate::context::{AppContext, runtime};
use crate::spinner::spinner;

fn suggest_fix(kind: ConnectionErrorKind) {
    if let ConnectionErrorKind::WrongProtocol { correct_scheme } = kind {
        log::warn!(
            "  Change the host URL to use {}://",
            correct_scheme.if_supports_color(Stdout, |t| t.bold()),
        );
    }
}

/// Reachability check with the short pre-flight timeout.
pub(crate) fn run_validate(ctx: &AppContext) -> Result<(), CliError> {
    let host = ctx.host()?;
    let rt = runtime()?;
    let pb = spinner(format!("Contacting {}...", host.label()), ctx.quiet);
    let result = rt.block_on(preflight(host));
    pb.finish_and_clear();

    match result {
        Ok(()) => {
            log::info!(
                "{} {} is reachable",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                host.base_url().if_supports_color(Stdout, |t| t.cyan()),
            );
            Ok(())
        }
        Err(kind) => {
            suggest_fix(kind);
            Err(kind.into())
        }
    }
}

/// Credential check against the login endpoint.
pub(crate) fn run_login(ctx: &AppContext) -> Result<(), CliError> {
    let host = ctx.host()?;
    if host.username.is_empty() {
        return Err(CliError::config(format!(
            "no username set for {}",
            host.label()
        )));
    }
    let rt = runtime()?;
    let pb = spinner(format!("Logging in as {}...", host.username), ctx.quiet);
    let result = rt.block_on(authenticate(host));
    pb.finish_and_clear();

    match result {
        Ok(()) => {
            log::info!(
                "{} Logged in to {} as {}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                host.label().if_supports_color(Stdout, |t| t.cyan()),
                host.username.if_supports_color(Stdout, |t| t.bold()),
            );
            Ok(())
        }
        Err(kind) => {
            suggest_fix(kind);
            Err(kind.into())
        }
    }
}
