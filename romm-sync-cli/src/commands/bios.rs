use std::sync::Arc;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romm_sync_core::BiosTables;
use romm_sync_lib::bios::download_bios;
use romm_sync_lib::{BiosFileReport, BiosFileStatus, BiosVerifier, RefreshCoordinator};

use crate::CliError;
use crate::context::{AppContext, runtime};
use crate::spinner::spinner;

fn status_glyph(status: BiosFileStatus) -> String {
    match status {
        BiosFileStatus::Valid => "\u{2714}".if_supports_color(Stdout, |t| t.green()).to_string(),
        BiosFileStatus::NoHashToVerify => "?".if_supports_color(Stdout, |t| t.yellow()).to_string(),
        BiosFileStatus::InvalidHash | BiosFileStatus::Missing => {
            "\u{2718}".if_supports_color(Stdout, |t| t.red()).to_string()
        }
    }
}

fn print_report(report: &BiosFileReport) {
    let optional = if report.file.optional { " (optional)" } else { "" };
    log::info!(
        "  {} {}{}: {}",
        status_glyph(report.status),
        report.file.relative_path.if_supports_color(Stdout, |t| t.bold()),
        optional,
        report.status,
    );
    if let Some(path) = &report.found_at {
        log::debug!("      at {}", path.display());
    }
}

/// Missing non-optional files, and how many non-optional files there are.
pub(crate) fn missing_required(reports: &[BiosFileReport]) -> (usize, usize) {
    let required: Vec<&BiosFileReport> = reports.iter().filter(|r| !r.file.optional).collect();
    let missing = required.iter().filter(|r| !r.status.is_present()).count();
    (missing, required.len())
}

/// Check the device's BIOS files for a platform, fetching missing ones
/// from the server with `download`.
pub(crate) fn run_bios(ctx: &AppContext, slug: &str, download: bool) -> Result<(), CliError> {
    let tables = BiosTables::load(ctx.config.bios_override_dir.as_deref())?;
    let verifier = BiosVerifier::new(tables, ctx.paths()?);

    let reports = verifier.verify_platform(slug);
    if reports.is_empty() {
        log::info!(
            "{}",
            format!("{slug} needs no BIOS files.").if_supports_color(Stdout, |t| t.dimmed()),
        );
        return Ok(());
    }

    log::info!("{}", format!("BIOS files for {slug}:").if_supports_color(Stdout, |t| t.bold()));
    for report in &reports {
        print_report(report);
    }
    let (missing, required) = missing_required(&reports);
    log::info!("");
    log::info!("{} of {} required files missing", missing, required);

    if !download {
        if missing > 0 {
            log::info!("Run 'romm-sync bios {slug} --download' to fetch them from the server.");
        }
        return Ok(());
    }

    let client = Arc::new(ctx.download_client()?);
    let rt = runtime()?;
    let pb = spinner(format!("Fetching {slug} firmware..."), ctx.quiet);
    let report = rt.block_on(async {
        let platform = client
            .platforms()
            .await?
            .into_iter()
            .find(|p| p.slug == slug)
            .ok_or_else(|| CliError::not_found(format!("platform '{slug}' on the server")))?;
        let (handle, startup) = RefreshCoordinator::launch(
            Arc::clone(&client),
            ctx.cache(),
            ctx.signatures(),
            vec![platform.clone()],
        );
        startup
            .await
            .map_err(|e| CliError::runtime(format!("Refresh task failed: {}", e)))?;
        if handle.has_bios(platform.id) == Some(false) {
            return Ok(None);
        }
        Ok::<_, CliError>(Some(download_bios(client.as_ref(), &verifier, &platform).await?))
    });
    pb.finish_and_clear();
    let Some(report) = report? else {
        log::info!(
            "{} The server has no firmware for {}",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            slug,
        );
        return Ok(());
    };

    log::info!("");
    for (name, written) in &report.downloaded {
        log::info!(
            "{} Downloaded {} ({} location{})",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            name.if_supports_color(Stdout, |t| t.bold()),
            written.len(),
            if written.len() == 1 { "" } else { "s" },
        );
    }
    for name in &report.checksum_mismatches {
        log::warn!(
            "  {} {} does not match its expected checksum",
            "?".if_supports_color(Stdout, |t| t.yellow()),
            name,
        );
    }
    for file in &report.unmatched {
        log::info!(
            "  {} {} is not on the server",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            file.file_name,
        );
    }
    for (name, error) in &report.failed {
        log::warn!(
            "{} {}: {}",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            name,
            error,
        );
    }
    log::info!(
        "Done: {} downloaded, {} already valid, {} unavailable, {} failed",
        report.downloaded.len(),
        report.skipped.len(),
        report.unmatched.len(),
        report.failed.len(),
    );
    Ok(())
}
