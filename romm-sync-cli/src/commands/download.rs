use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romm_sync_lib::download::download_rom;

use crate::CliError;
use crate::commands::cache::format_bytes;
use crate::context::{AppContext, runtime};
use crate::spinner::spinner;

pub(crate) fn run_download(ctx: &AppContext, rom_id: u64) -> Result<(), CliError> {
    let paths = ctx.paths()?;
    let client = ctx.download_client()?;
    let cache = ctx.cache();
    let rt = runtime()?;

    let pb = spinner(format!("Looking up ROM #{rom_id}..."), ctx.quiet);
    let result = rt.block_on(async {
        let rom = client.rom(rom_id).await?;
        pb.set_message(format!("Downloading {}...", rom.display_name()));
        let (dest, bytes) = download_rom(&client, &paths, &cache, &rom).await?;
        Ok::<_, CliError>((rom, dest, bytes))
    });
    pb.finish_and_clear();
    let (rom, dest, bytes) = result?;

    log::info!(
        "{} {} -> {} ({})",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        rom.display_name().if_supports_color(Stdout, |t| t.bold()),
        dest.display(),
        format_bytes(bytes),
    );
    Ok(())
}
