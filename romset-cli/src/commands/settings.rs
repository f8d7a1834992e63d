use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::CliError;

pub(crate) fn run_settings_path() -> Result<(), CliError> {
    log::info!("{}", romset_lib::settings_path().display());
    Ok(())
}

pub(crate) fn run_settings_show() -> Result<(), CliError> {
    let path = romset_lib::settings_path();
    if !path.exists() {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        );
        return Ok(());
    }

    // Unknown keys are an error
    super::load_settings()?;
    log::info!(
        "  Settings file: {} {}",
        path.display().if_supports_color(Stdout, |t| t.cyan()),
        "(exists)".if_supports_color(Stdout, |t| t.green()),
    );
    log::info!("");
    match romset_lib::load_settings_string() {
        Some(contents) => log::info!("{contents}"),
        None => log::info!("{}", "(empty)".if_supports_color(Stdout, |t| t.dimmed())),
    }
    Ok(())
}
