//! romset CLI
//!
//! Command-line interface for 1G1R ROM set selection.

mod cli_types;
mod commands;
mod error;
mod logger;
mod report;

use clap::Parser;

use cli_types::{Cli, Commands, SettingsAction};
pub(crate) use error::CliError;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logger::init(cli.quiet, cli.verbose, cli.logfile.as_deref()) {
        eprintln!("Failed to set up logging: {e}");
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Select(args) => commands::select::run_select(*args, cli.quiet),
        Commands::Scan {
            dat,
            input,
            scan,
            report,
        } => commands::scan::run_scan(&dat, &input, &scan, report.as_deref(), cli.quiet),
        Commands::Headers { header_file } => commands::headers::run_headers(header_file.as_deref()),
        Commands::Settings { action } => match action {
            SettingsAction::Path => commands::settings::run_settings_path(),
            SettingsAction::Show => commands::settings::run_settings_show(),
        },
    };

    if let Err(e) = result {
        log::error!("{e}");
        log::logger().flush();
        std::process::exit(1);
    }
    log::logger().flush();
}
