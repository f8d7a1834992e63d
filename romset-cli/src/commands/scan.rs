use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romset_catalog::Catalog;
use romset_lib::ScanResult;

use crate::CliError;
use crate::cli_types::ScanArgs;
use crate::report;

pub(crate) fn run_scan(
    dat_path: &Path,
    input: &Path,
    args: &ScanArgs,
    report_path: Option<&Path>,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = super::load_settings()?;
    let mut builder = settings.builder();
    super::apply_scan_args(&mut builder, args);

    let (dat, catalog) = super::load_catalog(dat_path)?;
    builder.header_rules = Some(super::header_rules(
        dat_path,
        &dat,
        args.header_file.as_deref(),
        &settings,
    )?);
    let options = builder.scan_options()?;

    let result = super::run_scan_with_progress(input, &catalog, &options, quiet)?;
    log::info!("");
    print_results(&catalog, &result);

    if let Some(path) = report_path {
        report::write_scan_report(path, &catalog, &result)?;
        log::info!("Report written to {}", report::describe(path).display());
    }
    Ok(())
}

fn print_results(catalog: &Catalog, result: &ScanResult) {
    for (path, scanned) in &result.files {
        let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
        if !scanned.is_matched() {
            log::info!(
                "  {} {}",
                "?".if_supports_color(Stdout, |t| t.yellow()),
                name
            );
        }
        for m in &scanned.matches {
            let Some(rom) = catalog.rom(m.rom) else {
                continue;
            };
            let source = match m.member.and_then(|i| scanned.members.get(i)) {
                Some(member) => format!("{name}:{}", member.name),
                None => name.to_string(),
            };
            log::info!(
                "  {} {} {} {} ({})",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                source,
                "\u{2192}".if_supports_color(Stdout, |t| t.dimmed()),
                rom.name.if_supports_color(Stdout, |t| t.bold()),
                m.method.if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
    }
    for failure in &result.failures {
        log::warn!(
            "  {} {}: {}",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            failure.path.display(),
            failure.message
        );
    }
    for (path, rom) in result.duplicates() {
        if let Some(entry) = catalog.rom(rom) {
            log::info!(
                "  {} {} duplicates {}",
                "=".if_supports_color(Stdout, |t| t.dimmed()),
                path.display(),
                entry.name
            );
        }
    }
}
