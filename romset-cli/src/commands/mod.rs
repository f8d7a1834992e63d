pub(crate) mod headers;
pub(crate) mod scan;
pub(crate) mod select;
pub(crate) mod settings;

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romset_catalog::Catalog;
use romset_core::util::format_bytes_approx;
use romset_dat::{DatFile, HeaderRules, parse_dat_file};
use romset_lib::{PolicyBuilder, ScanOptions, ScanProgress, ScanResult, Settings};

use crate::CliError;
use crate::cli_types::ScanArgs;

/// Load the settings file, falling back to defaults on a missing file.
pub(crate) fn load_settings() -> Result<Settings, CliError> {
    romset_lib::load_settings().map_err(|e| {
        CliError::config(format!(
            "{}: {}",
            romset_lib::settings_path().display(),
            e
        ))
    })
}

/// Parse a DAT and build its catalog.
pub(crate) fn load_catalog(dat_path: &Path) -> Result<(DatFile, Catalog), CliError> {
    log::info!(
        "Reading catalog: {}",
        dat_path.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    let dat = parse_dat_file(dat_path)?;
    let catalog = Catalog::from_dat(&dat)?;
    log::info!(
        "  {} games, {} variants",
        catalog.games().len(),
        catalog.variant_count()
    );
    Ok((dat, catalog))
}

/// Where to look for the detector file a DAT names in its header.
fn named_header_candidates(dat_path: &Path, name: &str) -> Vec<PathBuf> {
    let dir = dat_path.parent().unwrap_or(Path::new("."));
    vec![dir.join("headers").join(name), dir.join(name)]
}

/// Built-in header rules, extended with a detector file when one is given
/// on the command line, named by the DAT, or set in the settings file.
pub(crate) fn header_rules(
    dat_path: &Path,
    dat: &DatFile,
    explicit: Option<&Path>,
    settings: &Settings,
) -> Result<HeaderRules, CliError> {
    let mut rules = HeaderRules::builtin();

    let detector = match (explicit, &dat.header) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, Some(name)) => {
            let found = named_header_candidates(dat_path, name)
                .into_iter()
                .find(|p| p.is_file());
            if found.is_none() {
                log::warn!(
                    "DAT names header file \"{}\" but it was not found next to the DAT; using built-in rules",
                    name
                );
            }
            found
        }
        (None, None) => settings.header_file.clone(),
    };

    if let Some(path) = detector {
        let loaded = HeaderRules::load_detector(&path)?;
        log::debug!(
            "Loaded {} header rules from {}",
            loaded.len(),
            path.display()
        );
        rules.extend(loaded);
    }
    Ok(rules)
}

/// Copy scan flags onto a builder; unset flags keep the builder's values.
pub(crate) fn apply_scan_args(builder: &mut PolicyBuilder, args: &ScanArgs) {
    if let Some(threads) = args.threads {
        builder.threads = threads;
    }
    if let Some(chunk_size) = args.chunk_size {
        builder.chunk_size = chunk_size;
    }
    if let Some(max_file_size) = args.max_file_size {
        builder.max_file_size = max_file_size;
    }
    builder.no_scan = args.no_scan;
    builder.extension = args.extension.clone();
    builder.recursive = !args.no_recursive;
}

/// Scan `input` on a fresh runtime, drawing a progress bar unless quiet.
pub(crate) fn run_scan_with_progress(
    input: &Path,
    catalog: &Catalog,
    options: &ScanOptions,
    quiet: bool,
) -> Result<ScanResult, CliError> {
    log::info!(
        "Scanning: {}",
        input.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    if options.no_scan {
        log::info!(
            "{}",
            "No-scan mode: matching by file name only".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template("  {spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} {msg}")
                .expect("static pattern")
                .progress_chars("=> ")
                .tick_chars("/-\\|"),
        );
        pb
    };

    let progress = |p: ScanProgress| match p {
        ScanProgress::Started { total } => {
            pb.set_length(total as u64);
        }
        ScanProgress::FileDone { ref path, done, .. } => {
            pb.set_position(done as u64);
            if let Some(name) = path.file_name() {
                pb.set_message(name.to_string_lossy().into_owned());
            }
        }
        ScanProgress::Done => pb.finish_and_clear(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::runtime(e.to_string()))?;
    let result = runtime.block_on(romset_lib::resolve(input, catalog, options, &progress));
    pb.finish_and_clear();
    let result = result?;

    let hashed: u64 = result
        .files
        .values()
        .flat_map(|f| f.hashes.iter().chain(f.members.iter().map(|m| &m.hashes)))
        .map(|h| h.data_size + h.header_skipped)
        .sum();
    log::info!(
        "  {} files, {} matched, {} failed ({} read)",
        result.files.len() + result.failures.len(),
        result.matched_count().if_supports_color(Stdout, |t| t.green()),
        result.failures.len(),
        format_bytes_approx(hashed),
    );
    Ok(result)
}
