//! Terminal logger.
//!
//! Info records are printed to stdout as plain command output; warnings and
//! errors go to stderr with a colored marker. With `--verbose`, debug
//! records are shown and every line carries a timestamp. With `--logfile`,
//! every enabled record is also appended to a file with ANSI codes removed.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

struct CliLogger {
    level: LevelFilter,
    verbose: bool,
    file: Option<Mutex<File>>,
}

impl CliLogger {
    fn format_line(&self, record: &Record) -> String {
        let marker = match record.level() {
            Level::Error => format!("{} ", "error:".if_supports_color(Stderr, |t| t.red())),
            Level::Warn => format!("{} ", "warning:".if_supports_color(Stderr, |t| t.yellow())),
            Level::Info => String::new(),
            Level::Debug => format!("{} ", "debug:".if_supports_color(Stderr, |t| t.dimmed())),
            Level::Trace => format!("{} ", "trace:".if_supports_color(Stderr, |t| t.dimmed())),
        };
        if self.verbose {
            let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
            format!(
                "{} {}{}",
                stamp.if_supports_color(Stderr, |t| t.dimmed()),
                marker,
                record.args()
            )
        } else {
            format!("{}{}", marker, record.args())
        }
    }
}

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Library debug output is only wanted from our own crates
        if record.level() >= Level::Debug && !record.target().starts_with("romset") {
            return;
        }

        let line = self.format_line(record);
        if record.level() == Level::Info {
            println!("{line}");
        } else {
            eprintln!("{line}");
        }

        if let Some(file) = &self.file {
            let plain = strip_ansi_escapes::strip_str(&line);
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{plain}");
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }
}

/// Install the global logger. Must be called once, before any logging.
pub(crate) fn init(quiet: bool, verbose: bool, logfile: Option<&Path>) -> std::io::Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    let file = logfile.map(File::create).transpose()?.map(Mutex::new);

    let logger = CliLogger {
        level,
        verbose,
        file,
    };
    log::set_boxed_logger(Box::new(logger)).map_err(std::io::Error::other)?;
    log::set_max_level(level);
    Ok(())
}
