//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use romset_lib::OutputMode;

#[derive(Parser)]
#[command(name = "romset")]
#[command(about = "Pick one ROM per game from a DAT catalog", long_about = None)]
pub(crate) struct Cli {
    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Rank every game in a DAT and select one variant per game
    Select(Box<SelectArgs>),

    /// Hash an input directory and report which catalog ROMs it holds
    Scan {
        /// DAT file (Logiqx XML or ClrMamePro)
        dat: PathBuf,

        /// Directory to scan
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        /// Write a JSON report of the scan
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List header detection rules
    Headers {
        /// Also load rules from a ClrMamePro detector file
        #[arg(long)]
        header_file: Option<PathBuf>,
    },

    /// Show settings file information
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Print the settings file path
    Path,

    /// Print the current settings file
    Show,
}

/// Output modes accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum ModeArg {
    Copy,
    Move,
    Symlink,
}

impl From<ModeArg> for OutputMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Copy => OutputMode::Copy,
            ModeArg::Move => OutputMode::Move,
            ModeArg::Symlink => OutputMode::Symlink,
        }
    }
}

/// How the input directory is read. Shared by `select` and `scan`.
#[derive(Args, Clone, Default)]
pub(crate) struct ScanArgs {
    /// Number of hashing workers
    #[arg(long)]
    pub threads: Option<usize>,

    /// Bytes read per hashing step
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Skip header detection for files larger than this
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Match by file name only, without reading file contents
    #[arg(long)]
    pub no_scan: bool,

    /// With --no-scan, only consider files with this extension
    #[arg(long)]
    pub extension: Option<String>,

    /// Do not descend into subdirectories
    #[arg(long)]
    pub no_recursive: bool,

    /// ClrMamePro header detector file (overrides the one named by the DAT)
    #[arg(long)]
    pub header_file: Option<PathBuf>,
}

/// Filter toggles. Each drops variants of one kind before ranking.
#[derive(Args, Clone, Default)]
pub(crate) struct FilterArgs {
    /// Apply every filter except --no-unlicensed
    #[arg(long)]
    pub no_all: bool,
    #[arg(long)]
    pub no_bios: bool,
    #[arg(long)]
    pub no_program: bool,
    #[arg(long)]
    pub no_enhancement_chip: bool,
    #[arg(long)]
    pub no_proto: bool,
    #[arg(long)]
    pub no_beta: bool,
    #[arg(long)]
    pub no_demo: bool,
    #[arg(long)]
    pub no_sample: bool,
    #[arg(long)]
    pub no_pirate: bool,
    #[arg(long)]
    pub no_promo: bool,
    #[arg(long)]
    pub no_unlicensed: bool,
}

/// Word lists matched against variant titles.
#[derive(Args, Clone, Default)]
pub(crate) struct WordListArgs {
    /// Variants matching any entry rank ahead (file:<path> reads a list)
    #[arg(long)]
    pub prefer: Option<String>,

    /// Variants matching any entry rank behind
    #[arg(long)]
    pub avoid: Option<String>,

    /// Variants matching any entry are never candidates
    #[arg(long)]
    pub exclude: Option<String>,

    /// Games whose best variant matches any entry are dropped
    #[arg(long)]
    pub exclude_after: Option<String>,

    /// Match list entries case-insensitively
    #[arg(long)]
    pub ignore_case: bool,

    /// Treat list entries as regular expressions
    #[arg(long)]
    pub regex: bool,

    /// Separator for inline lists
    #[arg(long, default_value = ",")]
    pub separator: String,
}

#[derive(Args, Clone)]
pub(crate) struct SelectArgs {
    /// DAT file (Logiqx XML or ClrMamePro)
    pub dat: PathBuf,

    /// Region codes in priority order (e.g., USA,EUR,JPN)
    #[arg(short, long, value_delimiter = ',')]
    pub regions: Option<Vec<String>>,

    /// Language codes in priority order (e.g., en,fr)
    #[arg(short, long, value_delimiter = ',')]
    pub languages: Option<Vec<String>>,

    /// Base of the language score
    #[arg(long)]
    pub language_weight: Option<u32>,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Keep variants of every region, ranking unselected regions last
    #[arg(long)]
    pub all_regions: bool,

    /// Like --all-regions, but only for variants in a selected language
    #[arg(long)]
    pub all_regions_with_lang: bool,

    /// Drop variants without a selected language
    #[arg(long)]
    pub only_selected_lang: bool,

    /// Compare languages before regions
    #[arg(long)]
    pub prioritize_languages: bool,

    /// Prefer the oldest revision
    #[arg(long)]
    pub early_revisions: bool,

    /// Prefer the oldest version
    #[arg(long)]
    pub early_versions: bool,

    /// Prefer catalog order
    #[arg(long)]
    pub input_order: bool,

    /// Prefer the parent of each game
    #[arg(long)]
    pub prefer_parents: bool,

    /// Prefer prereleases over retail variants
    #[arg(long)]
    pub prefer_prereleases: bool,

    #[command(flatten)]
    pub lists: WordListArgs,

    /// Directory holding the ROM files
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// Directory to place winners in (omit to preview the selection)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// How winners reach the output directory
    #[arg(long, value_enum, default_value = "copy")]
    pub mode: ModeArg,

    /// Group output into one directory per first letter
    #[arg(long)]
    pub group_by_first_letter: bool,

    /// Let variants without a file win when an input directory is given
    #[arg(long)]
    pub allow_missing: bool,

    /// Reject unknown region and language codes
    #[arg(long)]
    pub strict: bool,

    /// Write a JSON report of the selection
    #[arg(long)]
    pub report: Option<PathBuf>,
}
