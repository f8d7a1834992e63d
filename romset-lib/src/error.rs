use std::path::PathBuf;

use thiserror::Error;

/// Invalid configuration, detected before any work starts.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("At least one region must be selected")]
    NoRegions,

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("Conflicting options: {0}")]
    Conflict(String),

    #[error("{0} has no effect without a prefer, avoid, exclude or exclude-after list")]
    WordListOptionWithoutList(&'static str),

    #[error("--extension only applies with --no-scan")]
    ExtensionWhileScanning,

    #[error("An output directory requires an input directory")]
    OutputWithoutInput,

    #[error("Invalid regular expression \"{pattern}\": {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Cannot read word list {}: {source}", path.display())]
    WordListFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown region code \"{0}\"")]
    UnknownRegion(String),

    #[error("Unknown language code \"{0}\"")]
    UnknownLanguage(String),
}

impl PolicyError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// A scan that could not run at all. Per-file problems are recorded in
/// [`ScanResult::failures`](crate::resolver::ScanResult) instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Cannot read input directory {}: {source}", path.display())]
    InputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// An output plan that cannot be carried out.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Output path {} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),
}
