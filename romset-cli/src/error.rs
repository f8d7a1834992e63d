use thiserror::Error;

use romset_catalog::CatalogError;
use romset_dat::{DatError, HeaderRuleError};
use romset_lib::{OutputError, PolicyError, ScanError};

/// Errors that end a CLI command.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Invalid option combination or value
    #[error("Invalid configuration: {0}")]
    Policy(#[from] PolicyError),

    /// DAT file could not be read
    #[error("DAT error: {0}")]
    Dat(#[from] DatError),

    /// Header detector file could not be read
    #[error("Header rules: {0}")]
    HeaderRules(#[from] HeaderRuleError),

    /// DAT parsed but its parent/clone structure is broken
    #[error("Malformed catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// Input directory could not be scanned
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    /// Output plan could not be built
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Settings file error
    #[error("Config error: {0}")]
    Config(String),

    /// Runtime creation or async error
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl CliError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}
