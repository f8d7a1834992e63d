//! 1G1R selection pipeline: policy validation, file identity resolution,
//! candidate ranking and output materialization.

pub mod error;
pub mod materialize;
pub mod patterns;
pub mod policy;
pub mod progress;
pub mod ranking;
pub mod resolver;
pub mod scanner;
pub mod settings;
pub mod worker_pool;

pub use error::{OutputError, PolicyError, ScanError};
pub use materialize::{
    Conflict, FileOutcome, FileResult, OutputMode, OutputPlan, OutputSummary, PlannedFile,
    execute_plan, plan_output,
};
pub use patterns::{WordList, WordListOptions};
pub use policy::{
    DEFAULT_LANGUAGE_WEIGHT, DEFAULT_THREADS, Filters, OutputOptions, PolicyBuilder,
    RankingPolicy, RunConfig, ScanOptions,
};
pub use progress::ScanProgress;
pub use ranking::{Pick, RankKey, Ranking, Selection, pick, rank_game, select_all, select_winners};
pub use resolver::{
    FileMatch, Location, ScanFailure, ScanResult, ScannedFile, resolve, resolve_blocking,
};
pub use settings::{Settings, load_settings, load_settings_string, save_settings, settings_path};
