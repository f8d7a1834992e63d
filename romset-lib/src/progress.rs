use std::path::PathBuf;

/// Progress update sent while scanning an input directory.
///
/// Delivered through a callback so each frontend can render it its own way.
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// File enumeration finished
    Started { total: usize },
    /// A file has been identified (or has failed)
    FileDone {
        path: PathBuf,
        matched: bool,
        done: usize,
        total: usize,
    },
    /// Every worker has finished
    Done,
}

impl ScanProgress {
    /// Returns the progress fraction (0.0 to 1.0) if calculable.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            Self::FileDone { done, total, .. } if *total > 0 => Some(*done as f64 / *total as f64),
            Self::Done => Some(1.0),
            _ => None,
        }
    }
}
