//! Output materialization: copy, move or link each winner's files into an
//! output directory.
//!
//! Work is split into [`plan_output`], which decides every destination and
//! detects conflicts without touching the filesystem, and [`execute_plan`],
//! which carries the plan out.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use romset_catalog::{Catalog, Variant, VariantRef};
use romset_dat::MatchMethod;
use serde::{Deserialize, Serialize};

use crate::error::OutputError;
use crate::policy::OutputOptions;
use crate::ranking::Selection;
use crate::resolver::{Location, ScanResult};

/// How files reach the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Copy,
    Move,
    Symlink,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::Copy => "copy",
            OutputMode::Move => "move",
            OutputMode::Symlink => "symlink",
        })
    }
}

/// A planned file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub variant: VariantRef,
}

/// Several sources planned onto one destination. None of them is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub destination: PathBuf,
    pub sources: Vec<PathBuf>,
}

/// Result of planning output for a selection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputPlan {
    pub actions: Vec<PlannedFile>,
    pub conflicts: Vec<Conflict>,
    /// Winners with no located file.
    pub missing: Vec<VariantRef>,
}

/// Outcome for one planned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "outcome", content = "reason")]
pub enum FileOutcome {
    Copied,
    Moved,
    Linked,
    /// The destination already existed.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Summary of an executed plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputSummary {
    pub files: Vec<FileResult>,
    pub conflicts: usize,
}

impl OutputSummary {
    pub fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }

    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Copied | FileOutcome::Moved | FileOutcome::Linked))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed(_)))
    }
}

/// Directory used by first-letter grouping: the uppercased first character
/// of the title when it is alphanumeric, `#` otherwise.
pub fn letter_dir(title: &str) -> String {
    match title.chars().next() {
        Some(c) if c.is_alphanumeric() => c.to_uppercase().collect(),
        _ => "#".to_string(),
    }
}

/// Strip any directory part from a catalog ROM name.
fn rom_file_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Where a located file goes. Archives keep their ROMs together and are
/// named after the variant when the match came from inside them.
fn destination(
    catalog: &Catalog,
    variant: &Variant,
    location: &Location<'_>,
    options: &OutputOptions,
) -> PathBuf {
    let mut dir = options.output_dir.clone();
    if options.group_by_first_letter {
        dir.push(letter_dir(&variant.title));
    }
    if !location.file.archive && variant.roms.len() > 1 {
        dir.push(&variant.title);
    }

    if location.in_archive() {
        return dir.join(format!("{}.zip", variant.title));
    }
    let by_checksum = matches!(location.matched.method, MatchMethod::Sha1 | MatchMethod::Crc32);
    let file_name = match catalog.rom(location.rom) {
        Some(entry) if by_checksum => rom_file_name(&entry.name).to_string(),
        _ => location
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    dir.join(file_name)
}

/// Decide a destination for every located file of every winner.
pub fn plan_output(
    catalog: &Catalog,
    selection: &Selection,
    scan: &ScanResult,
    options: &OutputOptions,
) -> Result<OutputPlan, OutputError> {
    if options.output_dir.exists() && !options.output_dir.is_dir() {
        return Err(OutputError::NotADirectory(options.output_dir.clone()));
    }

    let located = scan.by_variant();
    let mut plan = OutputPlan::default();
    let mut planned = Vec::new();

    for &vref in &selection.winners {
        let Some(variant) = catalog.variant(vref) else {
            continue;
        };
        let Some(locations) = located.get(&vref) else {
            log::debug!("No file located for \"{}\"", variant.title);
            plan.missing.push(vref);
            continue;
        };

        // One archive may hold several of the variant's ROMs.
        let mut sources: Vec<&Path> = Vec::new();
        for location in locations {
            if sources.contains(&location.path) {
                continue;
            }
            sources.push(location.path);
            planned.push(PlannedFile {
                source: location.path.to_path_buf(),
                destination: destination(catalog, variant, location, options),
                variant: vref,
            });
        }
    }

    // Detect conflicts: multiple sources mapping to the same destination
    let mut target_map: HashMap<&Path, Vec<usize>> = HashMap::new();
    for (i, action) in planned.iter().enumerate() {
        target_map
            .entry(action.destination.as_path())
            .or_default()
            .push(i);
    }
    let mut conflicted = vec![false; planned.len()];
    for (destination, indices) in &target_map {
        if indices.len() > 1 {
            for &i in indices {
                conflicted[i] = true;
            }
            plan.conflicts.push(Conflict {
                destination: destination.to_path_buf(),
                sources: indices.iter().map(|&i| planned[i].source.clone()).collect(),
            });
        }
    }
    drop(target_map);
    plan.conflicts.sort_by(|a, b| a.destination.cmp(&b.destination));

    plan.actions = planned
        .into_iter()
        .zip(conflicted)
        .filter_map(|(action, conflicted)| (!conflicted).then_some(action))
        .collect();

    Ok(plan)
}

/// Carry out a plan. Failures are recorded per file; conflicts are never
/// executed.
pub fn execute_plan(plan: &OutputPlan, mode: OutputMode) -> OutputSummary {
    let mut summary = OutputSummary {
        conflicts: plan.conflicts.len(),
        ..Default::default()
    };

    for conflict in &plan.conflicts {
        log::warn!(
            "Not writing {}: {} files map to it",
            conflict.destination.display(),
            conflict.sources.len()
        );
    }

    for action in &plan.actions {
        let outcome = execute_one(action, mode);
        match &outcome {
            FileOutcome::Failed(reason) => log::warn!(
                "Failed to {} {} -> {}: {}",
                mode,
                action.source.display(),
                action.destination.display(),
                reason
            ),
            FileOutcome::Skipped => log::debug!(
                "Skipping {}: destination exists",
                action.destination.display()
            ),
            _ => log::debug!(
                "{} {} -> {}",
                mode,
                action.source.display(),
                action.destination.display()
            ),
        }
        summary.files.push(FileResult {
            source: action.source.clone(),
            destination: action.destination.clone(),
            outcome,
        });
    }

    summary
}

fn execute_one(action: &PlannedFile, mode: OutputMode) -> FileOutcome {
    if fs::symlink_metadata(&action.destination).is_ok() {
        return FileOutcome::Skipped;
    }
    if let Some(parent) = action.destination.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            return FileOutcome::Failed(e.to_string());
        }
    }

    let result = match mode {
        OutputMode::Copy => fs::copy(&action.source, &action.destination).map(|_| FileOutcome::Copied),
        OutputMode::Move => move_file(&action.source, &action.destination).map(|()| FileOutcome::Moved),
        OutputMode::Symlink => {
            link_file(&action.source, &action.destination).map(|()| FileOutcome::Linked)
        }
    };
    result.unwrap_or_else(|e| FileOutcome::Failed(e.to_string()))
}

/// Rename, falling back to copy + delete across filesystems.
fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    fs::copy(source, destination)?;
    fs::remove_file(source)
}

fn link_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    let target = fs::canonicalize(source)?;
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, destination)
    }
    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_file(target, destination)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, destination);
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "symlinks are not supported on this platform",
        ))
    }
}

#[cfg(test)]
#[path = "tests/materialize_tests.rs"]
mod tests;
