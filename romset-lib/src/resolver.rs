//! File identity resolution: ties files in an input directory to catalog ROMs.
//!
//! Files are hashed concurrently on a [`WorkerPool`]; each worker runs the
//! header-aware hasher on a blocking thread and looks the result up by
//! SHA1, then CRC32 + size, then file name. Zip archives are opened and
//! every member is hashed. A file matches every ROM declaring its dump, so
//! variants sharing a dump are all located. Per-file errors are recorded in
//! [`ScanResult::failures`] and never abort the scan.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use romset_catalog::{Catalog, FileIdentity, RomRef, VariantRef};
use romset_dat::{
    ArchiveMember, ChecksumIndex, DatError, FileHashes, HashOptions, HeaderRules, MatchMethod,
    hash_file, hash_zip_members, is_zip_path,
};
use serde::Serialize;

use crate::error::ScanError;
use crate::policy::ScanOptions;
use crate::progress::ScanProgress;
use crate::scanner;
use crate::worker_pool::WorkerPool;

/// A catalog ROM provided by a scanned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileMatch {
    pub rom: RomRef,
    pub method: MatchMethod,
    /// Index into [`ScannedFile::members`] when the ROM is stored inside
    /// the archive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<usize>,
}

/// What was learned about one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScannedFile {
    /// Hashes of the file as a whole. `None` when scanning was disabled,
    /// and for archives unless the catalog lists archives as ROMs.
    pub hashes: Option<FileHashes>,
    pub archive: bool,
    /// Files stored inside the archive.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ArchiveMember>,
    /// Every catalog ROM this file provides, one entry per ROM.
    pub matches: Vec<FileMatch>,
}

impl ScannedFile {
    pub fn is_matched(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Hashes behind a match: the member's when it is inside the archive.
    pub fn hashes_for(&self, m: &FileMatch) -> Option<&FileHashes> {
        match m.member {
            Some(i) => self.members.get(i).map(|member| &member.hashes),
            None => self.hashes.as_ref(),
        }
    }
}

/// A file that could not be read or hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Where a catalog ROM was found.
#[derive(Debug, Clone, Copy)]
pub struct Location<'a> {
    pub rom: RomRef,
    pub path: &'a Path,
    pub file: &'a ScannedFile,
    pub matched: FileMatch,
}

impl Location<'_> {
    pub fn in_archive(&self) -> bool {
        self.matched.member.is_some()
    }
}

/// Outcome of scanning an input directory. Read-only once built.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    pub files: BTreeMap<PathBuf, ScannedFile>,
    pub failures: Vec<ScanFailure>,
}

impl ScanResult {
    pub fn matched_count(&self) -> usize {
        self.files.values().filter(|f| f.is_matched()).count()
    }

    /// The file used for each matched ROM. A loose file beats an archive
    /// member; otherwise the first path in sorted order wins.
    pub fn locations(&self) -> BTreeMap<RomRef, Location<'_>> {
        let mut locations: BTreeMap<RomRef, Location<'_>> = BTreeMap::new();
        for (path, file) in &self.files {
            for &matched in &file.matches {
                let here = Location {
                    rom: matched.rom,
                    path: path.as_path(),
                    file,
                    matched,
                };
                match locations.entry(matched.rom) {
                    Entry::Vacant(e) => {
                        e.insert(here);
                    }
                    Entry::Occupied(mut e) => {
                        if e.get().in_archive() && !here.in_archive() {
                            e.insert(here);
                        }
                    }
                }
            }
        }
        locations
    }

    /// Located ROMs grouped by variant, each group in ROM order.
    pub fn by_variant(&self) -> BTreeMap<VariantRef, Vec<Location<'_>>> {
        let mut grouped: BTreeMap<VariantRef, Vec<Location<'_>>> = BTreeMap::new();
        for (rom, location) in self.locations() {
            grouped.entry(rom.variant_ref()).or_default().push(location);
        }
        grouped
    }

    /// Files matched to a ROM that is located in another file.
    pub fn duplicates(&self) -> Vec<(&Path, RomRef)> {
        let locations = self.locations();
        let mut duplicates = Vec::new();
        for (path, file) in &self.files {
            for m in &file.matches {
                if locations.get(&m.rom).is_some_and(|l| l.path != path.as_path()) {
                    duplicates.push((path.as_path(), m.rom));
                }
            }
        }
        duplicates
    }

    /// Record presence on the catalog's variants. Every variant with a
    /// located ROM is marked. Returns how many variants gained an identity.
    pub fn apply_to(&self, catalog: &mut Catalog) -> usize {
        let mut assigned = 0;
        for (rom, location) in self.locations() {
            let identity = match location.file.hashes_for(&location.matched) {
                Some(hashes) => FileIdentity::Hashed(hashes.clone()),
                None => FileIdentity::Unverified,
            };
            if catalog.set_checksum(rom.variant_ref(), identity) {
                assigned += 1;
            }
        }
        assigned
    }
}

/// Catalog lookups shared by every worker.
struct Identifier {
    checksums: ChecksumIndex<RomRef>,
    names: HashMap<String, Vec<RomRef>>,
    rules: Arc<HeaderRules>,
    hash: HashOptions,
    /// Also hash archives as whole files.
    hash_archives: bool,
}

impl Identifier {
    fn new(catalog: &Catalog, options: &ScanOptions) -> Self {
        Self {
            checksums: catalog.checksum_index(),
            names: catalog.file_name_index(),
            rules: options.header_rules.clone(),
            hash: options.hash,
            hash_archives: catalog.declares_archives(),
        }
    }

    fn identify(&self, path: &Path) -> Result<ScannedFile, DatError> {
        let mut scanned = ScannedFile {
            archive: is_zip_path(path),
            ..Default::default()
        };

        if scanned.archive {
            scanned.members = hash_zip_members(path, &self.rules, &self.hash)?;
            for (i, member) in scanned.members.iter().enumerate() {
                self.match_checksums(&member.hashes, Some(i), &mut scanned.matches);
            }
            if self.hash_archives {
                scanned.hashes = Some(hash_file(path, &self.rules, &self.hash)?);
            }
        } else {
            scanned.hashes = Some(hash_file(path, &self.rules, &self.hash)?);
        }

        if let Some(hashes) = &scanned.hashes {
            self.match_checksums(hashes, None, &mut scanned.matches);
        }
        if scanned.matches.is_empty() {
            scanned.matches = self.by_name(path);
        }
        Ok(scanned)
    }

    fn match_checksums(&self, hashes: &FileHashes, member: Option<usize>, out: &mut Vec<FileMatch>) {
        let Some(hit) = self.checksums.match_hashes(hashes) else {
            return;
        };
        for &rom in hit.keys {
            if !out.iter().any(|m| m.rom == rom) {
                out.push(FileMatch {
                    rom,
                    method: hit.method,
                    member,
                });
            }
        }
    }

    fn by_name(&self, path: &Path) -> Vec<FileMatch> {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return Vec::new();
        };
        self.names
            .get(stem)
            .into_iter()
            .flatten()
            .map(|&rom| FileMatch {
                rom,
                method: MatchMethod::FileName,
                member: None,
            })
            .collect()
    }
}

/// Scan `input_dir` and match its files against `catalog`.
///
/// Returns only after every worker has finished.
pub async fn resolve(
    input_dir: &Path,
    catalog: &Catalog,
    options: &ScanOptions,
    progress: &dyn Fn(ScanProgress),
) -> Result<ScanResult, ScanError> {
    let extension = if options.no_scan {
        options.extension.as_deref()
    } else {
        None
    };
    let files = scanner::collect_files(input_dir, options.recursive, extension).map_err(|source| {
        ScanError::InputDir {
            path: input_dir.to_path_buf(),
            source,
        }
    })?;
    let total = files.len();
    progress(ScanProgress::Started { total });

    let identifier = Arc::new(Identifier::new(catalog, options));
    let mut result = ScanResult::default();

    if options.no_scan {
        for (i, path) in files.into_iter().enumerate() {
            let scanned = ScannedFile {
                archive: is_zip_path(&path),
                matches: identifier.by_name(&path),
                ..Default::default()
            };
            progress(ScanProgress::FileDone {
                path: path.clone(),
                matched: scanned.is_matched(),
                done: i + 1,
                total,
            });
            log_file(&path, &scanned, catalog);
            result.files.insert(path, scanned);
        }
    } else {
        log::debug!("Hashing {} files with {} workers", total, options.threads);
        let mut pool = WorkerPool::start(options.threads, files, move |path: PathBuf| {
            let identifier = identifier.clone();
            async move {
                let worker_path = path.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || identifier.identify(&worker_path)).await;
                (path, outcome)
            }
        });

        let mut done = 0;
        while let Some((path, outcome)) = pool.recv().await {
            done += 1;
            let scanned = match outcome {
                Ok(Ok(scanned)) => Some(scanned),
                Ok(Err(e)) => {
                    log::warn!("Failed to read {}: {}", path.display(), e);
                    result.failures.push(ScanFailure {
                        path: path.clone(),
                        message: e.to_string(),
                    });
                    None
                }
                Err(e) => {
                    log::warn!("Worker failed on {}: {}", path.display(), e);
                    result.failures.push(ScanFailure {
                        path: path.clone(),
                        message: format!("worker failed: {e}"),
                    });
                    None
                }
            };
            progress(ScanProgress::FileDone {
                path: path.clone(),
                matched: scanned.as_ref().is_some_and(ScannedFile::is_matched),
                done,
                total,
            });
            if let Some(scanned) = scanned {
                log_file(&path, &scanned, catalog);
                result.files.insert(path, scanned);
            }
        }
        result.failures.sort_by(|a, b| a.path.cmp(&b.path));
    }

    for (path, rom) in result.duplicates() {
        if let Some(entry) = catalog.rom(rom) {
            log::debug!("Duplicate of {}: {}", entry.name, path.display());
        }
    }

    progress(ScanProgress::Done);
    Ok(result)
}

/// [`resolve`] for callers without a tokio runtime.
pub fn resolve_blocking(
    input_dir: &Path,
    catalog: &Catalog,
    options: &ScanOptions,
    progress: &dyn Fn(ScanProgress),
) -> Result<ScanResult, ScanError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(options.threads.max(1))
        .enable_all()
        .build()?;
    runtime.block_on(resolve(input_dir, catalog, options, progress))
}

fn log_file(path: &Path, scanned: &ScannedFile, catalog: &Catalog) {
    if !scanned.is_matched() {
        log::debug!("{} -> no match", path.display());
    }
    for m in &scanned.matches {
        let Some(rom) = catalog.rom(m.rom) else {
            continue;
        };
        match m.member.and_then(|i| scanned.members.get(i)) {
            Some(member) => log::debug!(
                "{}:{} -> {} ({})",
                path.display(),
                member.name,
                rom.name,
                m.method
            ),
            None => log::debug!("{} -> {} ({})", path.display(), rom.name, m.method),
        }
    }
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
