//! JSON run reports written with `--report`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use romset_catalog::Catalog;
use romset_lib::{OutputSummary, ScanFailure, ScanResult, Selection};

#[derive(Serialize)]
struct WinnerEntry<'a> {
    game: &'a str,
    title: &'a str,
    files: Vec<&'a Path>,
}

#[derive(Serialize)]
struct ScanCounts {
    files: usize,
    matched: usize,
    failed: usize,
}

#[derive(Serialize)]
struct SelectReport<'a> {
    catalog: &'a str,
    generated: String,
    games: usize,
    winners: Vec<WinnerEntry<'a>>,
    no_candidate: &'a [String],
    excluded_after: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    scan: Option<ScanCounts>,
    scan_failures: &'a [ScanFailure],
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a OutputSummary>,
}

#[derive(Serialize)]
struct ScanReport<'a> {
    catalog: &'a str,
    generated: String,
    counts: ScanCounts,
    matched: Vec<MatchedEntry<'a>>,
    unmatched: Vec<&'a Path>,
    failures: &'a [ScanFailure],
}

#[derive(Serialize)]
struct MatchedEntry<'a> {
    path: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    member: Option<&'a str>,
    rom: &'a str,
    method: romset_dat::MatchMethod,
}

fn timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

fn counts(scan: &ScanResult) -> ScanCounts {
    ScanCounts {
        files: scan.files.len() + scan.failures.len(),
        matched: scan.matched_count(),
        failed: scan.failures.len(),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
}

pub(crate) fn write_select_report(
    path: &Path,
    catalog: &Catalog,
    selection: &Selection,
    scan: Option<&ScanResult>,
    output: Option<&OutputSummary>,
) -> std::io::Result<()> {
    let located = scan.map(ScanResult::by_variant).unwrap_or_default();
    let winners = selection
        .winners
        .iter()
        .filter_map(|&vref| {
            let game = catalog.games().get(vref.game)?;
            let variant = catalog.variant(vref)?;
            let mut files: Vec<&Path> = Vec::new();
            for location in located.get(&vref).into_iter().flatten() {
                if !files.contains(&location.path) {
                    files.push(location.path);
                }
            }
            Some(WinnerEntry {
                game: &game.name,
                title: &variant.title,
                files,
            })
        })
        .collect();

    let report = SelectReport {
        catalog: catalog.name(),
        generated: timestamp(),
        games: selection.games,
        winners,
        no_candidate: &selection.no_candidate,
        excluded_after: &selection.excluded_after,
        scan: scan.map(counts),
        scan_failures: scan.map(|s| s.failures.as_slice()).unwrap_or_default(),
        output,
    };
    write_json(path, &report)
}

pub(crate) fn write_scan_report(
    path: &Path,
    catalog: &Catalog,
    scan: &ScanResult,
) -> std::io::Result<()> {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for (file, scanned) in &scan.files {
        if !scanned.is_matched() {
            unmatched.push(file.as_path());
        }
        for m in &scanned.matches {
            if let Some(rom) = catalog.rom(m.rom) {
                matched.push(MatchedEntry {
                    path: file.as_path(),
                    member: m
                        .member
                        .and_then(|i| scanned.members.get(i))
                        .map(|member| member.name.as_str()),
                    rom: &rom.name,
                    method: m.method,
                });
            }
        }
    }

    let report = ScanReport {
        catalog: catalog.name(),
        generated: timestamp(),
        counts: counts(scan),
        matched,
        unmatched,
        failures: &scan.failures,
    };
    write_json(path, &report)
}

/// Where a report is written, for the log line.
pub(crate) fn describe(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
