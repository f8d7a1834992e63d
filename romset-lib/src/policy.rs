//! Validated, immutable run configuration.
//!
//! Frontends fill in a [`PolicyBuilder`] from flags and the settings file,
//! then call [`PolicyBuilder::build`]. Every inconsistent combination is
//! rejected there with a [`PolicyError`], so the ranking engine, resolver
//! and materializer never see an invalid configuration.

use std::path::PathBuf;
use std::sync::Arc;

use romset_catalog::Variant;
use romset_core::region;
use romset_core::{Category, ReleaseStatus};
use romset_dat::{HashOptions, HeaderRules};
use romset_dat::hasher::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FILE_SIZE};

use crate::error::PolicyError;
use crate::materialize::OutputMode;
use crate::patterns::{WordList, WordListOptions};

pub const DEFAULT_LANGUAGE_WEIGHT: u32 = 3;
pub const DEFAULT_THREADS: usize = 4;

/// Category and release-status filters applied before ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filters {
    pub no_bios: bool,
    pub no_program: bool,
    pub no_enhancement_chip: bool,
    pub no_proto: bool,
    pub no_beta: bool,
    pub no_demo: bool,
    pub no_sample: bool,
    pub no_pirate: bool,
    pub no_promo: bool,
    pub no_unlicensed: bool,
}

impl Filters {
    /// Every filter except `no_unlicensed`.
    pub fn all() -> Self {
        Self {
            no_bios: true,
            no_program: true,
            no_enhancement_chip: true,
            no_proto: true,
            no_beta: true,
            no_demo: true,
            no_sample: true,
            no_pirate: true,
            no_promo: true,
            no_unlicensed: false,
        }
    }

    /// Combine with another set; a filter is on if either side enables it.
    pub fn union(self, other: Self) -> Self {
        Self {
            no_bios: self.no_bios || other.no_bios,
            no_program: self.no_program || other.no_program,
            no_enhancement_chip: self.no_enhancement_chip || other.no_enhancement_chip,
            no_proto: self.no_proto || other.no_proto,
            no_beta: self.no_beta || other.no_beta,
            no_demo: self.no_demo || other.no_demo,
            no_sample: self.no_sample || other.no_sample,
            no_pirate: self.no_pirate || other.no_pirate,
            no_promo: self.no_promo || other.no_promo,
            no_unlicensed: self.no_unlicensed || other.no_unlicensed,
        }
    }

    pub fn rejects(&self, variant: &Variant) -> bool {
        let by_status = match variant.status {
            ReleaseStatus::Retail => false,
            ReleaseStatus::Beta => self.no_beta,
            ReleaseStatus::Proto => self.no_proto,
            ReleaseStatus::Demo => self.no_demo,
            ReleaseStatus::Sample => self.no_sample,
        };
        let by_category = match variant.category {
            Category::Standard => false,
            Category::Bios => self.no_bios,
            Category::Program => self.no_program,
            Category::EnhancementChip => self.no_enhancement_chip,
            Category::Pirate => self.no_pirate,
            Category::Promo => self.no_promo,
            Category::Unlicensed => self.no_unlicensed,
        };
        by_status || by_category
    }
}

/// Everything the ranking engine needs to pick one variant per game.
#[derive(Debug, Clone)]
pub struct RankingPolicy {
    pub(crate) selected_regions: Vec<String>,
    pub(crate) selected_languages: Vec<String>,
    pub(crate) language_weight: u32,
    pub(crate) filters: Filters,
    pub(crate) all_regions: bool,
    pub(crate) all_regions_with_lang: bool,
    pub(crate) only_selected_lang: bool,
    pub(crate) prioritize_languages: bool,
    pub(crate) early_revisions: bool,
    pub(crate) early_versions: bool,
    pub(crate) input_order: bool,
    pub(crate) prefer_parents: bool,
    pub(crate) prefer_prereleases: bool,
    pub(crate) prefer: WordList,
    pub(crate) avoid: WordList,
    pub(crate) exclude: WordList,
    pub(crate) exclude_after: WordList,
}

impl RankingPolicy {
    pub fn selected_regions(&self) -> &[String] {
        &self.selected_regions
    }

    pub fn selected_languages(&self) -> &[String] {
        &self.selected_languages
    }

    pub fn language_weight(&self) -> u32 {
        self.language_weight
    }

    pub fn filters(&self) -> Filters {
        self.filters
    }
}

/// How the input directory is scanned.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub threads: usize,
    pub hash: HashOptions,
    /// Match by file name only, without reading file contents.
    pub no_scan: bool,
    /// With `no_scan`, only consider files with this extension.
    pub extension: Option<String>,
    pub recursive: bool,
    pub header_rules: Arc<HeaderRules>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            hash: HashOptions::default(),
            no_scan: false,
            extension: None,
            recursive: true,
            header_rules: Arc::new(HeaderRules::builtin()),
        }
    }
}

/// Where and how winners are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub output_dir: PathBuf,
    pub mode: OutputMode,
    pub group_by_first_letter: bool,
}

/// A validated run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub ranking: RankingPolicy,
    pub input_dir: Option<PathBuf>,
    pub scan: ScanOptions,
    pub output: Option<OutputOptions>,
    /// Only variants with a file on disk may win.
    pub require_present: bool,
}

/// Raw, unvalidated options.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    pub selected_regions: Vec<String>,
    pub selected_languages: Vec<String>,
    pub language_weight: u32,
    pub filters: Filters,
    pub no_all: bool,
    pub all_regions: bool,
    pub all_regions_with_lang: bool,
    pub only_selected_lang: bool,
    pub prioritize_languages: bool,
    pub early_revisions: bool,
    pub early_versions: bool,
    pub input_order: bool,
    pub prefer_parents: bool,
    pub prefer_prereleases: bool,
    pub prefer: Option<String>,
    pub avoid: Option<String>,
    pub exclude: Option<String>,
    pub exclude_after: Option<String>,
    pub ignore_case: bool,
    pub regex: bool,
    pub separator: String,
    pub threads: usize,
    pub chunk_size: usize,
    pub max_file_size: u64,
    pub no_scan: bool,
    pub extension: Option<String>,
    pub recursive: bool,
    pub header_rules: Option<HeaderRules>,
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub mode: OutputMode,
    pub group_by_first_letter: bool,
    /// Defaults to `true` when an input directory is given.
    pub require_present: Option<bool>,
    /// Reject region and language codes outside the known tables.
    pub strict: bool,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self {
            selected_regions: Vec::new(),
            selected_languages: Vec::new(),
            language_weight: DEFAULT_LANGUAGE_WEIGHT,
            filters: Filters::default(),
            no_all: false,
            all_regions: false,
            all_regions_with_lang: false,
            only_selected_lang: false,
            prioritize_languages: false,
            early_revisions: false,
            early_versions: false,
            input_order: false,
            prefer_parents: false,
            prefer_prereleases: false,
            prefer: None,
            avoid: None,
            exclude: None,
            exclude_after: None,
            ignore_case: false,
            regex: false,
            separator: ",".to_string(),
            threads: DEFAULT_THREADS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            no_scan: false,
            extension: None,
            recursive: true,
            header_rules: None,
            input_dir: None,
            output_dir: None,
            mode: OutputMode::Copy,
            group_by_first_letter: false,
            require_present: None,
            strict: false,
        }
    }
}

impl PolicyBuilder {
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_regions: regions.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<RunConfig, PolicyError> {
        self.check_conflicts()?;
        let scan = self.scan_options()?;

        let selected_regions = normalize_codes(&self.selected_regions, str::to_uppercase);
        let selected_languages = normalize_codes(&self.selected_languages, str::to_lowercase);
        if selected_regions.is_empty() {
            return Err(PolicyError::NoRegions);
        }
        self.check_codes(&selected_regions, &selected_languages)?;

        let list_options = WordListOptions {
            ignore_case: self.ignore_case,
            regex: self.regex,
            separator: self.separator.clone(),
        };
        let compile = |raw: &Option<String>| match raw {
            Some(raw) => WordList::parse(raw, &list_options),
            None => Ok(WordList::empty()),
        };

        let filters = if self.no_all {
            self.filters.union(Filters::all())
        } else {
            self.filters
        };

        let ranking = RankingPolicy {
            selected_regions,
            selected_languages,
            language_weight: self.language_weight,
            filters,
            all_regions: self.all_regions,
            all_regions_with_lang: self.all_regions_with_lang,
            only_selected_lang: self.only_selected_lang,
            prioritize_languages: self.prioritize_languages,
            early_revisions: self.early_revisions,
            early_versions: self.early_versions,
            input_order: self.input_order,
            prefer_parents: self.prefer_parents,
            prefer_prereleases: self.prefer_prereleases,
            prefer: compile(&self.prefer)?,
            avoid: compile(&self.avoid)?,
            exclude: compile(&self.exclude)?,
            exclude_after: compile(&self.exclude_after)?,
        };

        let output = self.output_dir.map(|output_dir| OutputOptions {
            output_dir,
            mode: self.mode,
            group_by_first_letter: self.group_by_first_letter,
        });

        let require_present = self.input_dir.is_some() && self.require_present.unwrap_or(true);

        Ok(RunConfig {
            ranking,
            input_dir: self.input_dir,
            scan,
            output,
            require_present,
        })
    }

    /// Validate only the options that control scanning. Used on its own by
    /// frontends that scan without ranking.
    pub fn scan_options(&self) -> Result<ScanOptions, PolicyError> {
        if self.threads == 0 {
            return Err(PolicyError::Zero { name: "Threads" });
        }
        if self.chunk_size == 0 {
            return Err(PolicyError::Zero { name: "Chunk size" });
        }
        if self.max_file_size == 0 {
            return Err(PolicyError::Zero {
                name: "Maximum file size",
            });
        }
        if self.extension.is_some() && !self.no_scan {
            return Err(PolicyError::ExtensionWhileScanning);
        }

        Ok(ScanOptions {
            threads: self.threads,
            hash: HashOptions {
                chunk_size: self.chunk_size,
                max_file_size: self.max_file_size,
            },
            no_scan: self.no_scan,
            extension: self
                .extension
                .as_deref()
                .map(|e| e.trim_start_matches('.').to_lowercase()),
            recursive: self.recursive,
            header_rules: Arc::new(self.header_rules.clone().unwrap_or_else(HeaderRules::builtin)),
        })
    }

    fn check_conflicts(&self) -> Result<(), PolicyError> {
        if self.language_weight == 0 {
            return Err(PolicyError::Zero {
                name: "Language weight",
            });
        }

        let early = self.early_revisions || self.early_versions;
        if early && self.input_order {
            return Err(PolicyError::conflict(
                "early revisions/versions cannot be combined with input order",
            ));
        }
        if early && self.prefer_parents {
            return Err(PolicyError::conflict(
                "early revisions/versions cannot be combined with prefer parents",
            ));
        }
        if self.prefer_parents && self.input_order {
            return Err(PolicyError::conflict(
                "prefer parents cannot be combined with input order",
            ));
        }
        if self.all_regions && self.all_regions_with_lang {
            return Err(PolicyError::conflict(
                "all regions cannot be combined with all regions with language",
            ));
        }

        let has_list = [&self.prefer, &self.avoid, &self.exclude, &self.exclude_after]
            .iter()
            .any(|l| l.is_some());
        if !has_list {
            if self.ignore_case {
                return Err(PolicyError::WordListOptionWithoutList("Ignore case"));
            }
            if self.regex {
                return Err(PolicyError::WordListOptionWithoutList("Regex"));
            }
        }

        if self.output_dir.is_some() && self.input_dir.is_none() {
            return Err(PolicyError::OutputWithoutInput);
        }
        Ok(())
    }

    fn check_codes(&self, regions: &[String], languages: &[String]) -> Result<(), PolicyError> {
        for code in regions {
            if region::find_by_code(code).is_none() {
                if self.strict {
                    return Err(PolicyError::UnknownRegion(code.clone()));
                }
                log::warn!("Unknown region code \"{code}\"; it will only match catalogs that use it verbatim");
            }
        }
        for code in languages {
            if !region::is_known_language(code) {
                if self.strict {
                    return Err(PolicyError::UnknownLanguage(code.clone()));
                }
                log::warn!("Unknown language code \"{code}\"");
            }
        }
        Ok(())
    }
}

/// Trim, case-normalize and de-duplicate, keeping first occurrences.
fn normalize_codes(codes: &[String], normalize: fn(&str) -> String) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for code in codes {
        let code = normalize(code.trim());
        if !code.is_empty() && !out.contains(&code) {
            out.push(code);
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/policy_tests.rs"]
mod tests;
