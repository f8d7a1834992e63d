//! In-memory Parent/Clone catalog: games, their variants and declared ROMs.
//!
//! A [`Catalog`] is built once from an ordered list of [`VariantRecord`]s
//! (or a parsed DAT). Every variant is annotated with the facets extracted
//! from its name, with explicit catalog fields taking precedence. After
//! construction the only mutation is [`Catalog::set_checksum`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use romset_core::region;
use romset_core::{Category, ReleaseStatus, VersionTag};
use romset_dat::{ChecksumIndex, DatFile, DatGame, DatRom, FileHashes, RomStatus};
use serde::Serialize;

use crate::error::CatalogError;
use crate::name_parser;

// ── Input records ───────────────────────────────────────────────────────────

/// Facets declared explicitly by the catalog. `None` falls back to the
/// value extracted from the name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub regions: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub status: Option<ReleaseStatus>,
    pub category: Option<Category>,
    pub bad_dump: Option<bool>,
}

/// A ROM file declared by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomEntry {
    pub name: String,
    pub size: u64,
    /// Lowercase hex
    pub crc32: Option<String>,
    /// Lowercase hex
    pub sha1: Option<String>,
    pub status: RomStatus,
}

impl From<&DatRom> for RomEntry {
    fn from(rom: &DatRom) -> Self {
        Self {
            name: rom.name.clone(),
            size: rom.size,
            crc32: rom.crc.as_ref().map(|c| c.to_lowercase()),
            sha1: rom.sha1.as_ref().map(|s| s.to_lowercase()),
            status: rom.status,
        }
    }
}

/// One catalog entry, in file order.
#[derive(Debug, Clone, Default)]
pub struct VariantRecord {
    pub name: String,
    pub clone_of: Option<String>,
    pub overrides: Overrides,
    pub roms: Vec<RomEntry>,
}

impl VariantRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn clone_of(mut self, parent: impl Into<String>) -> Self {
        self.clone_of = Some(parent.into());
        self
    }

    pub fn with_rom(mut self, rom: RomEntry) -> Self {
        self.roms.push(rom);
        self
    }
}

// ── References ──────────────────────────────────────────────────────────────

/// Position of a variant inside a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VariantRef {
    pub game: usize,
    pub variant: usize,
}

/// Position of a declared ROM inside a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RomRef {
    pub game: usize,
    pub variant: usize,
    pub rom: usize,
}

impl RomRef {
    pub fn variant_ref(&self) -> VariantRef {
        VariantRef {
            game: self.game,
            variant: self.variant,
        }
    }
}

/// How an on-disk file was tied to a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum FileIdentity {
    /// Content hashes were computed (and matched by checksum or name).
    Hashed(FileHashes),
    /// Matched by file name without hashing.
    Unverified,
}

// ── Model ───────────────────────────────────────────────────────────────────

/// One releasable unit of a game.
#[derive(Debug, Clone)]
pub struct Variant {
    /// Raw display name from the catalog.
    pub title: String,
    /// Name with all tags removed.
    pub base_title: String,
    pub is_parent: bool,
    /// Position of the record in the catalog (0-based, global).
    pub input_index: usize,
    pub regions: Vec<String>,
    pub languages: Vec<String>,
    pub status: ReleaseStatus,
    pub prerelease_tag: Option<VersionTag>,
    pub category: Category,
    pub bad_dump: bool,
    pub revision: Option<VersionTag>,
    pub version: Option<VersionTag>,
    pub roms: Vec<RomEntry>,
    checksum: Option<FileIdentity>,
}

impl Variant {
    fn from_record(record: VariantRecord, input_index: usize, is_parent: bool) -> Self {
        let facets = name_parser::extract(&record.name);
        let overrides = record.overrides;

        let regions_overridden = overrides.regions.is_some();
        let regions = overrides.regions.unwrap_or(facets.regions);
        let languages = match overrides.languages {
            Some(languages) => languages.iter().map(|l| l.to_lowercase()).collect(),
            None if facets.languages_inferred && regions_overridden => {
                region::default_languages(regions.iter().map(String::as_str))
            }
            None => facets.languages,
        };

        let status = overrides.status.unwrap_or(facets.status);
        let prerelease_tag = if status == facets.status {
            facets.prerelease_tag
        } else {
            None
        };

        let bad_dump = overrides.bad_dump.unwrap_or_else(|| {
            facets.bad_dump || record.roms.iter().any(|r| r.status == RomStatus::BadDump)
        });

        Self {
            title: record.name,
            base_title: facets.title,
            is_parent,
            input_index,
            regions,
            languages,
            status,
            prerelease_tag,
            category: overrides.category.unwrap_or(facets.category),
            bad_dump,
            revision: facets.revision,
            version: facets.version,
            roms: record.roms,
            checksum: None,
        }
    }

    /// Identity of the first on-disk file matched to this variant.
    pub fn checksum(&self) -> Option<&FileIdentity> {
        self.checksum.as_ref()
    }

    /// Whether a file for this variant was found on disk.
    pub fn is_present(&self) -> bool {
        self.checksum.is_some()
    }
}

/// A parent/clone group.
#[derive(Debug, Clone)]
pub struct Game {
    /// Name of the root parent.
    pub name: String,
    /// Members in catalog order.
    pub variants: Vec<Variant>,
}

impl Game {
    pub fn parent(&self) -> Option<&Variant> {
        self.variants.iter().find(|v| v.is_parent)
    }

    pub fn clones(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().filter(|v| !v.is_parent)
    }
}

/// All games of a catalog, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    name: String,
    games: Vec<Game>,
}

impl Catalog {
    /// Group records into games by following clone links to their root.
    pub fn from_records(
        name: impl Into<String>,
        records: Vec<VariantRecord>,
    ) -> Result<Self, CatalogError> {
        let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if by_name.insert(record.name.as_str(), i).is_some() {
                return Err(CatalogError::DuplicateName(record.name.clone()));
            }
        }

        let roots = records
            .iter()
            .enumerate()
            .map(|(i, _)| find_root(&records, &by_name, i))
            .collect::<Result<Vec<_>, _>>()?;
        drop(by_name);

        let mut game_of_root: HashMap<usize, usize> = HashMap::new();
        let mut games: Vec<Game> = Vec::new();

        for (i, (record, root)) in records.into_iter().zip(roots.iter().copied()).enumerate() {
            if record.roms.is_empty() {
                log::warn!("Catalog entry \"{}\" declares no ROMs", record.name);
            }
            let game_idx = *game_of_root.entry(root).or_insert_with(|| {
                games.push(Game {
                    name: String::new(),
                    variants: Vec::new(),
                });
                games.len() - 1
            });
            let is_parent = i == root;
            if is_parent {
                games[game_idx].name = record.name.clone();
            }
            games[game_idx]
                .variants
                .push(Variant::from_record(record, i, is_parent));
        }

        Ok(Self {
            name: name.into(),
            games,
        })
    }

    /// Build a catalog from a parsed DAT file.
    pub fn from_dat(dat: &DatFile) -> Result<Self, CatalogError> {
        let records = dat.games.iter().map(record_from_dat_game).collect();
        Self::from_records(dat.name.clone(), records)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn variant(&self, r: VariantRef) -> Option<&Variant> {
        self.games.get(r.game)?.variants.get(r.variant)
    }

    pub fn rom(&self, r: RomRef) -> Option<&RomEntry> {
        self.variant(r.variant_ref())?.roms.get(r.rom)
    }

    /// Flattened `(game, variant)` iteration in game order.
    pub fn variants(&self) -> impl Iterator<Item = (VariantRef, &Game, &Variant)> {
        self.games.iter().enumerate().flat_map(|(g, game)| {
            game.variants.iter().enumerate().map(move |(v, variant)| {
                (VariantRef { game: g, variant: v }, game, variant)
            })
        })
    }

    pub fn variant_count(&self) -> usize {
        self.games.iter().map(|g| g.variants.len()).sum()
    }

    /// Index every declared ROM checksum.
    pub fn checksum_index(&self) -> ChecksumIndex<RomRef> {
        let mut index = ChecksumIndex::new();
        for (vref, _, variant) in self.variants() {
            for (i, rom) in variant.roms.iter().enumerate() {
                let key = RomRef {
                    game: vref.game,
                    variant: vref.variant,
                    rom: i,
                };
                index.insert(key, rom.size, rom.crc32.as_deref(), rom.sha1.as_deref());
            }
        }
        index
    }

    /// Map file-name stems to ROMs: each variant title (to its first ROM)
    /// and each ROM name without its extension. Matching is case-sensitive;
    /// a stem shared by several variants maps to all of them.
    pub fn file_name_index(&self) -> HashMap<String, Vec<RomRef>> {
        let mut index: HashMap<String, Vec<RomRef>> = HashMap::new();
        let mut add = |key: String, rom: RomRef| {
            let roms = index.entry(key).or_default();
            if !roms.contains(&rom) {
                roms.push(rom);
            }
        };
        for (vref, _, variant) in self.variants() {
            if variant.roms.is_empty() {
                continue;
            }
            let first = RomRef {
                game: vref.game,
                variant: vref.variant,
                rom: 0,
            };
            add(variant.title.clone(), first);
            for (i, rom) in variant.roms.iter().enumerate() {
                let stem = Path::new(&rom.name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| rom.name.clone());
                add(stem, RomRef { rom: i, ..first });
            }
        }
        index
    }

    /// Whether any declared ROM is itself a zip archive.
    pub fn declares_archives(&self) -> bool {
        self.variants().any(|(_, _, v)| {
            v.roms.iter().any(|r| {
                Path::new(&r.name)
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
            })
        })
    }

    /// Record the identity of a file found for a variant. The first
    /// identity recorded wins; returns whether this call set it.
    pub fn set_checksum(&mut self, r: VariantRef, identity: FileIdentity) -> bool {
        let Some(variant) = self
            .games
            .get_mut(r.game)
            .and_then(|g| g.variants.get_mut(r.variant))
        else {
            return false;
        };
        if variant.checksum.is_some() {
            return false;
        }
        variant.checksum = Some(identity);
        true
    }
}

fn find_root(
    records: &[VariantRecord],
    by_name: &HashMap<&str, usize>,
    start: usize,
) -> Result<usize, CatalogError> {
    let mut seen = HashSet::new();
    let mut current = start;
    while let Some(parent) = records[current].clone_of.as_deref() {
        if !seen.insert(current) {
            return Err(CatalogError::cycle(&records[start].name));
        }
        current = *by_name
            .get(parent)
            .ok_or_else(|| CatalogError::dangling_parent(&records[current].name, parent))?;
    }
    Ok(current)
}

fn record_from_dat_game(game: &DatGame) -> VariantRecord {
    let mut regions: Vec<String> = Vec::new();
    let declared = game
        .releases
        .iter()
        .map(|r| r.region.as_str())
        .chain(game.region.as_deref());
    for value in declared {
        for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let resolved = region::resolve(part);
            if resolved.is_empty() {
                log::warn!(
                    "Unknown region \"{}\" on \"{}\"; keeping it without default languages",
                    part,
                    game.name
                );
                push_unique(&mut regions, part.to_uppercase());
            }
            for r in resolved {
                push_unique(&mut regions, r.code.to_string());
            }
        }
    }

    let mut languages: Vec<String> = Vec::new();
    for lang in game.releases.iter().filter_map(|r| r.language.as_deref()) {
        for code in lang.split([',', '+']).map(str::trim).filter(|c| !c.is_empty()) {
            push_unique(&mut languages, code.to_lowercase());
        }
    }

    VariantRecord {
        name: game.name.clone(),
        clone_of: game.clone_of.clone(),
        overrides: Overrides {
            regions: (!regions.is_empty()).then_some(regions),
            languages: (!languages.is_empty()).then_some(languages),
            status: None,
            category: game.is_bios.then_some(Category::Bios),
            bad_dump: None,
        },
        roms: game.roms.iter().map(RomEntry::from).collect(),
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
#[path = "tests/model_tests.rs"]
mod tests;
