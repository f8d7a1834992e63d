//! Candidate ranking and 1G1R winner selection.
//!
//! Each game's variants are first narrowed by the pre-filters, then sorted
//! with a lexicographic comparator built from an ordered list of
//! [`RankKey`]s. Ties that survive every key fall back to catalog order,
//! so ranking is deterministic.

use std::cmp::Ordering;

use romset_catalog::{Catalog, Game, Variant, VariantRef};
use romset_core::{ReleaseStatus, VersionTag};
use serde::Serialize;

use crate::policy::RankingPolicy;

/// One comparison criterion, most significant first in [`rank_keys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKey {
    /// Good dumps before bad dumps.
    GoodDump,
    /// Retail before prereleases (inverted with `prefer_prereleases`).
    Retail,
    /// Titles not on the avoid list first.
    NotAvoided,
    /// Earlier selected region first.
    Region,
    /// Higher weighted language score first.
    Language,
    /// Parents before clones, only with `prefer_parents`.
    PreferParent,
    /// Catalog order, only with `input_order`.
    InputOrder,
    /// Titles on the prefer list first.
    Preferred,
    Revision,
    Version,
    /// Newest prerelease tag first, per prerelease kind.
    PrereleaseRecency,
    /// More supported languages first.
    LanguageCount,
    /// Parents before clones.
    Parent,
}

/// The comparator keys for a policy, most significant first.
pub fn rank_keys(policy: &RankingPolicy) -> Vec<RankKey> {
    let mut keys = vec![RankKey::GoodDump, RankKey::Retail, RankKey::NotAvoided];
    if policy.prioritize_languages {
        keys.extend([RankKey::Language, RankKey::Region]);
    } else {
        keys.extend([RankKey::Region, RankKey::Language]);
    }
    if policy.prefer_parents {
        keys.push(RankKey::PreferParent);
    }
    if policy.input_order {
        keys.push(RankKey::InputOrder);
    }
    keys.extend([
        RankKey::Preferred,
        RankKey::Revision,
        RankKey::Version,
        RankKey::PrereleaseRecency,
        RankKey::LanguageCount,
        RankKey::Parent,
    ]);
    keys
}

/// A variant with the policy-dependent values the comparator needs.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub variant: &'a Variant,
    /// Index of the first selected region the variant has; `None` = no match.
    pub region_rank: Option<usize>,
    pub language_score: u64,
    pub avoided: bool,
    pub preferred: bool,
}

impl<'a> Candidate<'a> {
    pub fn new(variant: &'a Variant, policy: &RankingPolicy) -> Self {
        Self {
            variant,
            region_rank: region_rank(variant, &policy.selected_regions),
            language_score: language_score(
                variant,
                &policy.selected_languages,
                policy.language_weight,
            ),
            avoided: policy.avoid.matches(&variant.title),
            preferred: policy.prefer.matches(&variant.title),
        }
    }
}

fn region_rank(variant: &Variant, selected: &[String]) -> Option<usize> {
    selected
        .iter()
        .position(|code| variant.regions.iter().any(|r| r == code))
}

/// Σ weight^(N-1-i) over the selected languages the variant supports.
fn language_score(variant: &Variant, selected: &[String], weight: u32) -> u64 {
    let n = selected.len();
    selected
        .iter()
        .enumerate()
        .filter(|(_, lang)| variant.languages.contains(lang))
        .fold(0u64, |acc, (i, _)| {
            let exp = u32::try_from(n - 1 - i).unwrap_or(u32::MAX);
            acc.saturating_add(u64::from(weight).saturating_pow(exp))
        })
}

/// Recency of a variant for one prerelease kind. Variants without that
/// status, or with it but untagged, count as the newest.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Recency<'a> {
    Tagged(&'a VersionTag),
    Newest,
}

fn recency(variant: &Variant, kind: ReleaseStatus) -> Recency<'_> {
    match (&variant.prerelease_tag, variant.status == kind) {
        (Some(tag), true) => Recency::Tagged(tag),
        _ => Recency::Newest,
    }
}

impl RankKey {
    /// `Less` means `a` ranks ahead of `b`.
    pub fn compare(self, a: &Candidate<'_>, b: &Candidate<'_>, policy: &RankingPolicy) -> Ordering {
        let (va, vb) = (a.variant, b.variant);
        match self {
            RankKey::GoodDump => va.bad_dump.cmp(&vb.bad_dump),
            RankKey::Retail => {
                let ord = va.status.is_prerelease().cmp(&vb.status.is_prerelease());
                if policy.prefer_prereleases {
                    ord.reverse()
                } else {
                    ord
                }
            }
            RankKey::NotAvoided => a.avoided.cmp(&b.avoided),
            RankKey::Region => {
                let rank = |c: &Candidate<'_>| c.region_rank.unwrap_or(usize::MAX);
                rank(a).cmp(&rank(b))
            }
            RankKey::Language => b.language_score.cmp(&a.language_score),
            RankKey::PreferParent | RankKey::Parent => vb.is_parent.cmp(&va.is_parent),
            RankKey::InputOrder => va.input_index.cmp(&vb.input_index),
            RankKey::Preferred => b.preferred.cmp(&a.preferred),
            RankKey::Revision => {
                let ord = vb.revision.cmp(&va.revision);
                if policy.early_revisions {
                    ord.reverse()
                } else {
                    ord
                }
            }
            RankKey::Version => {
                let ord = vb.version.cmp(&va.version);
                if policy.early_versions {
                    ord.reverse()
                } else {
                    ord
                }
            }
            RankKey::PrereleaseRecency => ReleaseStatus::PRERELEASES
                .iter()
                .map(|&kind| recency(vb, kind).cmp(&recency(va, kind)))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal),
            RankKey::LanguageCount => vb.languages.len().cmp(&va.languages.len()),
        }
    }
}

/// Compare two candidates over `keys`, then by catalog order.
pub fn compare(
    keys: &[RankKey],
    a: &Candidate<'_>,
    b: &Candidate<'_>,
    policy: &RankingPolicy,
) -> Ordering {
    keys.iter()
        .map(|key| key.compare(a, b, policy))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| a.variant.input_index.cmp(&b.variant.input_index))
}

/// Whether a variant survives the policy's pre-filters. Presence on disk
/// is checked separately by [`select_winners`].
pub fn admits(variant: &Variant, policy: &RankingPolicy) -> bool {
    if policy.exclude.matches(&variant.title) || policy.filters.rejects(variant) {
        return false;
    }

    let speaks_selected = policy
        .selected_languages
        .iter()
        .any(|lang| variant.languages.contains(lang));
    if policy.only_selected_lang && !policy.selected_languages.is_empty() && !speaks_selected {
        return false;
    }

    if policy.all_regions {
        return true;
    }
    region_rank(variant, &policy.selected_regions).is_some()
        || (policy.all_regions_with_lang && speaks_selected)
}

/// A game's admitted variants, best first.
#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    pub candidates: Vec<Candidate<'a>>,
    /// Variants removed by the pre-filters.
    pub filtered: usize,
}

impl<'a> Ranking<'a> {
    pub fn best(&self) -> Option<&'a Variant> {
        self.candidates.first().map(|c| c.variant)
    }
}

/// Filter and order a game's variants.
pub fn rank_game<'a>(game: &'a Game, policy: &RankingPolicy) -> Ranking<'a> {
    let keys = rank_keys(policy);
    let mut candidates: Vec<Candidate<'a>> = game
        .variants
        .iter()
        .filter(|v| admits(v, policy))
        .map(|v| Candidate::new(v, policy))
        .collect();
    let filtered = game.variants.len() - candidates.len();
    candidates.sort_by(|a, b| compare(&keys, a, b, policy));
    Ranking {
        candidates,
        filtered,
    }
}

/// Outcome of selecting a game.
#[derive(Debug, Clone, Copy)]
pub enum Pick<'a> {
    Winner(&'a Variant),
    /// Nothing survived the filters.
    NoCandidate,
    /// The top candidate matched the exclude-after list; the game is dropped.
    ExcludedAfter(&'a Variant),
}

/// Select a game's winner.
pub fn pick<'a>(game: &'a Game, policy: &RankingPolicy, require_present: bool) -> Pick<'a> {
    let ranking = rank_game(game, policy);
    let top = ranking
        .candidates
        .iter()
        .map(|c| c.variant)
        .find(|v| !require_present || v.is_present());

    match top {
        None => Pick::NoCandidate,
        Some(v) if policy.exclude_after.matches(&v.title) => Pick::ExcludedAfter(v),
        Some(v) => Pick::Winner(v),
    }
}

/// Zero or one winner for a game.
pub fn select_winners<'a>(
    game: &'a Game,
    policy: &RankingPolicy,
    require_present: bool,
) -> Vec<&'a Variant> {
    match pick(game, policy, require_present) {
        Pick::Winner(v) => vec![v],
        Pick::NoCandidate | Pick::ExcludedAfter(_) => Vec::new(),
    }
}

/// Winners for a whole catalog, in game order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Selection {
    pub winners: Vec<VariantRef>,
    /// Names of games with no admissible variant.
    pub no_candidate: Vec<String>,
    /// Names of games dropped by the exclude-after list.
    pub excluded_after: Vec<String>,
    pub games: usize,
}

pub fn select_all(catalog: &Catalog, policy: &RankingPolicy, require_present: bool) -> Selection {
    let mut selection = Selection {
        games: catalog.games().len(),
        ..Default::default()
    };

    for (g, game) in catalog.games().iter().enumerate() {
        match pick(game, policy, require_present) {
            Pick::Winner(winner) => {
                let variant = game
                    .variants
                    .iter()
                    .position(|v| v.input_index == winner.input_index)
                    .unwrap_or_default();
                log::debug!("{}: selected \"{}\"", game.name, winner.title);
                selection.winners.push(VariantRef { game: g, variant });
            }
            Pick::NoCandidate => {
                log::debug!("{}: no candidate", game.name);
                selection.no_candidate.push(game.name.clone());
            }
            Pick::ExcludedAfter(top) => {
                log::debug!("{}: dropped, top candidate \"{}\" is excluded", game.name, top.title);
                selection.excluded_after.push(game.name.clone());
            }
        }
    }
    selection
}

#[cfg(test)]
#[path = "tests/ranking_tests.rs"]
mod tests;
