//! Facet extraction from No-Intro style titles.
//!
//! Titles carry their metadata in tags:
//! ```text
//! Game Name (USA, Europe) (En,Fr,De) (Rev 1) (Beta 2) (Unl) [b]
//! ```
//!
//! [`extract`] never fails. Tags it does not recognize are ignored and
//! malformed revision/version values are dropped.

use romset_core::region;
use romset_core::{Category, ReleaseStatus, VersionTag};

/// Structured facets parsed from a title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Facets {
    /// Title without any parenthesized or bracketed tags.
    pub title: String,
    /// Region codes in order of first appearance (e.g. "USA", "EUR").
    pub regions: Vec<String>,
    /// Lowercase language codes. Inferred from the regions when no
    /// language tag is present (see `languages_inferred`).
    pub languages: Vec<String>,
    pub languages_inferred: bool,
    pub revision: Option<VersionTag>,
    pub version: Option<VersionTag>,
    pub status: ReleaseStatus,
    /// Tag attached to the status keyword, e.g. `2` in `(Beta 2)`.
    pub prerelease_tag: Option<VersionTag>,
    pub category: Category,
    pub bad_dump: bool,
}

/// Parse a title into its facets.
///
/// ```
/// use romset_catalog::name_parser::extract;
/// use romset_core::ReleaseStatus;
///
/// let f = extract("Foo (USA) (Rev 1)");
/// assert_eq!(f.title, "Foo");
/// assert_eq!(f.regions, vec!["USA"]);
/// assert_eq!(f.languages, vec!["en"]);
/// assert_eq!(f.revision.unwrap().as_str(), "1");
///
/// let f = extract("Foo (Japan) (Proto 2)");
/// assert_eq!(f.status, ReleaseStatus::Proto);
/// assert_eq!(f.prerelease_tag.unwrap().as_str(), "2");
/// ```
pub fn extract(name: &str) -> Facets {
    let (title, tags) = extract_title_and_tags(name);
    let mut facets = Facets {
        title,
        ..Default::default()
    };

    let mut explicit_languages: Option<Vec<String>> = None;
    let mut status_seen = false;
    let mut category: Option<Category> = None;
    let mut bios = false;

    for tag in &tags {
        match tag {
            Tag::Paren(content) => {
                let content = content.trim();
                add_regions(content, &mut facets.regions);

                if explicit_languages.is_none() {
                    explicit_languages = parse_language_list(content);
                }
                if facets.revision.is_none() {
                    facets.revision = parse_revision(content);
                }
                if facets.version.is_none() {
                    facets.version = parse_version(content);
                }
                if !status_seen {
                    if let Some((status, tag)) = parse_status(content) {
                        facets.status = status;
                        facets.prerelease_tag = tag;
                        status_seen = true;
                    }
                }
                if category.is_none() {
                    category = parse_category(content);
                }
            }
            Tag::Bracket(content) => {
                let content = content.trim();
                if is_bad_dump_marker(content) {
                    facets.bad_dump = true;
                } else if content.eq_ignore_ascii_case("BIOS") {
                    bios = true;
                }
            }
        }
    }

    facets.category = if bios {
        Category::Bios
    } else {
        category.unwrap_or_default()
    };

    match explicit_languages {
        Some(languages) => facets.languages = languages,
        None => {
            facets.languages = region::default_languages(facets.regions.iter().map(String::as_str));
            facets.languages_inferred = true;
        }
    }

    facets
}

// ── Internal parsing ────────────────────────────────────────────────────────

#[derive(Debug)]
enum Tag {
    Paren(String),
    Bracket(String),
}

/// Split a title into its tag-free text and a sequence of (parenthesized)
/// and [bracketed] tags. Tags may appear anywhere, e.g. `[BIOS] Name (USA)`.
/// A tag holding nested tags is replaced by its innermost ones, so
/// `Foo ((USA))` yields `USA`.
fn extract_title_and_tags(name: &str) -> (String, Vec<Tag>) {
    let mut tags = Vec::new();
    let mut title = String::new();
    let mut chars = name.char_indices();

    while let Some((i, ch)) = chars.next() {
        let (open, close, make_tag): (char, char, fn(String) -> Tag) = match ch {
            '(' => ('(', ')', Tag::Paren),
            '[' => ('[', ']', Tag::Bracket),
            _ => {
                title.push(ch);
                continue;
            }
        };

        let mut depth = 1u32;
        let start = i + open.len_utf8();
        let mut end = name.len();

        for (j, c) in chars.by_ref() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    end = j;
                    break;
                }
            }
        }

        let content = &name[start..end];
        let (_, nested) = extract_title_and_tags(content);
        if !nested.is_empty() {
            tags.extend(nested);
        } else if !content.trim().is_empty() {
            tags.push(make_tag(content.to_string()));
        }
    }

    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (title, tags)
}

/// A region tag is a comma-separated list where every element names a
/// region. Anything else (e.g. `USA, Disc 1`) contributes nothing.
fn add_regions(content: &str, regions: &mut Vec<String>) {
    let mut found: Vec<&'static region::Region> = Vec::new();
    for element in content.split(',') {
        let named = region::regions_named(element);
        if named.is_empty() {
            return;
        }
        found.extend(named);
    }
    for r in found {
        if !regions.iter().any(|c| c == r.code) {
            regions.push(r.code.to_string());
        }
    }
}

/// `En,Fr` / `en+fr`: two-letter codes separated by `,` or `+`.
fn parse_language_list(content: &str) -> Option<Vec<String>> {
    let mut languages = Vec::new();
    for code in content.split([',', '+']) {
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let code = code.to_ascii_lowercase();
        if !languages.contains(&code) {
            languages.push(code);
        }
    }
    Some(languages)
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// `Rev A`, `Rev 1.1`, `Rev1`.
fn parse_revision(content: &str) -> Option<VersionTag> {
    let rest = strip_prefix_ci(content, "rev")?;
    let starts_ok = rest
        .chars()
        .next()
        .is_some_and(|c| c.is_whitespace() || c.is_ascii_digit());
    if !starts_ok {
        return None;
    }
    VersionTag::parse(rest)
}

/// `v1.02`, `v 2`. The first character after `v` must be a digit.
fn parse_version(content: &str) -> Option<VersionTag> {
    let rest = strip_prefix_ci(content, "v")?.trim_start();
    if !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    VersionTag::parse(rest)
}

/// `Beta`, `Proto 2`, `Demo`, `Sample 1.1`.
fn parse_status(content: &str) -> Option<(ReleaseStatus, Option<VersionTag>)> {
    for status in ReleaseStatus::PRERELEASES {
        let Some(rest) = strip_prefix_ci(content, status.keyword()) else {
            continue;
        };
        if rest.is_empty() {
            return Some((status, None));
        }
        let tag = VersionTag::parse(rest)?;
        return Some((status, Some(tag)));
    }
    None
}

fn parse_category(content: &str) -> Option<Category> {
    let normalized = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = normalized.to_ascii_lowercase();
    match lower.as_str() {
        "unl" => Some(Category::Unlicensed),
        "pirate" => Some(Category::Pirate),
        "promo" => Some(Category::Promo),
        "program" | "test program" | "testprogram" => Some(Category::Program),
        "enhancement chip" | "enhancementchip" => Some(Category::EnhancementChip),
        _ => None,
    }
}

/// `[b]`, `[b1]`, `[B2]`.
fn is_bad_dump_marker(content: &str) -> bool {
    strip_prefix_ci(content, "b").is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
}
