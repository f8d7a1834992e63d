/// A catalog region and the languages assumed for it when a title names none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Three-letter code used on the command line and in reports (e.g. "USA").
    pub code: &'static str,
    /// Names as they appear inside title tags, matched case-insensitively.
    pub names: &'static [&'static str],
    /// Default languages, in priority order.
    pub languages: &'static [&'static str],
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}

/// Every region a title can be tagged with. "World" appears under
/// Europe, Japan and USA so a World release counts for all three.
pub static REGIONS: &[Region] = &[
    Region { code: "ASI", names: &["Asia"], languages: &["zh"] },
    Region { code: "ARG", names: &["Argentina"], languages: &["es"] },
    Region { code: "AUS", names: &["Australia"], languages: &["en"] },
    Region { code: "BRA", names: &["Brazil"], languages: &["pt"] },
    Region { code: "CAN", names: &["Canada"], languages: &["en", "fr"] },
    Region { code: "CHN", names: &["China", "Hong Kong"], languages: &["zh"] },
    Region { code: "DAN", names: &["Denmark"], languages: &["da"] },
    Region { code: "EUR", names: &["Europe", "World"], languages: &["en"] },
    Region { code: "FRA", names: &["France"], languages: &["fr"] },
    Region { code: "FYN", names: &["Finland"], languages: &["fi"] },
    Region { code: "GER", names: &["Germany"], languages: &["de"] },
    Region { code: "GRE", names: &["Greece"], languages: &["el"] },
    Region { code: "ITA", names: &["Italy"], languages: &["it"] },
    Region { code: "JPN", names: &["Japan", "World"], languages: &["ja"] },
    Region { code: "HOL", names: &["Netherlands"], languages: &["nl"] },
    Region { code: "KOR", names: &["Korea"], languages: &["ko"] },
    Region { code: "MEX", names: &["Mexico"], languages: &["es"] },
    Region { code: "NOR", names: &["Norway"], languages: &["no"] },
    Region { code: "RUS", names: &["Russia"], languages: &["ru"] },
    Region { code: "SPA", names: &["Spain"], languages: &["es"] },
    Region { code: "SWE", names: &["Sweden"], languages: &["sv"] },
    Region { code: "USA", names: &["USA", "World"], languages: &["en"] },
    Region { code: "TAI", names: &["Taiwan"], languages: &["zh"] },
];

/// Two-letter language codes accepted by strict validation.
pub static KNOWN_LANGUAGES: &[&str] = &[
    "ar", "bg", "ca", "cs", "da", "de", "el", "en", "es", "et", "fi", "fr", "ga", "he", "hi",
    "hr", "hu", "id", "is", "it", "ja", "ko", "lt", "lv", "ms", "nl", "no", "pl", "pt", "ro",
    "ru", "sk", "sl", "sq", "sr", "sv", "th", "tr", "uk", "vi", "zh",
];

/// Look up a region by its three-letter code (case-insensitive).
pub fn find_by_code(code: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|r| r.code.eq_ignore_ascii_case(code))
}

/// All regions whose title name fully matches `name` (case-insensitive).
///
/// Returns several regions for "World".
pub fn regions_named(name: &str) -> Vec<&'static Region> {
    let name = name.trim();
    REGIONS
        .iter()
        .filter(|r| r.names.iter().any(|n| n.eq_ignore_ascii_case(name)))
        .collect()
}

/// Resolve a catalog-declared region, accepting either a code ("EUR") or a
/// title name ("Europe", "World").
pub fn resolve(value: &str) -> Vec<&'static Region> {
    match find_by_code(value) {
        Some(r) => vec![r],
        None => regions_named(value),
    }
}

/// Languages implied by a list of region codes, de-duplicated in order.
pub fn default_languages<'a, I>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut languages: Vec<String> = Vec::new();
    for code in codes {
        let Some(region) = find_by_code(code) else {
            continue;
        };
        for lang in region.languages {
            if !languages.iter().any(|l| l == lang) {
                languages.push((*lang).to_string());
            }
        }
    }
    languages
}

/// Whether `code` is a language code strict validation accepts.
pub fn is_known_language(code: &str) -> bool {
    KNOWN_LANGUAGES.iter().any(|l| l.eq_ignore_ascii_case(code))
}

#[cfg(test)]
#[path = "tests/region_tests.rs"]
mod tests;
