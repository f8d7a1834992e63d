use serde::{Deserialize, Serialize};

/// How far along its release a variant is. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    #[default]
    Retail,
    Beta,
    Proto,
    Demo,
    Sample,
}

impl ReleaseStatus {
    /// All prerelease kinds, in the order their tags are compared when ranking.
    pub const PRERELEASES: [ReleaseStatus; 4] = [Self::Sample, Self::Demo, Self::Beta, Self::Proto];

    pub fn is_prerelease(&self) -> bool {
        !matches!(self, Self::Retail)
    }

    /// The keyword used for this status inside title tags.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Retail => "Retail",
            Self::Beta => "Beta",
            Self::Proto => "Proto",
            Self::Demo => "Demo",
            Self::Sample => "Sample",
        }
    }

    /// Parse a title keyword (case-insensitive). "Retail" is not a keyword.
    pub fn from_keyword(s: &str) -> Option<Self> {
        [Self::Beta, Self::Proto, Self::Demo, Self::Sample]
            .into_iter()
            .find(|status| status.keyword().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// What kind of product a variant is, independent of its release status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Standard,
    Bios,
    Program,
    EnhancementChip,
    Pirate,
    Promo,
    Unlicensed,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Bios => "BIOS",
            Self::Program => "Program",
            Self::EnhancementChip => "Enhancement Chip",
            Self::Pirate => "Pirate",
            Self::Promo => "Promo",
            Self::Unlicensed => "Unlicensed",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_parse_case_insensitively() {
        assert_eq!(ReleaseStatus::from_keyword("beta"), Some(ReleaseStatus::Beta));
        assert_eq!(ReleaseStatus::from_keyword("PROTO"), Some(ReleaseStatus::Proto));
        assert_eq!(ReleaseStatus::from_keyword("Retail"), None);
        assert_eq!(ReleaseStatus::from_keyword("Kiosk"), None);
    }

    #[test]
    fn only_retail_is_not_prerelease() {
        assert!(!ReleaseStatus::Retail.is_prerelease());
        for status in ReleaseStatus::PRERELEASES {
            assert!(status.is_prerelease());
        }
    }
}
