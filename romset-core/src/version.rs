//! Ordered revision/version tags such as `Rev A`, `Rev 1`, `v1.02` or `Beta 2`.
//!
//! A tag is split into numeric and alphabetic segments. Segments compare
//! pairwise: numbers numerically, letters alphabetically (case-insensitive),
//! and any number sorts before any letter run, so `Rev 2 < Rev A < Rev B`.
//! Trailing zero segments are ignored, making `v1.0` equal to `v1`.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Segment {
    Number(u64),
    Text(String),
}

/// A parsed revision or version suffix.
#[derive(Debug, Clone)]
pub struct VersionTag {
    raw: String,
    segments: Vec<Segment>,
}

impl VersionTag {
    /// Parse the suffix of a `Rev`/`v`/prerelease tag.
    ///
    /// Accepts ASCII letters, digits and dots. Returns `None` for anything
    /// else, including an empty string or a number too large for `u64`.
    pub fn parse(s: &str) -> Option<Self> {
        let raw = s.trim();
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return None;
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut current_is_digit = false;

        for c in raw.chars() {
            if c == '.' {
                push_segment(&mut segments, &mut current, current_is_digit)?;
                continue;
            }
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != current_is_digit {
                push_segment(&mut segments, &mut current, current_is_digit)?;
            }
            current_is_digit = is_digit;
            current.push(c.to_ascii_lowercase());
        }
        push_segment(&mut segments, &mut current, current_is_digit)?;

        if segments.is_empty() {
            return None;
        }
        while matches!(segments.last(), Some(Segment::Number(0))) && segments.len() > 1 {
            segments.pop();
        }

        Some(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The tag text as written in the title.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn push_segment(segments: &mut Vec<Segment>, current: &mut String, is_digit: bool) -> Option<()> {
    if current.is_empty() {
        return Some(());
    }
    let text = std::mem::take(current);
    if is_digit {
        segments.push(Segment::Number(text.parse().ok()?));
    } else {
        segments.push(Segment::Text(text));
    }
    Some(())
}

impl PartialEq for VersionTag {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for VersionTag {}

impl Hash for VersionTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

impl PartialOrd for VersionTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.cmp(&other.segments)
    }
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl serde::Serialize for VersionTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[cfg(test)]
#[path = "tests/version_tests.rs"]
mod tests;
