//! Word lists for the prefer / avoid / exclude / exclude-after options.
//!
//! A list is either given inline (`"Beta,Proto"`, split on the configured
//! separator) or read from a file with `file:<path>`, one entry per line.
//! Entries match titles as plain substrings or, in regex mode, as regular
//! expressions searched anywhere in the title.

use std::path::PathBuf;

use regex::{Regex, RegexBuilder};

use crate::error::PolicyError;

/// How entries of every word list are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListOptions {
    pub ignore_case: bool,
    pub regex: bool,
    pub separator: String,
}

impl Default for WordListOptions {
    fn default() -> Self {
        Self {
            ignore_case: false,
            regex: false,
            separator: ",".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Substring(String),
    Pattern(Regex),
}

/// A compiled list of entries. A title matches when any entry matches.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    matchers: Vec<Matcher>,
    ignore_case: bool,
}

impl WordList {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse an inline list or a `file:<path>` reference.
    pub fn parse(raw: &str, options: &WordListOptions) -> Result<Self, PolicyError> {
        let entries: Vec<String> = match raw.strip_prefix("file:") {
            Some(path) => {
                let path = PathBuf::from(path.trim());
                let contents = std::fs::read_to_string(&path)
                    .map_err(|source| PolicyError::WordListFile { path, source })?;
                contents.lines().map(str::to_string).collect()
            }
            None if options.separator.is_empty() => vec![raw.to_string()],
            None => raw
                .split(options.separator.as_str())
                .map(str::to_string)
                .collect(),
        };
        Self::from_entries(entries, options)
    }

    /// Compile entries. Blank entries are ignored; others are trimmed.
    pub fn from_entries<I, S>(entries: I, options: &WordListOptions) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matchers = Vec::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            let matcher = if options.regex {
                let re = RegexBuilder::new(entry)
                    .case_insensitive(options.ignore_case)
                    .build()
                    .map_err(|source| PolicyError::InvalidRegex {
                        pattern: entry.to_string(),
                        source,
                    })?;
                Matcher::Pattern(re)
            } else if options.ignore_case {
                Matcher::Substring(entry.to_lowercase())
            } else {
                Matcher::Substring(entry.to_string())
            };
            matchers.push(matcher);
        }
        Ok(Self {
            matchers,
            ignore_case: options.ignore_case,
        })
    }

    pub fn matches(&self, title: &str) -> bool {
        if self.matchers.is_empty() {
            return false;
        }
        let folded = if self.ignore_case {
            title.to_lowercase()
        } else {
            String::new()
        };
        self.matchers.iter().any(|m| match m {
            Matcher::Pattern(re) => re.is_match(title),
            Matcher::Substring(needle) if self.ignore_case => folded.contains(needle.as_str()),
            Matcher::Substring(needle) => title.contains(needle.as_str()),
        })
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}
