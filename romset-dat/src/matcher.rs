use std::collections::HashMap;

use serde::Serialize;

use crate::hasher::FileHashes;

/// How a match was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    /// Matched by SHA1 hash (definitive)
    Sha1,
    /// Matched by CRC32 hash plus data size
    Crc32,
    /// Matched by file name after a checksum miss (or without hashing)
    FileName,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MatchMethod::Sha1 => "SHA1",
            MatchMethod::Crc32 => "CRC32",
            MatchMethod::FileName => "file name",
        })
    }
}

/// Result of matching hashes against a [`ChecksumIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumMatch<'a, K> {
    /// Every entry declaring the checksum, in insertion order.
    pub keys: &'a [K],
    pub method: MatchMethod,
}

/// Maps declared ROM checksums to caller-chosen keys.
///
/// Several entries may declare the same dump; a lookup returns all of them.
#[derive(Debug, Clone)]
pub struct ChecksumIndex<K> {
    /// SHA1 (lowercase hex) → keys
    by_sha1: HashMap<String, Vec<K>>,
    /// (CRC32 (lowercase hex), size) → keys
    by_crc32: HashMap<(String, u64), Vec<K>>,
}

impl<K> Default for ChecksumIndex<K> {
    fn default() -> Self {
        Self {
            by_sha1: HashMap::new(),
            by_crc32: HashMap::new(),
        }
    }
}

impl<K: Copy + PartialEq> ChecksumIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declared ROM. Checksums are expected in lowercase hex.
    pub fn insert(&mut self, key: K, size: u64, crc32: Option<&str>, sha1: Option<&str>) {
        if let Some(sha1) = sha1 {
            push_key(self.by_sha1.entry(sha1.to_lowercase()).or_default(), key);
        }
        if let Some(crc) = crc32 {
            push_key(self.by_crc32.entry((crc.to_lowercase(), size)).or_default(), key);
        }
    }

    /// Match by hash: SHA1 first, then CRC32 with matching size.
    pub fn match_hashes(&self, hashes: &FileHashes) -> Option<ChecksumMatch<'_, K>> {
        if let Some(keys) = self.by_sha1.get(&hashes.sha1) {
            return Some(ChecksumMatch {
                keys,
                method: MatchMethod::Sha1,
            });
        }

        self.by_crc32
            .get(&(hashes.crc32.clone(), hashes.data_size))
            .map(|keys| ChecksumMatch {
                keys,
                method: MatchMethod::Crc32,
            })
    }

    /// Number of distinct checksums indexed.
    pub fn len(&self) -> usize {
        self.by_sha1.len().max(self.by_crc32.len())
    }

    pub fn is_empty(&self) -> bool {
        self.by_sha1.is_empty() && self.by_crc32.is_empty()
    }
}

fn push_key<K: PartialEq>(keys: &mut Vec<K>, key: K) {
    if !keys.contains(&key) {
        keys.push(key);
    }
}

#[cfg(test)]
#[path = "tests/matcher_tests.rs"]
mod tests;
