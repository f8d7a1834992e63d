use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use serde::Serialize;
use sha1::Digest;

use crate::error::DatError;
use crate::header::HeaderRules;

/// Default read size per chunk: 32 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Files above this size (256 MiB) skip header detection.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Tuning for streaming hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashOptions {
    /// Bytes read per chunk.
    pub chunk_size: usize,
    /// Header detection is skipped for files larger than this; the whole
    /// file is still hashed.
    pub max_file_size: u64,
}

impl Default for HashOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Hash results for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHashes {
    /// CRC32 (lowercase hex, 8 chars)
    pub crc32: String,
    /// SHA1 (lowercase hex, 40 chars)
    pub sha1: String,
    /// Size of the data that was hashed (after header rules)
    pub data_size: u64,
    /// Number of bytes header rules removed from the hash
    pub header_skipped: u64,
}

/// Compute CRC32 and SHA1 of a seekable reader from its start.
pub fn hash_reader<R: Read + Seek>(
    reader: &mut R,
    extension: Option<&str>,
    rules: &HeaderRules,
    options: &HashOptions,
) -> Result<FileHashes, DatError> {
    let size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;
    hash_stream(reader, size, extension, rules, options)
}

/// Compute CRC32 and SHA1 of the `size` bytes a reader yields.
///
/// Header rules for `extension` are tried against the leading bytes. When
/// none matches, the data is streamed in `chunk_size` pieces. When one
/// does, the data is read into memory and every matching rule is applied
/// in order before hashing.
pub fn hash_stream<R: Read>(
    reader: &mut R,
    size: u64,
    extension: Option<&str>,
    rules: &HeaderRules,
    options: &HashOptions,
) -> Result<FileHashes, DatError> {
    let mut digests = Digests::new();

    if rules.is_empty() || size > options.max_file_size {
        let read = digests.update_from(reader, options.chunk_size, size)?;
        return Ok(digests.finish(read, 0));
    }

    let head_len = (rules.leading_len() as u64).min(size) as usize;
    let mut leading = vec![0u8; head_len];
    reader.read_exact(&mut leading)?;

    if rules.detect(extension, &leading, size).is_none() {
        digests.update(&leading);
        let read = digests.update_from(reader, options.chunk_size, size)?;
        return Ok(digests.finish(head_len as u64 + read, 0));
    }

    let mut data = leading;
    data.reserve(size.saturating_sub(head_len as u64) as usize);
    reader.read_to_end(&mut data)?;
    let read = data.len() as u64;

    let data = rules.transform(extension, data);
    for chunk in data.chunks(options.chunk_size.max(1)) {
        digests.update(chunk);
    }
    let kept = data.len() as u64;
    Ok(digests.finish(kept, read.saturating_sub(kept)))
}

/// Hash a file on disk, using its extension to select header rules.
pub fn hash_file(
    path: &Path,
    rules: &HeaderRules,
    options: &HashOptions,
) -> Result<FileHashes, DatError> {
    let mut file = std::fs::File::open(path)?;
    let extension = path.extension().and_then(|e| e.to_str());
    hash_reader(&mut file, extension, rules, options)
}

struct Digests {
    crc: crc32fast::Hasher,
    sha: sha1::Sha1,
}

impl Digests {
    fn new() -> Self {
        Self {
            crc: crc32fast::Hasher::new(),
            sha: sha1::Sha1::new(),
        }
    }

    fn update(&mut self, data: &[u8]) {
        self.crc.update(data);
        self.sha.update(data);
    }

    /// Feed the rest of `reader`; returns the number of bytes read.
    fn update_from<R: Read>(
        &mut self,
        reader: &mut R,
        chunk_size: usize,
        expected: u64,
    ) -> std::io::Result<u64> {
        let buf_len = chunk_size.max(1).min(expected.max(1) as usize);
        let mut buf = vec![0u8; buf_len];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.update(&buf[..n]);
            total += n as u64;
        }
        Ok(total)
    }

    fn finish(self, data_size: u64, header_skipped: u64) -> FileHashes {
        FileHashes {
            crc32: format!("{:08x}", self.crc.finalize()),
            sha1: format!("{:x}", self.sha.finalize()),
            data_size,
            header_skipped,
        }
    }
}

#[cfg(test)]
#[path = "tests/hasher_tests.rs"]
mod tests;
