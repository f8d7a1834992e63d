//! Zip archives holding ROM files.

use std::io::BufReader;
use std::path::Path;

use serde::Serialize;

use crate::error::DatError;
use crate::hasher::{FileHashes, HashOptions, hash_stream};
use crate::header::HeaderRules;

/// Hashes of one file stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveMember {
    /// Path inside the archive.
    pub name: String,
    pub hashes: FileHashes,
}

/// Whether `path` has a `.zip` extension (any case).
pub fn is_zip_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

/// Hash every file stored in the zip archive at `path`, in archive order.
///
/// Directory entries are skipped. Header rules are chosen by each member's
/// own extension.
pub fn hash_zip_members(
    path: &Path,
    rules: &HeaderRules,
    options: &HashOptions,
) -> Result<Vec<ArchiveMember>, DatError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

    let mut members = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let extension = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_owned);
        let size = entry.size();
        let hashes = hash_stream(&mut entry, size, extension.as_deref(), rules, options)?;
        log::debug!("{}:{} -> {}", path.display(), name, hashes.sha1);
        members.push(ArchiveMember { name, hashes });
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.add_directory("sub/", options).unwrap();
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn members_are_hashed_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.zip");
        write_zip(&path, &[("a.bin", b"Hello, World!"), ("sub/b.bin", b"")]);

        let members = hash_zip_members(&path, &HeaderRules::empty(), &HashOptions::default())
            .unwrap();
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a.bin", "sub/b.bin"]);
        assert_eq!(members[0].hashes.crc32, "ec4ac3d0");
        assert_eq!(members[1].hashes.data_size, 0);
    }

    #[test]
    fn member_headers_follow_member_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Foo (USA).zip");
        let mut image = b"NES\x1A".to_vec();
        image.resize(16, 0);
        image.extend_from_slice(&[0xEA; 64]);
        write_zip(&path, &[("Foo (USA).nes", &image), ("readme.txt", &image)]);

        let members =
            hash_zip_members(&path, &HeaderRules::builtin(), &HashOptions::default()).unwrap();
        assert_eq!(members[0].hashes.header_skipped, 16);
        assert_eq!(members[0].hashes.data_size, 64);
        assert_eq!(members[1].hashes.header_skipped, 0);
    }

    #[test]
    fn non_zip_data_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.zip");
        std::fs::write(&path, b"not a zip").unwrap();
        let err = hash_zip_members(&path, &HeaderRules::empty(), &HashOptions::default())
            .unwrap_err();
        assert!(matches!(err, DatError::Archive(_)));
    }

    #[test]
    fn zip_extension_ignores_case() {
        assert!(is_zip_path(Path::new("a/Foo.ZIP")));
        assert!(!is_zip_path(Path::new("a/Foo.7z")));
        assert!(!is_zip_path(Path::new("zip")));
    }
}
