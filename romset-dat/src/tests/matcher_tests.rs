use super::*;

fn hashes(crc32: &str, sha1: &str, data_size: u64) -> FileHashes {
    FileHashes {
        crc32: crc32.into(),
        sha1: sha1.into(),
        data_size,
        header_skipped: 0,
    }
}

fn make_index() -> ChecksumIndex<usize> {
    let mut index = ChecksumIndex::new();
    index.insert(
        0,
        524288,
        Some("b19ed489"),
        Some("6b47bb75d16514b6a476aa0c73a683a2a4c18765"),
    );
    index.insert(1, 8388608, Some("635A2BFF"), None);
    index
}

#[test]
fn sha1_match_wins() {
    let index = make_index();
    let m = index
        .match_hashes(&hashes(
            "00000000",
            "6b47bb75d16514b6a476aa0c73a683a2a4c18765",
            1,
        ))
        .unwrap();
    assert_eq!(m.keys, &[0]);
    assert_eq!(m.method, MatchMethod::Sha1);
}

#[test]
fn crc32_requires_matching_size() {
    let index = make_index();
    let hit = index.match_hashes(&hashes("635a2bff", "ff", 8388608)).unwrap();
    assert_eq!(hit.keys, &[1]);
    assert_eq!(hit.method, MatchMethod::Crc32);

    assert!(index.match_hashes(&hashes("635a2bff", "ff", 1024)).is_none());
}

#[test]
fn unknown_hashes_do_not_match() {
    let index = make_index();
    assert!(index.match_hashes(&hashes("deadbeef", "ff", 4)).is_none());
}

#[test]
fn shared_dumps_return_every_key() {
    let mut index = ChecksumIndex::new();
    index.insert("first", 4, Some("deadbeef"), Some("aa"));
    index.insert("second", 4, Some("deadbeef"), Some("aa"));
    index.insert("second", 4, Some("deadbeef"), Some("aa"));
    let hit = index.match_hashes(&hashes("deadbeef", "aa", 4)).unwrap();
    assert_eq!(hit.keys, &["first", "second"]);
    assert_eq!(index.len(), 1);

    let by_crc = index.match_hashes(&hashes("deadbeef", "bb", 4)).unwrap();
    assert_eq!(by_crc.method, MatchMethod::Crc32);
    assert_eq!(by_crc.keys.len(), 2);
}

#[test]
fn empty_index() {
    let index: ChecksumIndex<u8> = ChecksumIndex::new();
    assert!(index.is_empty());
    assert!(index.match_hashes(&hashes("00000000", "00", 0)).is_none());
}
