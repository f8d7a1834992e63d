use super::*;

fn tag(s: &str) -> VersionTag {
    VersionTag::parse(s).unwrap()
}

#[test]
fn numbers_compare_numerically() {
    assert!(tag("2") < tag("10"));
    assert!(tag("1.9") < tag("1.10"));
}

#[test]
fn numbers_sort_before_letters() {
    assert!(tag("1") < tag("A"));
    assert!(tag("9") < tag("A"));
    assert!(tag("A") < tag("B"));
}

#[test]
fn letters_ignore_case() {
    assert_eq!(tag("a"), tag("A"));
}

#[test]
fn trailing_zero_segments_are_ignored() {
    assert_eq!(tag("1.0"), tag("1"));
    assert!(tag("1.0") < tag("1.1"));
    assert_eq!(tag("0"), tag("0.0"));
}

#[test]
fn mixed_segments_split_on_kind() {
    assert!(tag("1a") > tag("1"));
    assert!(tag("1a") < tag("1b"));
    assert!(tag("1a") < tag("2"));
}

#[test]
fn missing_tag_sorts_lowest() {
    assert!(None < Some(tag("0")));
}

#[test]
fn invalid_input_is_rejected() {
    assert!(VersionTag::parse("").is_none());
    assert!(VersionTag::parse("  ").is_none());
    assert!(VersionTag::parse("1-2").is_none());
    assert!(VersionTag::parse("...").is_none());
    assert!(VersionTag::parse("99999999999999999999999").is_none());
}

#[test]
fn display_keeps_raw_text() {
    assert_eq!(tag("1.02").to_string(), "1.02");
    assert_eq!(tag("1.02").as_str(), "1.02");
}
