use super::*;

fn usa() -> PolicyBuilder {
    PolicyBuilder::new(["usa"])
}

#[test]
fn defaults_are_applied() {
    let config = usa().build().unwrap();
    assert_eq!(config.ranking.selected_regions(), ["USA"]);
    assert_eq!(config.ranking.language_weight(), DEFAULT_LANGUAGE_WEIGHT);
    assert_eq!(config.scan.threads, 4);
    assert_eq!(config.scan.hash.chunk_size, 33_554_432);
    assert_eq!(config.scan.hash.max_file_size, 268_435_456);
    assert!(config.scan.recursive);
    assert!(!config.scan.header_rules.is_empty());
    assert!(config.output.is_none());
    assert!(!config.require_present);
}

#[test]
fn codes_are_normalized_and_deduplicated() {
    let config = PolicyBuilder::new(["usa", " EUR", "USA"])
        .languages(["EN", "fr"])
        .build()
        .unwrap();
    assert_eq!(config.ranking.selected_regions(), ["USA", "EUR"]);
    assert_eq!(config.ranking.selected_languages(), ["en", "fr"]);
}

#[test]
fn empty_region_selection_is_rejected() {
    let err = PolicyBuilder::default().build().unwrap_err();
    assert!(matches!(err, PolicyError::NoRegions));
}

#[test]
fn zero_values_are_rejected() {
    let mut b = usa();
    b.language_weight = 0;
    assert!(matches!(b.build(), Err(PolicyError::Zero { .. })));

    let mut b = usa();
    b.threads = 0;
    assert!(matches!(b.build(), Err(PolicyError::Zero { name: "Threads" })));

    let mut b = usa();
    b.chunk_size = 0;
    assert!(matches!(b.build(), Err(PolicyError::Zero { .. })));

    let mut b = usa();
    b.max_file_size = 0;
    assert!(matches!(b.build(), Err(PolicyError::Zero { .. })));
}

#[test]
fn conflicting_orderings_are_rejected() {
    let mut b = usa();
    b.early_revisions = true;
    b.input_order = true;
    assert!(matches!(b.build(), Err(PolicyError::Conflict(_))));

    let mut b = usa();
    b.early_versions = true;
    b.prefer_parents = true;
    assert!(matches!(b.build(), Err(PolicyError::Conflict(_))));

    let mut b = usa();
    b.prefer_parents = true;
    b.input_order = true;
    assert!(matches!(b.build(), Err(PolicyError::Conflict(_))));

    let mut b = usa();
    b.all_regions = true;
    b.all_regions_with_lang = true;
    assert!(matches!(b.build(), Err(PolicyError::Conflict(_))));
}

#[test]
fn word_list_options_need_a_list() {
    let mut b = usa();
    b.ignore_case = true;
    assert!(matches!(
        b.build(),
        Err(PolicyError::WordListOptionWithoutList(_))
    ));

    let mut b = usa();
    b.regex = true;
    b.avoid = Some("Beta".into());
    assert!(b.build().is_ok());
}

#[test]
fn invalid_regex_is_rejected() {
    let mut b = usa();
    b.regex = true;
    b.prefer = Some("[unclosed".into());
    assert!(matches!(b.build(), Err(PolicyError::InvalidRegex { .. })));
}

#[test]
fn extension_requires_no_scan() {
    let mut b = usa();
    b.extension = Some(".NES".into());
    assert!(matches!(b.clone().build(), Err(PolicyError::ExtensionWhileScanning)));

    b.no_scan = true;
    let config = b.build().unwrap();
    assert_eq!(config.scan.extension.as_deref(), Some("nes"));
}

#[test]
fn output_requires_input() {
    let mut b = usa();
    b.output_dir = Some("/tmp/out".into());
    assert!(matches!(b.clone().build(), Err(PolicyError::OutputWithoutInput)));

    b.input_dir = Some("/tmp/in".into());
    b.group_by_first_letter = true;
    let config = b.build().unwrap();
    let output = config.output.unwrap();
    assert_eq!(output.mode, OutputMode::Copy);
    assert!(output.group_by_first_letter);
}

#[test]
fn require_present_defaults_on_with_input() {
    let mut b = usa();
    b.input_dir = Some("/tmp/in".into());
    assert!(b.clone().build().unwrap().require_present);

    b.require_present = Some(false);
    assert!(!b.build().unwrap().require_present);
}

#[test]
fn strict_rejects_unknown_codes() {
    let mut b = PolicyBuilder::new(["USA", "XYZ"]);
    assert!(b.clone().build().is_ok());
    b.strict = true;
    assert!(matches!(b.build(), Err(PolicyError::UnknownRegion(code)) if code == "XYZ"));

    let mut b = usa().languages(["en", "qq"]);
    b.strict = true;
    assert!(matches!(b.build(), Err(PolicyError::UnknownLanguage(code)) if code == "qq"));
}

#[test]
fn no_all_enables_everything_but_unlicensed() {
    let mut b = usa();
    b.no_all = true;
    let filters = b.build().unwrap().ranking.filters();
    assert!(filters.no_bios && filters.no_proto && filters.no_promo);
    assert!(!filters.no_unlicensed);
}

#[test]
fn scan_options_validate_without_regions() {
    let mut b = PolicyBuilder::default();
    b.no_scan = true;
    b.extension = Some("ZIP".into());
    let scan = b.scan_options().unwrap();
    assert!(scan.no_scan);
    assert_eq!(scan.extension.as_deref(), Some("zip"));

    b.threads = 0;
    assert!(matches!(b.scan_options(), Err(PolicyError::Zero { name: "Threads" })));
}
