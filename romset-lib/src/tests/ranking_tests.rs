use super::*;
use crate::policy::PolicyBuilder;
use romset_catalog::{FileIdentity, Overrides, VariantRecord};

fn catalog(names: &[&str]) -> Catalog {
    let parent = names[0];
    let records = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let record = VariantRecord::new(*name);
            if i == 0 {
                record
            } else {
                record.clone_of(parent)
            }
        })
        .collect();
    Catalog::from_records("test", records).unwrap()
}

fn policy(builder: PolicyBuilder) -> RankingPolicy {
    builder.build().unwrap().ranking
}

fn usa_eur_en() -> PolicyBuilder {
    PolicyBuilder::new(["USA", "EUR"]).languages(["en"])
}

fn titles(ranking: &Ranking<'_>) -> Vec<String> {
    ranking
        .candidates
        .iter()
        .map(|c| c.variant.title.clone())
        .collect()
}

/// Compare the first two variants of a catalog under a single key.
fn key_order(names: &[&str], key: RankKey, builder: PolicyBuilder) -> Ordering {
    let cat = catalog(names);
    let policy = policy(builder);
    let game = &cat.games()[0];
    let a = Candidate::new(&game.variants[0], &policy);
    let b = Candidate::new(&game.variants[1], &policy);
    key.compare(&a, &b, &policy)
}

#[test]
fn foo_scenario_usa_revision_wins() {
    let cat = catalog(&[
        "Foo (USA) (En) (Rev 1)",
        "Foo (Europe) (En,Fr)",
        "Foo (USA) (En) (Proto)",
    ]);
    let policy = policy(usa_eur_en());
    let winners = select_winners(&cat.games()[0], &policy, false);
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].title, "Foo (USA) (En) (Rev 1)");

    let ranking = rank_game(&cat.games()[0], &policy);
    assert_eq!(
        titles(&ranking),
        vec![
            "Foo (USA) (En) (Rev 1)",
            "Foo (Europe) (En,Fr)",
            "Foo (USA) (En) (Proto)",
        ]
    );
}

#[test]
fn foo_scenario_no_proto_keeps_winner() {
    let cat = catalog(&[
        "Foo (USA) (En) (Rev 1)",
        "Foo (Europe) (En,Fr)",
        "Foo (USA) (En) (Proto)",
    ]);
    let mut builder = usa_eur_en();
    builder.filters.no_proto = true;
    let policy = policy(builder);

    let ranking = rank_game(&cat.games()[0], &policy);
    assert_eq!(ranking.filtered, 1);
    assert_eq!(ranking.best().unwrap().title, "Foo (USA) (En) (Rev 1)");
}

#[test]
fn foo_scenario_exclude_after_drops_game() {
    let cat = catalog(&["Foo (Europe) (En,Fr)", "Foo (USA) (En) (Proto)"]);
    let mut builder = PolicyBuilder::new(["USA"]).languages(["en"]);
    builder.exclude_after = Some("Proto".into());
    let policy = policy(builder);

    let game = &cat.games()[0];
    assert!(matches!(pick(game, &policy, false), Pick::ExcludedAfter(v) if v.title == "Foo (USA) (En) (Proto)"));
    assert!(select_winners(game, &policy, false).is_empty());
}

#[test]
fn exclude_after_never_falls_back() {
    let cat = catalog(&["Foo (Europe) (En,Fr)", "Foo (USA) (En) (Rev 1)"]);
    let mut builder = PolicyBuilder::new(["USA"]).languages(["en"]);
    builder.exclude_after = Some("Rev 1".into());
    builder.all_regions = true;
    let policy = policy(builder);

    // Europe survives the filters but is never offered as a fallback.
    let ranking = rank_game(&cat.games()[0], &policy);
    assert_eq!(titles(&ranking), vec!["Foo (USA) (En) (Rev 1)", "Foo (Europe) (En,Fr)"]);
    assert!(select_winners(&cat.games()[0], &policy, false).is_empty());
}

#[test]
fn exclude_removes_variants_entirely() {
    let cat = catalog(&["Foo (USA)", "Foo (USA) (Beta)"]);
    let mut builder = PolicyBuilder::new(["USA"]);
    builder.exclude = Some("(USA)".into());
    let policy = policy(builder);
    assert!(rank_game(&cat.games()[0], &policy).candidates.is_empty());
    assert!(matches!(pick(&cat.games()[0], &policy, false), Pick::NoCandidate));
}

#[test]
fn good_dump_beats_bad_dump() {
    assert_eq!(
        key_order(&["Foo (USA) [b]", "Foo (USA)"], RankKey::GoodDump, usa_eur_en()),
        Ordering::Greater
    );
}

#[test]
fn retail_beats_prerelease_unless_inverted() {
    let names = ["Foo (USA) (Beta)", "Foo (USA)"];
    assert_eq!(key_order(&names, RankKey::Retail, usa_eur_en()), Ordering::Greater);

    let mut builder = usa_eur_en();
    builder.prefer_prereleases = true;
    assert_eq!(key_order(&names, RankKey::Retail, builder), Ordering::Less);
}

#[test]
fn avoided_titles_rank_last() {
    let mut builder = usa_eur_en();
    builder.avoid = Some("Virtual Console".into());
    let cat = catalog(&["Foo (USA) (Virtual Console)", "Foo (Europe)"]);
    let policy = policy(builder);
    let ranking = rank_game(&cat.games()[0], &policy);
    assert_eq!(ranking.best().unwrap().title, "Foo (Europe)");
}

#[test]
fn region_order_follows_selection() {
    let names = ["Foo (Europe)", "Foo (USA)"];
    assert_eq!(key_order(&names, RankKey::Region, usa_eur_en()), Ordering::Greater);
    let builder = PolicyBuilder::new(["EUR", "USA"]);
    assert_eq!(key_order(&names, RankKey::Region, builder), Ordering::Less);
}

#[test]
fn language_score_is_weighted_by_position() {
    let cat = catalog(&["Foo (Europe) (En,Fr)", "Foo (Europe) (Fr,De)", "Foo (Europe) (De)"]);
    let policy = policy(PolicyBuilder::new(["EUR"]).languages(["en", "fr", "de"]));
    let scores: Vec<u64> = cat.games()[0]
        .variants
        .iter()
        .map(|v| Candidate::new(v, &policy).language_score)
        .collect();
    // weight 3: en = 9, fr = 3, de = 1
    assert_eq!(scores, vec![12, 4, 1]);
}

#[test]
fn prioritize_languages_swaps_region_and_language() {
    let names = ["Foo (USA) (Ja)", "Foo (Europe) (En)"];
    let cat = catalog(&names);

    let region_first = policy(usa_eur_en());
    assert_eq!(
        rank_game(&cat.games()[0], &region_first).best().unwrap().title,
        "Foo (USA) (Ja)"
    );

    let mut builder = usa_eur_en();
    builder.prioritize_languages = true;
    let language_first = policy(builder);
    assert_eq!(
        rank_game(&cat.games()[0], &language_first).best().unwrap().title,
        "Foo (Europe) (En)"
    );
}

#[test]
fn prefer_parents_and_input_order_keys_are_optional() {
    let keys = rank_keys(&policy(usa_eur_en()));
    assert!(!keys.contains(&RankKey::PreferParent));
    assert!(!keys.contains(&RankKey::InputOrder));
    assert_eq!(keys.last(), Some(&RankKey::Parent));

    let mut builder = usa_eur_en();
    builder.prefer_parents = true;
    let keys = rank_keys(&policy(builder));
    let parent_pos = keys.iter().position(|k| *k == RankKey::PreferParent).unwrap();
    let revision_pos = keys.iter().position(|k| *k == RankKey::Revision).unwrap();
    assert!(parent_pos < revision_pos);
}

#[test]
fn prefer_parents_beats_revision() {
    let cat = catalog(&["Foo (USA)", "Foo (USA) (Rev 1)"]);
    let default_policy = policy(usa_eur_en());
    assert_eq!(
        rank_game(&cat.games()[0], &default_policy).best().unwrap().title,
        "Foo (USA) (Rev 1)"
    );

    let mut builder = usa_eur_en();
    builder.prefer_parents = true;
    assert_eq!(
        rank_game(&cat.games()[0], &policy(builder)).best().unwrap().title,
        "Foo (USA)"
    );
}

#[test]
fn input_order_beats_revision() {
    let cat = catalog(&["Foo (USA) (Rev 1)", "Foo (USA) (Rev 2)"]);
    let mut builder = usa_eur_en();
    builder.input_order = true;
    assert_eq!(
        rank_game(&cat.games()[0], &policy(builder)).best().unwrap().title,
        "Foo (USA) (Rev 1)"
    );
}

#[test]
fn preferred_titles_rank_first() {
    let mut builder = usa_eur_en();
    builder.prefer = Some("Collector".into());
    assert_eq!(
        key_order(
            &["Foo (USA)", "Foo (USA) (Collector's Edition)"],
            RankKey::Preferred,
            builder
        ),
        Ordering::Greater
    );
}

#[test]
fn revisions_newest_first_unless_early() {
    let names = ["Foo (USA)", "Foo (USA) (Rev A)"];
    assert_eq!(key_order(&names, RankKey::Revision, usa_eur_en()), Ordering::Greater);

    let mut builder = usa_eur_en();
    builder.early_revisions = true;
    assert_eq!(key_order(&names, RankKey::Revision, builder), Ordering::Less);

    // Numbers sort before letters.
    assert_eq!(
        key_order(&["Foo (USA) (Rev 2)", "Foo (USA) (Rev A)"], RankKey::Revision, usa_eur_en()),
        Ordering::Greater
    );
}

#[test]
fn versions_newest_first_unless_early() {
    let names = ["Foo (USA) (v1.1)", "Foo (USA) (v1.10)"];
    assert_eq!(key_order(&names, RankKey::Version, usa_eur_en()), Ordering::Greater);

    let mut builder = usa_eur_en();
    builder.early_versions = true;
    assert_eq!(key_order(&names, RankKey::Version, builder), Ordering::Less);
}

#[test]
fn newer_prerelease_tags_rank_first() {
    let names = ["Foo (USA) (Beta 1)", "Foo (USA) (Beta 2)"];
    assert_eq!(
        key_order(&names, RankKey::PrereleaseRecency, usa_eur_en()),
        Ordering::Greater
    );

    // An untagged beta counts as the most recent one.
    let names = ["Foo (USA) (Beta)", "Foo (USA) (Beta 2)"];
    assert_eq!(
        key_order(&names, RankKey::PrereleaseRecency, usa_eur_en()),
        Ordering::Less
    );

    // Different kinds: the proto has no sample tag, the sample does.
    let names = ["Foo (USA) (Proto 1)", "Foo (USA) (Sample 3)"];
    assert_eq!(
        key_order(&names, RankKey::PrereleaseRecency, usa_eur_en()),
        Ordering::Less
    );
}

#[test]
fn more_languages_rank_first() {
    assert_eq!(
        key_order(
            &["Foo (Europe) (En)", "Foo (Europe) (En,Fr,De)"],
            RankKey::LanguageCount,
            usa_eur_en()
        ),
        Ordering::Greater
    );
}

#[test]
fn parent_breaks_remaining_ties() {
    let cat = Catalog::from_records(
        "test",
        vec![
            VariantRecord::new("Foo (USA) (Alt)").clone_of("Foo (USA)"),
            VariantRecord::new("Foo (USA)"),
        ],
    )
    .unwrap();
    let ranking = rank_game(&cat.games()[0], &policy(usa_eur_en()));
    assert_eq!(ranking.best().unwrap().title, "Foo (USA)");
}

#[test]
fn full_ties_fall_back_to_catalog_order() {
    let cat = Catalog::from_records(
        "test",
        vec![
            VariantRecord::new("Bar (USA)"),
            VariantRecord::new("Foo (USA) (Alt 2)").clone_of("Bar (USA)"),
            VariantRecord::new("Foo (USA) (Alt 1)").clone_of("Bar (USA)"),
        ],
    )
    .unwrap();
    let mut builder = usa_eur_en();
    builder.exclude = Some("Bar".into());
    let ranking = rank_game(&cat.games()[0], &policy(builder));
    assert_eq!(titles(&ranking), vec!["Foo (USA) (Alt 2)", "Foo (USA) (Alt 1)"]);
}

#[test]
fn region_filter_modes() {
    let cat = catalog(&["Foo (USA)", "Foo (Japan)", "Foo (Germany) (En,De)"]);
    let game = &cat.games()[0];

    let strict = policy(usa_eur_en());
    assert_eq!(rank_game(game, &strict).candidates.len(), 1);

    let mut builder = usa_eur_en();
    builder.all_regions_with_lang = true;
    assert_eq!(rank_game(game, &policy(builder)).candidates.len(), 2);

    let mut builder = usa_eur_en();
    builder.all_regions = true;
    assert_eq!(rank_game(game, &policy(builder)).candidates.len(), 3);

    let mut builder = usa_eur_en();
    builder.all_regions = true;
    builder.only_selected_lang = true;
    let ranking = rank_game(game, &policy(builder));
    assert_eq!(titles(&ranking), vec!["Foo (USA)", "Foo (Germany) (En,De)"]);
}

#[test]
fn category_filters() {
    let cat = catalog(&["Foo (USA)", "Foo (USA) (Unl)", "Foo (USA) (Program)"]);
    let game = &cat.games()[0];

    let mut builder = usa_eur_en();
    builder.no_all = true;
    let ranking = rank_game(game, &policy(builder));
    assert_eq!(titles(&ranking), vec!["Foo (USA)", "Foo (USA) (Unl)"]);

    let mut builder = usa_eur_en();
    builder.filters.no_unlicensed = true;
    let ranking = rank_game(game, &policy(builder));
    assert_eq!(ranking.filtered, 1);
}

#[test]
fn require_present_skips_missing_variants() {
    let mut cat = catalog(&["Foo (USA) (Rev 1)", "Foo (USA)"]);
    let policy = policy(usa_eur_en());
    assert!(select_winners(&cat.games()[0], &policy, true).is_empty());

    cat.set_checksum(VariantRef { game: 0, variant: 1 }, FileIdentity::Unverified);
    let winners = select_winners(&cat.games()[0], &policy, true);
    assert_eq!(winners[0].title, "Foo (USA)");
    assert_eq!(
        select_winners(&cat.games()[0], &policy, false)[0].title,
        "Foo (USA) (Rev 1)"
    );
}

#[test]
fn overrides_feed_ranking() {
    let mut record = VariantRecord::new("Foo");
    record.overrides = Overrides {
        regions: Some(vec!["EUR".into()]),
        ..Default::default()
    };
    let cat = Catalog::from_records("test", vec![record]).unwrap();
    let ranking = rank_game(&cat.games()[0], &policy(usa_eur_en()));
    assert_eq!(ranking.candidates[0].region_rank, Some(1));
}

#[test]
fn select_all_reports_each_game() {
    let cat = Catalog::from_records(
        "test",
        vec![
            VariantRecord::new("Foo (USA)"),
            VariantRecord::new("Bar (Japan)"),
            VariantRecord::new("Baz (USA) (Proto)"),
            VariantRecord::new("Qux (Europe)"),
        ],
    )
    .unwrap();
    let mut builder = usa_eur_en();
    builder.exclude_after = Some("Proto".into());
    let selection = select_all(&cat, &policy(builder), false);

    assert_eq!(selection.games, 4);
    assert_eq!(
        selection.winners,
        vec![
            VariantRef { game: 0, variant: 0 },
            VariantRef { game: 3, variant: 0 },
        ]
    );
    assert_eq!(selection.no_candidate, vec!["Bar (Japan)"]);
    assert_eq!(selection.excluded_after, vec!["Baz (USA) (Proto)"]);
}
