use super::*;
use romset_dat::{DatRelease, parse_dat};

fn rom(name: &str, crc: &str) -> RomEntry {
    RomEntry {
        name: name.into(),
        size: 1024,
        crc32: Some(crc.into()),
        sha1: None,
        status: RomStatus::Good,
    }
}

fn record(name: &str) -> VariantRecord {
    VariantRecord::new(name).with_rom(rom(&format!("{name}.bin"), "00000000"))
}

#[test]
fn groups_clones_under_root_parent() {
    let catalog = Catalog::from_records(
        "test",
        vec![
            record("Foo (USA)"),
            record("Bar (Japan)"),
            record("Foo (Europe)").clone_of("Foo (USA)"),
            record("Foo (Japan)").clone_of("Foo (Europe)"),
        ],
    )
    .unwrap();

    let games = catalog.games();
    assert_eq!(games.len(), 2);
    assert_eq!(games[0].name, "Foo (USA)");
    assert_eq!(games[0].variants.len(), 3);
    assert_eq!(games[0].parent().unwrap().title, "Foo (USA)");
    assert_eq!(games[0].clones().count(), 2);
    assert_eq!(games[1].name, "Bar (Japan)");

    let indexes: Vec<usize> = games[0].variants.iter().map(|v| v.input_index).collect();
    assert_eq!(indexes, vec![0, 2, 3]);
}

#[test]
fn games_ordered_by_first_member() {
    let catalog = Catalog::from_records(
        "test",
        vec![
            record("Foo (Europe)").clone_of("Foo (USA)"),
            record("Bar (USA)"),
            record("Foo (USA)"),
        ],
    )
    .unwrap();
    assert_eq!(catalog.games()[0].name, "Foo (USA)");
    assert!(!catalog.games()[0].variants[0].is_parent);
    assert!(catalog.games()[0].variants[1].is_parent);
    assert_eq!(catalog.games()[1].name, "Bar (USA)");
}

#[test]
fn dangling_parent_is_rejected() {
    let err = Catalog::from_records("test", vec![record("Foo (Europe)").clone_of("Foo (USA)")])
        .unwrap_err();
    assert_eq!(err, CatalogError::dangling_parent("Foo (Europe)", "Foo (USA)"));
}

#[test]
fn clone_cycle_is_rejected() {
    let err = Catalog::from_records(
        "test",
        vec![record("A").clone_of("B"), record("B").clone_of("A")],
    )
    .unwrap_err();
    assert!(matches!(err, CatalogError::Cycle { .. }));

    let err = Catalog::from_records("test", vec![record("A").clone_of("A")]).unwrap_err();
    assert_eq!(err, CatalogError::cycle("A"));
}

#[test]
fn duplicate_names_are_rejected() {
    let err = Catalog::from_records("test", vec![record("A"), record("A")]).unwrap_err();
    assert_eq!(err, CatalogError::DuplicateName("A".into()));
}

#[test]
fn overrides_take_precedence_over_name() {
    let mut rec = record("Foo (Japan) (Beta 2)");
    rec.overrides = Overrides {
        regions: Some(vec!["USA".into()]),
        languages: None,
        status: Some(ReleaseStatus::Retail),
        category: Some(Category::Promo),
        bad_dump: Some(true),
    };
    let catalog = Catalog::from_records("test", vec![rec]).unwrap();
    let v = &catalog.games()[0].variants[0];
    assert_eq!(v.regions, vec!["USA"]);
    // Languages re-inferred from the overridden regions.
    assert_eq!(v.languages, vec!["en"]);
    assert_eq!(v.status, ReleaseStatus::Retail);
    assert!(v.prerelease_tag.is_none());
    assert_eq!(v.category, Category::Promo);
    assert!(v.bad_dump);
}

#[test]
fn bad_rom_marks_variant_bad() {
    let mut rec = record("Foo (USA)");
    rec.roms[0].status = RomStatus::BadDump;
    let catalog = Catalog::from_records("test", vec![rec]).unwrap();
    assert!(catalog.games()[0].variants[0].bad_dump);
}

#[test]
fn checksum_is_set_once() {
    let mut catalog = Catalog::from_records("test", vec![record("Foo (USA)")]).unwrap();
    let vref = VariantRef { game: 0, variant: 0 };
    assert!(!catalog.variant(vref).unwrap().is_present());

    assert!(catalog.set_checksum(vref, FileIdentity::Unverified));
    assert!(!catalog.set_checksum(vref, FileIdentity::Unverified));
    assert!(catalog.variant(vref).unwrap().is_present());
    assert!(!catalog.set_checksum(VariantRef { game: 3, variant: 0 }, FileIdentity::Unverified));
}

#[test]
fn indexes_cover_every_rom() {
    let multi = VariantRecord::new("Baz (USA)")
        .with_rom(rom("Baz (USA) (Track 1).bin", "11111111"))
        .with_rom(rom("Baz (USA) (Track 2).bin", "22222222"));
    let catalog = Catalog::from_records("test", vec![record("Foo (USA)"), multi]).unwrap();

    let names = catalog.file_name_index();
    assert_eq!(names["Foo (USA)"], vec![RomRef { game: 0, variant: 0, rom: 0 }]);
    assert_eq!(names["Baz (USA)"], vec![RomRef { game: 1, variant: 0, rom: 0 }]);
    assert_eq!(names["Baz (USA) (Track 2)"], vec![RomRef { game: 1, variant: 0, rom: 1 }]);
    assert!(!names.contains_key("foo (usa)"));

    let index = catalog.checksum_index();
    assert!(!index.is_empty());
    let hashes = FileHashes {
        crc32: "22222222".into(),
        sha1: "none".into(),
        data_size: 1024,
        header_skipped: 0,
    };
    let hit = index.match_hashes(&hashes).unwrap();
    assert_eq!(hit.keys, &[RomRef { game: 1, variant: 0, rom: 1 }]);
    assert_eq!(catalog.rom(hit.keys[0]).unwrap().name, "Baz (USA) (Track 2).bin");
}

#[test]
fn shared_dumps_index_every_variant() {
    let catalog = Catalog::from_records(
        "test",
        vec![
            VariantRecord::new("Baz (USA)").with_rom(rom("Baz.bin", "abcdef01")),
            VariantRecord::new("Baz (Europe)")
                .clone_of("Baz (USA)")
                .with_rom(rom("Baz.bin", "abcdef01")),
        ],
    )
    .unwrap();

    let hashes = FileHashes {
        crc32: "abcdef01".into(),
        sha1: "none".into(),
        data_size: 1024,
        header_skipped: 0,
    };
    let index = catalog.checksum_index();
    let hit = index.match_hashes(&hashes).unwrap();
    assert_eq!(
        hit.keys,
        &[
            RomRef { game: 0, variant: 0, rom: 0 },
            RomRef { game: 0, variant: 1, rom: 0 },
        ]
    );
    assert_eq!(catalog.file_name_index()["Baz"].len(), 2);
}

#[test]
fn declares_archives_looks_at_rom_extensions() {
    let plain = Catalog::from_records("test", vec![record("Foo (USA)")]).unwrap();
    assert!(!plain.declares_archives());

    let zipped = Catalog::from_records(
        "test",
        vec![VariantRecord::new("Foo (USA)").with_rom(rom("Foo (USA).ZIP", "00000000"))],
    )
    .unwrap();
    assert!(zipped.declares_archives());
}

#[test]
fn from_dat_uses_release_metadata() {
    let dat = DatFile {
        name: "Test".into(),
        games: vec![
            DatGame {
                name: "Foo".into(),
                releases: vec![DatRelease {
                    name: "Foo".into(),
                    region: "EUR".into(),
                    language: Some("En,Fr".into()),
                }],
                roms: vec![DatRom {
                    name: "Foo.bin".into(),
                    size: 4,
                    crc: Some("DEADBEEF".into()),
                    ..Default::default()
                }],
                ..Default::default()
            },
            DatGame {
                name: "Foo BIOS".into(),
                is_bios: true,
                region: Some("Moonbase".into()),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let catalog = Catalog::from_dat(&dat).unwrap();
    assert_eq!(catalog.name(), "Test");
    let foo = &catalog.games()[0].variants[0];
    assert_eq!(foo.regions, vec!["EUR"]);
    assert_eq!(foo.languages, vec!["en", "fr"]);
    assert_eq!(foo.roms[0].crc32.as_deref(), Some("deadbeef"));

    let bios = &catalog.games()[1].variants[0];
    assert_eq!(bios.category, Category::Bios);
    assert_eq!(bios.regions, vec!["MOONBASE"]);
    assert!(bios.languages.is_empty());
}

#[test]
fn from_parsed_xml_dat() {
    let xml = r#"<?xml version="1.0"?>
<datafile>
  <header><name>Sample</name></header>
  <game name="Foo (USA)">
    <rom name="Foo (USA).nes" size="16" crc="aaaaaaaa"/>
  </game>
  <game name="Foo (Europe) [b]" cloneof="Foo (USA)">
    <rom name="Foo (Europe) [b].nes" size="16" crc="bbbbbbbb"/>
  </game>
</datafile>"#;
    let dat = parse_dat(xml.as_bytes()).unwrap();
    let catalog = Catalog::from_dat(&dat).unwrap();
    assert_eq!(catalog.games().len(), 1);
    assert_eq!(catalog.variant_count(), 2);
    let (vref, game, clone) = catalog.variants().nth(1).unwrap();
    assert_eq!(vref, VariantRef { game: 0, variant: 1 });
    assert_eq!(game.name, "Foo (USA)");
    assert!(clone.bad_dump);
    assert_eq!(clone.regions, vec!["EUR"]);
}
