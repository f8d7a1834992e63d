use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romset_catalog::Catalog;
use romset_lib::{
    FileOutcome, OutputSummary, PolicyBuilder, ScanResult, Selection, execute_plan, plan_output,
    select_all,
};

use crate::CliError;
use crate::cli_types::SelectArgs;
use crate::report;

fn builder_from_args(args: &SelectArgs, base: PolicyBuilder) -> PolicyBuilder {
    let mut b = base;
    if let Some(regions) = &args.regions {
        b.selected_regions = regions.clone();
    }
    if let Some(languages) = &args.languages {
        b.selected_languages = languages.clone();
    }
    if let Some(weight) = args.language_weight {
        b.language_weight = weight;
    }

    let f = &args.filters;
    b.no_all = f.no_all;
    b.filters.no_bios = f.no_bios;
    b.filters.no_program = f.no_program;
    b.filters.no_enhancement_chip = f.no_enhancement_chip;
    b.filters.no_proto = f.no_proto;
    b.filters.no_beta = f.no_beta;
    b.filters.no_demo = f.no_demo;
    b.filters.no_sample = f.no_sample;
    b.filters.no_pirate = f.no_pirate;
    b.filters.no_promo = f.no_promo;
    b.filters.no_unlicensed = f.no_unlicensed;

    b.all_regions = args.all_regions;
    b.all_regions_with_lang = args.all_regions_with_lang;
    b.only_selected_lang = args.only_selected_lang;
    b.prioritize_languages = args.prioritize_languages;
    b.early_revisions = args.early_revisions;
    b.early_versions = args.early_versions;
    b.input_order = args.input_order;
    b.prefer_parents = args.prefer_parents;
    b.prefer_prereleases = args.prefer_prereleases;

    let lists = &args.lists;
    b.prefer = lists.prefer.clone();
    b.avoid = lists.avoid.clone();
    b.exclude = lists.exclude.clone();
    b.exclude_after = lists.exclude_after.clone();
    b.ignore_case = lists.ignore_case;
    b.regex = lists.regex;
    b.separator = lists.separator.clone();

    super::apply_scan_args(&mut b, &args.scan);

    b.input_dir = args.input.clone();
    b.output_dir = args.output.clone();
    b.mode = args.mode.into();
    b.group_by_first_letter = args.group_by_first_letter;
    if args.allow_missing {
        b.require_present = Some(false);
    }
    b.strict = args.strict;
    b
}

pub(crate) fn run_select(args: SelectArgs, quiet: bool) -> Result<(), CliError> {
    let settings = super::load_settings()?;
    let mut builder = builder_from_args(&args, settings.builder());

    let (dat, mut catalog) = super::load_catalog(&args.dat)?;
    builder.header_rules = Some(super::header_rules(
        &args.dat,
        &dat,
        args.scan.header_file.as_deref(),
        &settings,
    )?);
    let config = builder.build()?;

    let scan = match &config.input_dir {
        Some(input) => {
            let result = super::run_scan_with_progress(input, &catalog, &config.scan, quiet)?;
            let present = result.apply_to(&mut catalog);
            log::debug!("{present} variants have a file on disk");
            Some(result)
        }
        None => None,
    };

    let selection = select_all(&catalog, &config.ranking, config.require_present);
    log::info!("");

    let output = match &config.output {
        Some(options) => {
            let empty = ScanResult::default();
            let scan_ref = scan.as_ref().unwrap_or(&empty);
            let plan = plan_output(&catalog, &selection, scan_ref, options)?;
            for conflict in &plan.conflicts {
                log::warn!(
                    "  {} {} files map to {}",
                    "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                    conflict.sources.len(),
                    conflict.destination.display(),
                );
            }
            log::info!(
                "Writing {} files to {} ({})",
                plan.actions.len(),
                options.output_dir.display().if_supports_color(Stdout, |t| t.cyan()),
                options.mode,
            );
            let summary = execute_plan(&plan, options.mode);
            print_failures(&summary);
            Some(summary)
        }
        None => {
            print_preview(&catalog, &selection, scan.as_ref());
            None
        }
    };

    print_summary(&selection, output.as_ref());

    if let Some(path) = &args.report {
        report::write_select_report(path, &catalog, &selection, scan.as_ref(), output.as_ref())?;
        log::info!("Report written to {}", report::describe(path).display());
    }
    Ok(())
}

fn print_preview(catalog: &Catalog, selection: &Selection, scan: Option<&ScanResult>) {
    let located = scan.map(ScanResult::by_variant).unwrap_or_default();
    for &vref in &selection.winners {
        let (Some(game), Some(variant)) = (catalog.games().get(vref.game), catalog.variant(vref))
        else {
            continue;
        };
        if game.name == variant.title {
            log::info!("{}", variant.title.if_supports_color(Stdout, |t| t.bold()));
        } else {
            log::info!(
                "{} {} {}",
                game.name.if_supports_color(Stdout, |t| t.dimmed()),
                "\u{2192}".if_supports_color(Stdout, |t| t.dimmed()),
                variant.title.if_supports_color(Stdout, |t| t.bold()),
            );
        }
        for location in located.get(&vref).into_iter().flatten() {
            let member = location
                .matched
                .member
                .and_then(|i| location.file.members.get(i))
                .map(|m| format!(":{}", m.name))
                .unwrap_or_default();
            log::info!(
                "    {}{} ({})",
                location.path.display(),
                member,
                location.matched.method.if_supports_color(Stdout, |t| t.dimmed())
            );
        }
    }
    log::info!("");
}

fn print_failures(summary: &OutputSummary) {
    for file in &summary.files {
        if let FileOutcome::Failed(reason) = &file.outcome {
            log::warn!(
                "  {} {}: {}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                file.source.display(),
                reason
            );
        }
    }
}

fn print_summary(selection: &Selection, output: Option<&OutputSummary>) {
    log::info!("{}", "Summary:".if_supports_color(Stdout, |t| t.bold()));
    log::info!("  {} games", selection.games);
    log::info!(
        "  {} {} selected",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        selection.winners.len(),
    );
    if !selection.no_candidate.is_empty() {
        log::info!(
            "  {} {} without a candidate",
            "-".if_supports_color(Stdout, |t| t.dimmed()),
            selection.no_candidate.len(),
        );
    }
    if !selection.excluded_after.is_empty() {
        log::info!(
            "  {} {} excluded after ranking",
            "-".if_supports_color(Stdout, |t| t.dimmed()),
            selection.excluded_after.len(),
        );
    }
    if let Some(summary) = output {
        log::info!(
            "  {} {} files written, {} skipped, {} failed, {} conflicts",
            "\u{2192}".if_supports_color(Stdout, |t| t.cyan()),
            summary.written(),
            summary.skipped(),
            summary.failed(),
            summary.conflicts,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli_types::{Cli, Commands};

    fn parse(args: &[&str]) -> SelectArgs {
        let cli = Cli::try_parse_from(std::iter::once("romset").chain(args.iter().copied())).unwrap();
        match cli.command {
            Commands::Select(args) => *args,
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn flags_override_settings() {
        let base = romset_lib::Settings {
            regions: Some(vec!["JPN".into()]),
            threads: Some(2),
            ..Default::default()
        }
        .builder();
        let args = parse(&["select", "x.dat", "-r", "USA,EUR", "--no-proto", "--threads", "8"]);
        let b = builder_from_args(&args, base);
        assert_eq!(b.selected_regions, vec!["USA".to_string(), "EUR".to_string()]);
        assert!(b.filters.no_proto);
        assert_eq!(b.threads, 8);
        assert!(b.recursive);
    }

    #[test]
    fn settings_fill_unset_flags() {
        let base = romset_lib::Settings {
            regions: Some(vec!["JPN".into()]),
            languages: Some(vec!["ja".into()]),
            ..Default::default()
        }
        .builder();
        let args = parse(&["select", "x.dat", "--allow-missing", "--mode", "symlink"]);
        let b = builder_from_args(&args, base);
        assert_eq!(b.selected_regions, vec!["JPN".to_string()]);
        assert_eq!(b.selected_languages, vec!["ja".to_string()]);
        assert_eq!(b.require_present, Some(false));
        assert_eq!(b.mode, romset_lib::OutputMode::Symlink);
    }
}
