use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romset_dat::{HeaderOperation, HeaderRules};

use crate::CliError;

/// List built-in header rules, plus those from `header_file` when given.
pub(crate) fn run_headers(header_file: Option<&Path>) -> Result<(), CliError> {
    let mut rules = HeaderRules::builtin();
    if let Some(path) = header_file {
        rules.extend(HeaderRules::load_detector(path)?);
    }

    log::info!("Header rules:");
    log::info!("");
    for rule in rules.iter() {
        let extensions = if rule.extensions.is_empty() {
            "any extension".to_string()
        } else {
            rule.extensions
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut detail = format!("skip {} bytes", rule.skip);
        if let Some(end) = rule.end {
            detail.push_str(&format!(", stop at {end:#x}"));
        }
        if rule.operation != HeaderOperation::None {
            detail.push_str(&format!(", {}", rule.operation.as_str()));
        }
        log::info!(
            "  {} [{}] {}",
            rule.name.if_supports_color(Stdout, |t| t.bold()),
            extensions.if_supports_color(Stdout, |t| t.cyan()),
            detail,
        );
    }
    Ok(())
}
