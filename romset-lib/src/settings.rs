//! Persistent user defaults stored in `~/.config/romset/settings.toml`.
//!
//! Every field is optional; command-line flags override whatever is set
//! here.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::policy::PolicyBuilder;

/// Canonical path to the settings file: `~/.config/romset/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("romset").join("settings.toml")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub regions: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub language_weight: Option<u32>,
    pub threads: Option<usize>,
    pub chunk_size: Option<usize>,
    pub max_file_size: Option<u64>,
    /// Header rule file used when the catalog names none.
    pub header_file: Option<PathBuf>,
}

impl Settings {
    pub fn parse(contents: &str) -> io::Result<Self> {
        toml::from_str(contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// A builder seeded with these defaults.
    pub fn builder(&self) -> PolicyBuilder {
        let mut builder = PolicyBuilder::default();
        if let Some(regions) = &self.regions {
            builder.selected_regions = regions.clone();
        }
        if let Some(languages) = &self.languages {
            builder.selected_languages = languages.clone();
        }
        if let Some(weight) = self.language_weight {
            builder.language_weight = weight;
        }
        if let Some(threads) = self.threads {
            builder.threads = threads;
        }
        if let Some(chunk_size) = self.chunk_size {
            builder.chunk_size = chunk_size;
        }
        if let Some(max_file_size) = self.max_file_size {
            builder.max_file_size = max_file_size;
        }
        builder
    }
}

/// Load settings from `path`. A missing file yields the defaults.
pub fn load_settings_from(path: &Path) -> io::Result<Settings> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Settings::parse(&contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(e) => Err(e),
    }
}

pub fn load_settings() -> io::Result<Settings> {
    load_settings_from(&settings_path())
}

/// Write settings to `path`, replacing the file atomically.
pub fn save_settings_to(path: &Path, settings: &Settings) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(settings).map_err(io::Error::other)?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, &serialized)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> io::Result<()> {
    save_settings_to(&settings_path(), settings)
}

/// Load the full settings file as a pretty-printed TOML string for display.
pub fn load_settings_string() -> Option<String> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    toml::to_string_pretty(&doc).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_parses() {
        let settings = Settings::parse(
            r#"
regions = ["USA", "EUR"]
threads = 8
"#,
        )
        .unwrap();
        assert_eq!(settings.regions, Some(vec!["USA".into(), "EUR".into()]));
        assert_eq!(settings.threads, Some(8));
        assert_eq!(settings.languages, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::parse("colour = true").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn builder_takes_set_fields_only() {
        let settings = Settings {
            regions: Some(vec!["JPN".into()]),
            language_weight: Some(5),
            ..Default::default()
        };
        let builder = settings.builder();
        assert_eq!(builder.selected_regions, vec!["JPN".to_string()]);
        assert_eq!(builder.language_weight, 5);
        assert_eq!(builder.threads, crate::policy::DEFAULT_THREADS);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.toml");
        let settings = Settings {
            languages: Some(vec!["en".into()]),
            header_file: Some(PathBuf::from("/headers/nes.xml")),
            ..Default::default()
        };
        save_settings_to(&path, &settings).unwrap();
        assert!(!path.with_extension("toml.tmp").exists());
        assert_eq!(load_settings_from(&path).unwrap(), settings);
    }
}
