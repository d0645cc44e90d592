use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::LevelFilter;
use narrator_engine::{EngineSettings, MonthFailurePolicy};
use serde::Deserialize;

use crate::cli::{Cli, Command};

/// Read when `--config` is not given; absence is not an error.
pub const DEFAULT_CONFIG_FILE: &str = "narrator.ron";

/// Contents of the RON configuration file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarratorConfig {
    pub backend_url: Option<String>,
    pub user_id: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub archive_months: Option<usize>,
    pub skip_failed_months: Option<bool>,
    pub narration_interval_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub generation_timeout_secs: Option<u64>,
    pub max_download_mb: Option<u64>,
    pub log_level: Option<String>,
}

/// Effective settings after layering flags and environment over the file.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub settings: EngineSettings,
    pub user_id: Option<String>,
    pub log_level: LevelFilter,
}

impl NarratorConfig {
    /// Loads `explicit`, or [`DEFAULT_CONFIG_FILE`] if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::read(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::read(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn resolve(&self, cli: &Cli) -> Resolved {
        let defaults = EngineSettings::default();
        let secs = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_secs).unwrap_or(fallback)
        };

        let mut settings = EngineSettings {
            base_url: cli
                .backend_url
                .clone()
                .or_else(|| self.backend_url.clone())
                .unwrap_or(defaults.base_url),
            connect_timeout: secs(self.connect_timeout_secs, defaults.connect_timeout),
            request_timeout: secs(self.request_timeout_secs, defaults.request_timeout),
            generation_timeout: secs(self.generation_timeout_secs, defaults.generation_timeout),
            archive_window: self.archive_months.unwrap_or(defaults.archive_window),
            month_failure: match self.skip_failed_months {
                Some(true) => MonthFailurePolicy::SkipFailed,
                Some(false) => MonthFailurePolicy::Abort,
                None => defaults.month_failure,
            },
            narration_interval: secs(self.narration_interval_secs, defaults.narration_interval),
            output_dir: self.output_dir.clone().unwrap_or(defaults.output_dir),
            max_download_bytes: self
                .max_download_mb
                .map(|mb| mb.saturating_mul(1024 * 1024))
                .unwrap_or(defaults.max_download_bytes),
        };

        if let Command::Games {
            months,
            skip_failed_months,
            ..
        } = &cli.command
        {
            if let Some(months) = months {
                settings.archive_window = *months;
            }
            if *skip_failed_months {
                settings.month_failure = MonthFailurePolicy::SkipFailed;
            }
        }

        let level = cli
            .log_level
            .as_deref()
            .or(self.log_level.as_deref())
            .unwrap_or("info");

        Resolved {
            settings,
            user_id: cli.user_id.clone().or_else(|| self.user_id.clone()),
            log_level: narrator_logging::level_from_name(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["narrator"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).expect("parse")
    }

    #[test]
    fn parses_partial_file() {
        let config = NarratorConfig::parse(
            r#"(
                backend_url: Some("https://narrator.example.com/api/v1"),
                archive_months: Some(6),
                skip_failed_months: Some(true),
            )"#,
        )
        .unwrap();
        assert_eq!(
            config,
            NarratorConfig {
                backend_url: Some("https://narrator.example.com/api/v1".to_string()),
                archive_months: Some(6),
                skip_failed_months: Some(true),
                ..NarratorConfig::default()
            }
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(NarratorConfig::parse("(backend: Some(\"x\"))").is_err());
    }

    #[test]
    fn empty_config_resolves_to_engine_defaults() {
        let resolved = NarratorConfig::default().resolve(&cli(&["recordings"]));
        let defaults = EngineSettings::default();
        assert_eq!(resolved.settings.base_url, defaults.base_url);
        assert_eq!(resolved.settings.archive_window, 3);
        assert_eq!(resolved.settings.month_failure, MonthFailurePolicy::Abort);
        assert_eq!(resolved.settings.output_dir, PathBuf::from("output"));
        assert_eq!(resolved.log_level, LevelFilter::Info);
    }

    #[test]
    fn flags_take_precedence_over_file() {
        let config = NarratorConfig {
            backend_url: Some("http://file.example.com".to_string()),
            user_id: Some("file-user".to_string()),
            archive_months: Some(2),
            log_level: Some("warn".to_string()),
            max_download_mb: Some(1),
            ..NarratorConfig::default()
        };

        let resolved = config.resolve(&cli(&[
            "--backend-url",
            "http://flag.example.com",
            "--user-id",
            "flag-user",
            "-l",
            "debug",
            "games",
            "hikaru",
            "--months",
            "5",
            "--skip-failed-months",
        ]));

        assert_eq!(resolved.settings.base_url, "http://flag.example.com");
        assert_eq!(resolved.user_id.as_deref(), Some("flag-user"));
        assert_eq!(resolved.settings.archive_window, 5);
        assert_eq!(resolved.settings.month_failure, MonthFailurePolicy::SkipFailed);
        assert_eq!(resolved.settings.max_download_bytes, 1024 * 1024);
        assert_eq!(resolved.log_level, LevelFilter::Debug);
    }

    #[test]
    fn file_values_apply_when_flags_are_absent() {
        let config = NarratorConfig {
            user_id: Some("file-user".to_string()),
            archive_months: Some(2),
            narration_interval_secs: Some(1),
            ..NarratorConfig::default()
        };
        let resolved = config.resolve(&cli(&["games", "hikaru"]));
        assert_eq!(resolved.user_id.as_deref(), Some("file-user"));
        assert_eq!(resolved.settings.archive_window, 2);
        assert_eq!(resolved.settings.narration_interval, Duration::from_secs(1));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.ron");
        assert!(NarratorConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn loads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrator.ron");
        fs::write(&path, "(user_id: Some(\"disk-user\"))").unwrap();
        let config = NarratorConfig::load(Some(&path)).unwrap();
        assert_eq!(config.user_id.as_deref(), Some("disk-user"));
    }
}
