//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to `Pretty`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Append to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::from_settings_with(settings, verbose, |key| std::env::var(key).ok())
    }

    /// Builds logging configuration, reading overrides through `lookup`.
    ///
    /// The filter comes from `CLIMARISK_LOG`, then `RUST_LOG`, then the config
    /// file, then `debug` when verbose or `info` otherwise.
    #[must_use]
    pub fn from_settings_with(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let directive = Self::directive(settings, verbose, &lookup);
        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

        let format = lookup("CLIMARISK_LOG_FORMAT")
            .or_else(|| settings.and_then(|config| config.format.clone()))
            .map(|value| LogFormat::parse(&value))
            .unwrap_or_default();

        let file = lookup("CLIMARISK_LOG_FILE")
            .or_else(|| settings.and_then(|config| config.file.clone()))
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Self {
            format,
            filter,
            file,
        }
    }

    fn directive(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> String {
        lookup("CLIMARISK_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .or_else(|| settings.and_then(|config| config.filter.clone()))
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| if verbose { "debug" } else { "info" }.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::from_settings_with(None, false, none);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file.is_none());
        assert_eq!(LoggingConfig::directive(None, false, none), "info");
        assert_eq!(LoggingConfig::directive(None, true, none), "debug");
    }

    #[test]
    fn test_env_overrides_settings() {
        let settings = LoggingSettings {
            format: Some("pretty".to_string()),
            filter: Some("warn".to_string()),
            file: Some("/tmp/climarisk.log".to_string()),
        };
        let lookup = |key: &str| match key {
            "CLIMARISK_LOG_FORMAT" => Some("json".to_string()),
            "RUST_LOG" => Some("climarisk=trace".to_string()),
            _ => None,
        };

        let config = LoggingConfig::from_settings_with(Some(&settings), false, lookup);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/climarisk.log")));
        assert_eq!(
            LoggingConfig::directive(Some(&settings), false, lookup),
            "climarisk=trace"
        );
    }

    #[test]
    fn test_settings_filter_used_without_env() {
        let settings = LoggingSettings {
            filter: Some("warn".to_string()),
            ..LoggingSettings::default()
        };
        assert_eq!(LoggingConfig::directive(Some(&settings), true, none), "warn");
    }
}
