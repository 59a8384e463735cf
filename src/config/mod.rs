//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `CLIMARISK_*` environment variables. The binary loads `.env` with
//! `dotenvy` before reading the environment.

mod features;
mod timeouts;

pub use features::FeatureFlags;
pub use timeouts::{OperationTimeoutConfig, OperationType};

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default time-to-live for cached snapshots and predictions.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default number of evidence hits per query.
pub const DEFAULT_EVIDENCE_K: usize = 3;

const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Main configuration for climarisk.
#[derive(Debug, Clone)]
pub struct ClimariskConfig {
    /// Feature flags.
    pub features: FeatureFlags,
    /// Cache backend settings.
    pub cache: CacheConfig,
    /// Weather source settings.
    pub weather: WeatherConfig,
    /// Evidence store settings.
    pub evidence: EvidenceConfig,
    /// Text generation settings.
    pub llm: LlmConfig,
    /// Per-operation timeouts.
    pub timeouts: OperationTimeoutConfig,
    /// Logging, tracing and metrics settings from the config file.
    pub observability: ObservabilitySettings,
}

/// Cache backend settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL. The in-process cache is used when unset.
    pub redis_url: Option<String>,
    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Weather source settings.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// `OpenWeather` API key. Offline baselines are used when unset.
    pub api_key: Option<SecretString>,
    /// API root.
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
        }
    }
}

/// Where evidence documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvidenceBackend {
    /// JSON corpus file on local disk.
    #[default]
    Local,
    /// Pinecone serverless index.
    Pinecone,
}

impl EvidenceBackend {
    /// Parses a backend name, defaulting to `Local`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pinecone" => Self::Pinecone,
            _ => Self::Local,
        }
    }

    /// Returns the backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Pinecone => "pinecone",
        }
    }
}

/// Evidence store settings.
#[derive(Debug, Clone)]
pub struct EvidenceConfig {
    /// Storage backend.
    pub backend: EvidenceBackend,
    /// Corpus file for the local backend.
    pub corpus_path: PathBuf,
    /// Index host for the Pinecone backend, e.g. `https://idx-abc.svc.pinecone.io`.
    pub pinecone_host: Option<String>,
    /// Pinecone API key.
    pub pinecone_api_key: Option<SecretString>,
    /// Pinecone namespace.
    pub pinecone_namespace: Option<String>,
    /// Hits per query when the caller does not specify one.
    pub default_k: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            backend: EvidenceBackend::Local,
            corpus_path: default_data_dir().join("vectors.json"),
            pinecone_host: None,
            pinecone_api_key: None,
            pinecone_namespace: None,
            default_k: DEFAULT_EVIDENCE_K,
        }
    }
}

/// Available text generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// `OpenAI` chat completions.
    #[default]
    OpenAi,
    /// Anthropic messages.
    Anthropic,
    /// Built-in canned responses.
    Canned,
}

impl LlmProvider {
    /// Parses a provider string, defaulting to `OpenAi`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Self::Anthropic,
            "canned" | "mock" | "offline" => Self::Canned,
            _ => Self::OpenAi,
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Canned => "canned",
        }
    }
}

/// Text generation settings.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// Provider.
    pub provider: LlmProvider,
    /// Model name. Each provider has its own default.
    pub model: Option<String>,
    /// API key. Falls back to the provider's conventional env var.
    pub api_key: Option<SecretString>,
    /// Base URL override.
    pub base_url: Option<String>,
    /// Consecutive failures before the breaker opens.
    pub breaker_failure_threshold: Option<u32>,
    /// How long the breaker stays open, in milliseconds.
    pub breaker_reset_ms: Option<u64>,
}

/// Observability section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservabilitySettings {
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// OTLP trace export settings.
    pub tracing: Option<TracingSettings>,
    /// Prometheus settings.
    pub metrics: Option<MetricsSettings>,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// `EnvFilter` directive.
    pub filter: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<String>,
}

/// OTLP trace export settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TracingSettings {
    /// Whether to export spans.
    pub enabled: Option<bool>,
    /// Collector endpoint.
    pub endpoint: Option<String>,
    /// `grpc` or `http`.
    pub protocol: Option<String>,
    /// Fraction of traces to sample.
    pub sample_ratio: Option<f64>,
    /// Reported service name.
    pub service_name: Option<String>,
}

/// Prometheus settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
    /// Whether to install the recorder.
    pub enabled: Option<bool>,
    /// Listener port.
    pub port: Option<u16>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Feature flags.
    pub features: Option<ConfigFileFeatures>,
    /// Cache section.
    pub cache: Option<ConfigFileCache>,
    /// Weather section.
    pub weather: Option<ConfigFileWeather>,
    /// Evidence section.
    pub evidence: Option<ConfigFileEvidence>,
    /// LLM section.
    pub llm: Option<ConfigFileLlm>,
    /// Timeouts section, keyed by operation name.
    pub timeouts: Option<ConfigFileTimeouts>,
    /// Observability section.
    pub observability: Option<ObservabilitySettings>,
}

/// Features section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileFeatures {
    /// Offline mode.
    pub offline_mode: Option<bool>,
    /// LLM explanations.
    pub llm_explanations: Option<bool>,
    /// Auto-seed.
    pub auto_seed: Option<bool>,
}

/// Cache section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileCache {
    /// Redis URL.
    pub redis_url: Option<String>,
    /// TTL in seconds.
    pub ttl_secs: Option<u64>,
}

/// Weather section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileWeather {
    /// API key or `${VAR}` reference.
    pub api_key: Option<String>,
    /// API root.
    pub base_url: Option<String>,
}

/// Evidence section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileEvidence {
    /// `local` or `pinecone`.
    pub backend: Option<String>,
    /// Corpus file.
    pub corpus_path: Option<String>,
    /// Pinecone index host.
    pub pinecone_host: Option<String>,
    /// Pinecone API key or `${VAR}` reference.
    pub pinecone_api_key: Option<String>,
    /// Pinecone namespace.
    pub pinecone_namespace: Option<String>,
    /// Hits per query.
    pub default_k: Option<usize>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// Provider name.
    pub provider: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// API key or `${VAR}` reference.
    pub api_key: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Breaker failure threshold.
    pub breaker_failure_threshold: Option<u32>,
    /// Breaker open duration.
    pub breaker_reset_ms: Option<u64>,
}

/// Timeouts section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileTimeouts {
    /// Cache budget.
    pub cache_ms: Option<u64>,
    /// Weather budget.
    pub weather_ms: Option<u64>,
    /// Air quality budget.
    pub air_quality_ms: Option<u64>,
    /// UV budget.
    pub uv_index_ms: Option<u64>,
    /// Evidence budget.
    pub evidence_ms: Option<u64>,
    /// Text generation budget.
    pub text_generation_ms: Option<u64>,
}

impl Default for ClimariskConfig {
    fn default() -> Self {
        Self {
            features: FeatureFlags::default(),
            cache: CacheConfig::default(),
            weather: WeatherConfig::default(),
            evidence: EvidenceConfig::default(),
            llm: LlmConfig::default(),
            timeouts: OperationTimeoutConfig::default(),
            observability: ObservabilitySettings::default(),
        }
    }
}

impl ClimariskConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::failed("read_config_file", format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::failed("parse_config_file", e))?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Looks for `climarisk/config.toml` in the platform config dir, then in
    /// `~/.config/`. Returns defaults if neither exists or parses.
    #[must_use]
    pub fn load_default() -> Self {
        default_config_paths()
            .into_iter()
            .filter(|path| path.exists())
            .find_map(|path| match Self::load_from_file(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                    None
                },
            })
            .unwrap_or_default()
    }

    /// Converts a `ConfigFile` to `ClimariskConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(features) = file.features {
            if let Some(v) = features.offline_mode {
                config.features.offline_mode = v;
            }
            if let Some(v) = features.llm_explanations {
                config.features.llm_explanations = v;
            }
            if let Some(v) = features.auto_seed {
                config.features.auto_seed = v;
            }
        }
        if let Some(cache) = file.cache {
            config.cache.redis_url = non_blank(cache.redis_url);
            if let Some(ttl) = cache.ttl_secs {
                config.cache.ttl_secs = ttl;
            }
        }
        if let Some(weather) = file.weather {
            config.weather.api_key = secret(weather.api_key);
            if let Some(url) = non_blank(weather.base_url) {
                config.weather.base_url = url;
            }
        }
        if let Some(evidence) = file.evidence {
            if let Some(backend) = evidence.backend {
                config.evidence.backend = EvidenceBackend::parse(&backend);
            }
            if let Some(path) = non_blank(evidence.corpus_path) {
                config.evidence.corpus_path = PathBuf::from(path);
            }
            config.evidence.pinecone_host = non_blank(evidence.pinecone_host);
            config.evidence.pinecone_api_key = secret(evidence.pinecone_api_key);
            config.evidence.pinecone_namespace = non_blank(evidence.pinecone_namespace);
            if let Some(k) = evidence.default_k {
                config.evidence.default_k = k;
            }
        }
        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                config.llm.provider = LlmProvider::parse(&provider);
            }
            config.llm.model = non_blank(llm.model);
            config.llm.api_key = secret(llm.api_key);
            config.llm.base_url = non_blank(llm.base_url);
            config.llm.breaker_failure_threshold = llm.breaker_failure_threshold;
            config.llm.breaker_reset_ms = llm.breaker_reset_ms;
        }
        if let Some(t) = file.timeouts {
            let pairs = [
                (OperationType::Cache, t.cache_ms),
                (OperationType::Weather, t.weather_ms),
                (OperationType::AirQuality, t.air_quality_ms),
                (OperationType::UvIndex, t.uv_index_ms),
                (OperationType::Evidence, t.evidence_ms),
                (OperationType::TextGeneration, t.text_generation_ms),
            ];
            for (op, ms) in pairs {
                if let Some(ms) = ms {
                    config.timeouts.set(op, ms);
                }
            }
        }
        if let Some(observability) = file.observability {
            config.observability = observability;
        }

        config
    }

    /// Applies `CLIMARISK_*` environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`.
    ///
    /// Unparseable numeric and boolean values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| non_blank(lookup(key));
        let first = |keys: &[&str]| keys.iter().copied().find_map(&get);

        if let Some(v) = get("CLIMARISK_OFFLINE_MODE").and_then(|v| parse_bool(&v)) {
            self.features.offline_mode = v;
        }
        if let Some(v) = get("CLIMARISK_LLM_EXPLANATIONS").and_then(|v| parse_bool(&v)) {
            self.features.llm_explanations = v;
        }
        if let Some(v) = get("CLIMARISK_AUTO_SEED").and_then(|v| parse_bool(&v)) {
            self.features.auto_seed = v;
        }

        if let Some(url) = first(&["CLIMARISK_REDIS_URL", "REDIS_URL"]) {
            self.cache.redis_url = Some(url);
        }
        if let Some(ttl) = get("CLIMARISK_CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.cache.ttl_secs = ttl;
        }

        if let Some(key) = first(&["CLIMARISK_WEATHER_API_KEY", "OPENWEATHER_API_KEY"]) {
            self.weather.api_key = Some(SecretString::from(key));
        }
        if let Some(url) = get("CLIMARISK_WEATHER_BASE_URL") {
            self.weather.base_url = url;
        }

        if let Some(backend) = get("CLIMARISK_EVIDENCE_BACKEND") {
            self.evidence.backend = EvidenceBackend::parse(&backend);
        }
        if let Some(path) = get("CLIMARISK_CORPUS_PATH") {
            self.evidence.corpus_path = PathBuf::from(path);
        }
        if let Some(host) = first(&["CLIMARISK_PINECONE_HOST", "PINECONE_HOST"]) {
            self.evidence.pinecone_host = Some(host);
        }
        if let Some(key) = first(&["CLIMARISK_PINECONE_API_KEY", "PINECONE_API_KEY"]) {
            self.evidence.pinecone_api_key = Some(SecretString::from(key));
        }
        if let Some(namespace) = get("CLIMARISK_PINECONE_NAMESPACE") {
            self.evidence.pinecone_namespace = Some(namespace);
        }
        if let Some(k) = get("CLIMARISK_EVIDENCE_K").and_then(|v| v.parse().ok()) {
            self.evidence.default_k = k;
        }

        if let Some(provider) = get("CLIMARISK_LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider);
        }
        if let Some(model) = get("CLIMARISK_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(key) = get("CLIMARISK_LLM_API_KEY") {
            self.llm.api_key = Some(SecretString::from(key));
        }
        if self.llm.api_key.is_none() {
            let fallback = match self.llm.provider {
                LlmProvider::OpenAi => get("OPENAI_API_KEY"),
                LlmProvider::Anthropic => get("ANTHROPIC_API_KEY"),
                LlmProvider::Canned => None,
            };
            self.llm.api_key = fallback.map(SecretString::from);
        }
        if let Some(url) = get("CLIMARISK_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }

        self.timeouts = self.timeouts.with_overrides(&lookup);
        self
    }

    /// Returns true when environment lookups should use offline baselines.
    #[must_use]
    pub const fn weather_offline(&self) -> bool {
        self.features.offline_mode || self.weather.api_key.is_none()
    }

    /// Summarizes the effective configuration with secrets redacted.
    #[must_use]
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "features": {
                "offlineMode": self.features.offline_mode,
                "llmExplanations": self.features.llm_explanations,
                "autoSeed": self.features.auto_seed,
            },
            "cache": {
                "backend": if self.cache.redis_url.is_some() { "redis" } else { "memory" },
                "ttlSecs": self.cache.ttl_secs,
            },
            "weather": {
                "baseUrl": self.weather.base_url,
                "apiKey": redact(self.weather.api_key.as_ref()),
            },
            "evidence": {
                "backend": self.evidence.backend.as_str(),
                "corpusPath": self.evidence.corpus_path.display().to_string(),
                "pineconeHost": self.evidence.pinecone_host,
                "pineconeApiKey": redact(self.evidence.pinecone_api_key.as_ref()),
                "defaultK": self.evidence.default_k,
            },
            "llm": {
                "provider": self.llm.provider.as_str(),
                "model": self.llm.model,
                "apiKey": redact(self.llm.api_key.as_ref()),
                "baseUrl": self.llm.base_url,
            },
            "timeoutsMs": OperationType::ALL
                .iter()
                .map(|op| (op.as_str().to_string(), serde_json::json!(self.timeouts.get_ms(*op))))
                .collect::<serde_json::Map<_, _>>(),
        })
    }

    /// Enables offline mode.
    #[must_use]
    pub fn with_offline_mode(mut self, offline: bool) -> Self {
        self.features.offline_mode = offline;
        self
    }

    /// Sets the local corpus path.
    #[must_use]
    pub fn with_corpus_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.evidence.corpus_path = path.into();
        self
    }
}

/// Returns the directory for the local corpus and other data.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "climarisk")
        .map_or_else(|| PathBuf::from(".climarisk"), |dirs| dirs.data_dir().to_path_buf())
}

fn default_config_paths() -> Vec<PathBuf> {
    let Some(base_dirs) = directories::BaseDirs::new() else {
        return Vec::new();
    };
    vec![
        base_dirs.config_dir().join("climarisk").join("config.toml"),
        base_dirs
            .home_dir()
            .join(".config")
            .join("climarisk")
            .join("config.toml"),
    ]
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Expands a `${VAR}` reference, otherwise returns the value as-is.
fn expand_env_reference(value: String) -> Option<String> {
    match value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(var) => non_blank(std::env::var(var).ok()),
        None => Some(value),
    }
}

fn secret(value: Option<String>) -> Option<SecretString> {
    non_blank(value)
        .and_then(expand_env_reference)
        .map(SecretString::from)
}

fn redact(value: Option<&SecretString>) -> &'static str {
    match value {
        Some(secret) if !secret.expose_secret().is_empty() => "set",
        _ => "unset",
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClimariskConfig::default();
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.evidence.default_k, 3);
        assert!(config.weather_offline());
        assert!(!config.features.offline_mode);
        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
    }

    #[test]
    fn test_from_toml() {
        let config = ClimariskConfig::from_toml(
            r#"
            [features]
            offline_mode = true

            [cache]
            redis_url = "redis://localhost:6379"
            ttl_secs = 60

            [evidence]
            backend = "pinecone"
            pinecone_host = "https://idx.svc.pinecone.io"
            default_k = 5

            [llm]
            provider = "anthropic"
            model = "claude-haiku"

            [timeouts]
            weather_ms = 900

            [observability.logging]
            format = "json"
            "#,
        )
        .expect("config parses");

        assert!(config.features.offline_mode);
        assert_eq!(config.cache.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.evidence.backend, EvidenceBackend::Pinecone);
        assert_eq!(config.evidence.default_k, 5);
        assert_eq!(config.llm.provider, LlmProvider::Anthropic);
        assert_eq!(config.llm.model.as_deref(), Some("claude-haiku"));
        assert_eq!(config.timeouts.weather_ms, 900);
        assert_eq!(
            config
                .observability
                .logging
                .and_then(|l| l.format)
                .as_deref(),
            Some("json")
        );
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(ClimariskConfig::from_toml("[storage]\npath = \"x\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = ClimariskConfig::default().with_overrides(env(&[
            ("CLIMARISK_OFFLINE_MODE", "yes"),
            ("CLIMARISK_CACHE_TTL_SECS", "42"),
            ("OPENWEATHER_API_KEY", "abc"),
            ("CLIMARISK_LLM_PROVIDER", "anthropic"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("OPENAI_API_KEY", "sk-openai"),
            ("CLIMARISK_TIMEOUT_CACHE_MS", "75"),
        ]));

        assert!(config.features.offline_mode);
        assert_eq!(config.cache.ttl_secs, 42);
        assert!(config.weather.api_key.is_some());
        assert_eq!(config.llm.provider, LlmProvider::Anthropic);
        assert_eq!(
            config.llm.api_key.as_ref().map(ExposeSecret::expose_secret),
            Some("sk-ant")
        );
        assert_eq!(config.timeouts.cache_ms, 75);
    }

    #[test]
    fn test_blank_and_invalid_env_ignored() {
        let config = ClimariskConfig::default().with_overrides(env(&[
            ("CLIMARISK_OFFLINE_MODE", "maybe"),
            ("CLIMARISK_CACHE_TTL_SECS", "-1"),
            ("CLIMARISK_REDIS_URL", "   "),
        ]));
        assert!(!config.features.offline_mode);
        assert_eq!(config.cache.ttl_secs, 300);
        assert!(config.cache.redis_url.is_none());
    }

    #[test]
    fn test_summary_redacts_secrets() {
        let config = ClimariskConfig::default()
            .with_overrides(env(&[("CLIMARISK_WEATHER_API_KEY", "super-secret")]));
        let summary = config.redacted_summary().to_string();
        assert!(!summary.contains("super-secret"));
        assert!(summary.contains("\"apiKey\":\"set\""));
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(LlmProvider::parse("Claude"), LlmProvider::Anthropic);
        assert_eq!(LlmProvider::parse("mock"), LlmProvider::Canned);
        assert_eq!(LlmProvider::parse("whatever"), LlmProvider::OpenAi);
    }
}
