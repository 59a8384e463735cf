//! Per-operation timeouts for external calls.

use std::time::Duration;

/// External operations that run under a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// Cache get/set/delete.
    Cache,
    /// Current weather lookup.
    Weather,
    /// Air pollution lookup.
    AirQuality,
    /// UV index lookup.
    UvIndex,
    /// Evidence similarity search or ingestion.
    Evidence,
    /// Text generation.
    TextGeneration,
}

impl OperationType {
    /// All operation types.
    pub const ALL: [Self; 6] = [
        Self::Cache,
        Self::Weather,
        Self::AirQuality,
        Self::UvIndex,
        Self::Evidence,
        Self::TextGeneration,
    ];

    /// Returns the operation name used in logs and env var names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Weather => "weather",
            Self::AirQuality => "air_quality",
            Self::UvIndex => "uv_index",
            Self::Evidence => "evidence",
            Self::TextGeneration => "text_generation",
        }
    }

    const fn default_ms(self) -> u64 {
        match self {
            Self::Cache => 500,
            Self::Weather => 5_000,
            Self::AirQuality | Self::UvIndex => 3_000,
            Self::Evidence => 5_000,
            Self::TextGeneration => 30_000,
        }
    }

    fn env_key(self) -> String {
        format!("CLIMARISK_TIMEOUT_{}_MS", self.as_str().to_uppercase())
    }
}

/// Timeout budgets in milliseconds. Zero disables the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimeoutConfig {
    /// Cache calls.
    pub cache_ms: u64,
    /// Weather lookups.
    pub weather_ms: u64,
    /// Air pollution lookups.
    pub air_quality_ms: u64,
    /// UV index lookups.
    pub uv_index_ms: u64,
    /// Evidence store calls.
    pub evidence_ms: u64,
    /// Text generation calls.
    pub text_generation_ms: u64,
}

impl Default for OperationTimeoutConfig {
    fn default() -> Self {
        Self {
            cache_ms: OperationType::Cache.default_ms(),
            weather_ms: OperationType::Weather.default_ms(),
            air_quality_ms: OperationType::AirQuality.default_ms(),
            uv_index_ms: OperationType::UvIndex.default_ms(),
            evidence_ms: OperationType::Evidence.default_ms(),
            text_generation_ms: OperationType::TextGeneration.default_ms(),
        }
    }
}

impl OperationTimeoutConfig {
    /// Loads defaults with `CLIMARISK_TIMEOUT_*_MS` overrides.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies `CLIMARISK_TIMEOUT_<OPERATION>_MS` overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`. Unparseable values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for op in OperationType::ALL {
            if let Some(ms) = lookup(&op.env_key()).and_then(|v| v.trim().parse::<u64>().ok()) {
                self.set(op, ms);
            }
        }
        self
    }

    /// Returns the budget for an operation.
    #[must_use]
    pub const fn get(&self, operation: OperationType) -> Duration {
        Duration::from_millis(self.get_ms(operation))
    }

    /// Returns the budget for an operation in milliseconds.
    #[must_use]
    pub const fn get_ms(&self, operation: OperationType) -> u64 {
        match operation {
            OperationType::Cache => self.cache_ms,
            OperationType::Weather => self.weather_ms,
            OperationType::AirQuality => self.air_quality_ms,
            OperationType::UvIndex => self.uv_index_ms,
            OperationType::Evidence => self.evidence_ms,
            OperationType::TextGeneration => self.text_generation_ms,
        }
    }

    /// Sets the budget for an operation.
    pub const fn set(&mut self, operation: OperationType, ms: u64) {
        match operation {
            OperationType::Cache => self.cache_ms = ms,
            OperationType::Weather => self.weather_ms = ms,
            OperationType::AirQuality => self.air_quality_ms = ms,
            OperationType::UvIndex => self.uv_index_ms = ms,
            OperationType::Evidence => self.evidence_ms = ms,
            OperationType::TextGeneration => self.text_generation_ms = ms,
        }
    }

    /// Sets the budget for an operation.
    #[must_use]
    pub const fn with(mut self, operation: OperationType, ms: u64) -> Self {
        self.set(operation, ms);
        self
    }
}
