//! # Climarisk
//!
//! Climate-driven health risk prediction.
//!
//! Climarisk resolves current weather and pollution conditions for a
//! location, scores the health risk they pose to a specific person, derives
//! prioritized precautions, and backs the result with evidence snippets
//! retrieved from a small document corpus.
//!
//! ## Features
//!
//! - Deterministic multi-factor risk scoring (heat, air quality, UV, disease)
//! - Cache-aside environment and prediction lookups (Redis or in-process)
//! - Offline baselines when the weather source is unavailable
//! - Append-only evidence store with cosine-similarity retrieval
//! - Natural-language explanations with graceful degradation
//!
//! ## Example
//!
//! ```rust,ignore
//! use climarisk::{ClimariskConfig, Location, ServiceContainer, UserProfile};
//!
//! let services = ServiceContainer::connect(&ClimariskConfig::load_default()).await?;
//! let location = Location::resolve(Some("Delhi"), None)?;
//! let result = services
//!     .prediction()
//!     .predict(&UserProfile::anonymous(), &location, None)
//!     .await?;
//! println!("overall risk {}", result.risk_scores.overall);
//! services.close().await;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cache;
pub mod config;
pub mod embedding;
pub mod environment;
pub mod evidence;
pub mod llm;
pub mod models;
pub mod observability;
pub mod risk;
pub mod services;

// Re-exports for convenience
pub use cache::{Cache, CacheClient};
pub use config::{ClimariskConfig, FeatureFlags, OperationTimeoutConfig, OperationType};
pub use embedding::Embedder;
pub use environment::EnvironmentProvider;
pub use evidence::EvidenceStore;
pub use llm::TextGenerator;
pub use models::{
    Coordinates, EnvironmentSnapshot, EvidenceHit, HealthProfile, Location, NewDocument,
    PredictionResult, PredictionStatus, Priority, Recommendation, RiskVector, UserProfile,
};
pub use risk::{recommend, score};
pub use services::{
    AssistantService, EvidenceService, PredictionService, PredictionStats, ServiceContainer,
};

/// Error type for climarisk operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | No city and no coordinates, blank document content, bad config values |
/// | `OperationFailed` | HTTP calls fail, cache or corpus I/O fails, responses cannot be decoded |
/// | `Timeout` | An external call exceeds its configured budget |
/// | `FeatureNotEnabled` | Config selects a backend that was not compiled in |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - Neither a city nor coordinates identify the location
    /// - Ingested documents have empty content or no source label
    /// - A configuration value cannot be parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - A weather, text-generation or index request fails
    /// - The cache backend rejects a command
    /// - The evidence corpus cannot be read or written
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// An external call did not complete within its budget.
    #[error("operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The budget that was exceeded.
        timeout_ms: u64,
    },

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

impl Error {
    /// Shorthand for [`Error::OperationFailed`].
    pub fn failed(operation: impl Into<String>, cause: impl ToString) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    /// Returns true if the error is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for climarisk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Runs `future` under a deadline, mapping expiry to [`Error::Timeout`].
///
/// A zero budget disables the deadline.
///
/// # Errors
///
/// Returns the future's own error, or `Error::Timeout` when the budget runs out.
pub async fn with_timeout<T, F>(operation: &str, timeout: std::time::Duration, future: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    if timeout.is_zero() {
        return future.await;
    }
    tokio::time::timeout(timeout, future)
        .await
        .unwrap_or_else(|_| {
            Err(Error::Timeout {
                operation: operation.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        })
}
