//! Text generation clients.
//!
//! Provides a unified async interface over the hosted providers plus an
//! offline canned generator. [`build_generator`] picks one from config and
//! wraps it in [`ResilientGenerator`].

mod anthropic;
mod canned;
mod openai;
mod resilience;

pub use anthropic::AnthropicClient;
pub use canned::CannedGenerator;
pub use openai::OpenAiClient;
pub use resilience::{LlmResilienceConfig, ResilientGenerator};

use crate::Result;
use crate::config::{LlmConfig, LlmProvider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// System prompt shared by every provider.
pub const SYSTEM_PROMPT: &str = "You are a helpful climate-health AI assistant. Provide accurate, evidence-based advice. Always prioritize safety and recommend consulting healthcare providers for serious concerns.";

/// Upper bound on generated tokens.
pub const MAX_TOKENS: u32 = 500;

/// Trait for text generation providers.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Generates a completion for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Generates a completion with a system prompt.
    ///
    /// Default implementation concatenates system and user prompts.
    /// Providers should override this to use native system prompt support.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    async fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        let combined = format!("{system}\n\n---\n\nUser message:\n{user}");
        self.complete(&combined).await
    }
}

/// HTTP client configuration for outbound requests.
#[derive(Debug, Clone, Copy)]
pub struct HttpClientConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl HttpClientConfig {
    /// Loads defaults with `CLIMARISK_HTTP_*` overrides.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("CLIMARISK_HTTP_TIMEOUT_MS") {
            if let Ok(timeout_ms) = v.parse::<u64>() {
                self.timeout_ms = timeout_ms;
            }
        }
        if let Ok(v) = std::env::var("CLIMARISK_HTTP_CONNECT_TIMEOUT_MS") {
            if let Ok(connect_timeout_ms) = v.parse::<u64>() {
                self.connect_timeout_ms = connect_timeout_ms;
            }
        }
        self
    }
}

/// Builds the shared async HTTP client with configured timeouts.
#[must_use]
pub fn build_http_client(config: HttpClientConfig) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build HTTP client: {err}");
        reqwest::Client::new()
    })
}

/// Classifies a transport error for logs.
pub(crate) fn request_error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else {
        "unknown"
    }
}

/// Picks a provider from config and wraps it in the resilience layer.
///
/// Offline mode, the `canned` provider, and a hosted provider without an
/// API key all yield the canned generator.
#[must_use]
pub fn build_generator(
    config: &LlmConfig,
    offline: bool,
    client: reqwest::Client,
    timeout: Duration,
) -> Arc<dyn TextGenerator> {
    let resilience = LlmResilienceConfig::from_config(config).with_timeout(timeout);
    if offline {
        tracing::info!("Offline mode, using canned text generation");
        return Arc::new(ResilientGenerator::new(CannedGenerator::new(), resilience));
    }

    match (config.provider, config.api_key.clone()) {
        (LlmProvider::OpenAi, Some(key)) => {
            let mut provider = OpenAiClient::new(key, client);
            if let Some(model) = config.model.as_deref() {
                provider = provider.with_model(model);
            }
            if let Some(url) = config.base_url.as_deref() {
                provider = provider.with_endpoint(url);
            }
            Arc::new(ResilientGenerator::new(provider, resilience))
        },
        (LlmProvider::Anthropic, Some(key)) => {
            let mut provider = AnthropicClient::new(key, client);
            if let Some(model) = config.model.as_deref() {
                provider = provider.with_model(model);
            }
            if let Some(url) = config.base_url.as_deref() {
                provider = provider.with_endpoint(url);
            }
            Arc::new(ResilientGenerator::new(provider, resilience))
        },
        (LlmProvider::Canned, _) => {
            Arc::new(ResilientGenerator::new(CannedGenerator::new(), resilience))
        },
        (provider, None) => {
            tracing::warn!(
                provider = provider.as_str(),
                "No API key configured, using canned text generation"
            );
            Arc::new(ResilientGenerator::new(CannedGenerator::new(), resilience))
        },
    }
}
