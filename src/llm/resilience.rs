//! Circuit breaking and deadlines around text generation.

use super::TextGenerator;
use crate::config::LlmConfig;
use crate::{Error, Result, with_timeout};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Resilience configuration for text generation calls.
#[derive(Debug, Clone)]
pub struct LlmResilienceConfig {
    /// Consecutive failures before opening the circuit.
    pub breaker_failure_threshold: u32,
    /// How long to keep the circuit open before half-open.
    pub breaker_reset_timeout_ms: u64,
    /// Maximum trial calls while half-open.
    pub breaker_half_open_max_calls: u32,
    /// Per-call deadline. Zero disables it.
    pub timeout: Duration,
}

impl Default for LlmResilienceConfig {
    fn default() -> Self {
        Self {
            breaker_failure_threshold: 3,
            breaker_reset_timeout_ms: 30_000,
            breaker_half_open_max_calls: 1,
            timeout: Duration::ZERO,
        }
    }
}

impl LlmResilienceConfig {
    /// Loads resilience configuration from config file settings.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut settings = Self::default();
        if let Some(threshold) = config.breaker_failure_threshold {
            settings.breaker_failure_threshold = threshold.max(1);
        }
        if let Some(reset_ms) = config.breaker_reset_ms {
            settings.breaker_reset_timeout_ms = reset_ms;
        }
        settings
    }

    /// Sets the per-call deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Circuit breaker state machine.
#[derive(Debug)]
enum BreakerState {
    Closed { failures: u32 },
    Open { opened_at: Instant },
    HalfOpen { attempts: u32 },
}

#[derive(Debug)]
struct CircuitBreaker {
    state: BreakerState,
    failure_threshold: u32,
    reset_timeout: Duration,
    half_open_max_calls: u32,
}

impl CircuitBreaker {
    fn new(config: &LlmResilienceConfig) -> Self {
        Self {
            state: BreakerState::Closed { failures: 0 },
            failure_threshold: config.breaker_failure_threshold.max(1),
            reset_timeout: Duration::from_millis(config.breaker_reset_timeout_ms),
            half_open_max_calls: config.breaker_half_open_max_calls.max(1),
        }
    }

    fn allow(&mut self) -> bool {
        match self.state {
            BreakerState::Closed { .. } => true,
            BreakerState::Open { opened_at } => {
                if opened_at.elapsed() >= self.reset_timeout {
                    self.state = BreakerState::HalfOpen { attempts: 1 };
                    true
                } else {
                    false
                }
            },
            BreakerState::HalfOpen { ref mut attempts } => {
                if *attempts >= self.half_open_max_calls {
                    false
                } else {
                    *attempts += 1;
                    true
                }
            },
        }
    }

    const fn on_success(&mut self) {
        self.state = BreakerState::Closed { failures: 0 };
    }

    /// Records a failure. Returns true when the circuit trips.
    fn on_failure(&mut self) -> bool {
        match self.state {
            BreakerState::Closed { ref mut failures } => {
                *failures += 1;
                if *failures >= self.failure_threshold {
                    self.state = BreakerState::Open {
                        opened_at: Instant::now(),
                    };
                    return true;
                }
            },
            BreakerState::HalfOpen { .. } => {
                self.state = BreakerState::Open {
                    opened_at: Instant::now(),
                };
                return true;
            },
            BreakerState::Open { .. } => {},
        }
        false
    }

    const fn state_value(&self) -> u8 {
        match self.state {
            BreakerState::Closed { .. } => 0,
            BreakerState::Open { .. } => 1,
            BreakerState::HalfOpen { .. } => 2,
        }
    }
}

/// Text generator wrapper with a circuit breaker, a deadline and metrics.
pub struct ResilientGenerator<G: TextGenerator> {
    inner: G,
    timeout: Duration,
    breaker: Mutex<CircuitBreaker>,
}

impl<G: TextGenerator> ResilientGenerator<G> {
    /// Wraps a generator.
    #[must_use]
    pub fn new(inner: G, config: LlmResilienceConfig) -> Self {
        let breaker = CircuitBreaker::new(&config);
        Self {
            inner,
            timeout: config.timeout,
            breaker: Mutex::new(breaker),
        }
    }

    fn lock_breaker(&self) -> std::sync::MutexGuard<'_, CircuitBreaker> {
        self.breaker
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record_breaker_state(provider: &'static str, state: u8) {
        metrics::gauge!("llm_circuit_breaker_state", "provider" => provider).set(f64::from(state));
    }

    async fn execute<F>(&self, operation: &'static str, call: F) -> Result<String>
    where
        F: std::future::Future<Output = Result<String>> + Send,
    {
        let provider = self.inner.name();
        let span = tracing::info_span!(
            "llm.request",
            provider = provider,
            operation = operation,
            status = tracing::field::Empty
        );

        let allowed = {
            let mut breaker = self.lock_breaker();
            let allowed = breaker.allow();
            Self::record_breaker_state(provider, breaker.state_value());
            allowed
        };
        if !allowed {
            span.record("status", "circuit_open");
            metrics::counter!(
                "llm_requests_total",
                "provider" => provider,
                "operation" => operation,
                "status" => "circuit_open"
            )
            .increment(1);
            return Err(Error::failed(
                format!("llm_{operation}"),
                "circuit breaker open",
            ));
        }

        let start = Instant::now();
        let result = with_timeout(&format!("llm_{operation}"), self.timeout, call).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let status = if result.is_ok() { "success" } else { "error" };

        span.record("status", status);
        metrics::counter!(
            "llm_requests_total",
            "provider" => provider,
            "operation" => operation,
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "llm_request_duration_ms",
            "provider" => provider,
            "operation" => operation
        )
        .record(elapsed_ms);

        let state = {
            let mut breaker = self.lock_breaker();
            match &result {
                Ok(_) => breaker.on_success(),
                Err(err) => {
                    if breaker.on_failure() {
                        tracing::warn!(provider, error = %err, "Text generation circuit opened");
                        metrics::counter!(
                            "llm_circuit_breaker_trips_total",
                            "provider" => provider
                        )
                        .increment(1);
                    }
                },
            }
            breaker.state_value()
        };
        Self::record_breaker_state(provider, state);

        result
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for ResilientGenerator<G> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.execute("complete", self.inner.complete(prompt)).await
    }

    async fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        self.execute(
            "complete_with_system",
            self.inner.complete_with_system(system, user),
        )
        .await
    }
}
