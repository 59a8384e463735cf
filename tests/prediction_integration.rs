//! Integration tests for the prediction pipeline and the assistant.
//!
//! Wires real services over an in-memory cache and evidence store with
//! fake collaborators, then checks caching and degradation behavior.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use async_trait::async_trait;
use chrono::Utc;
use climarisk::cache::MemoryCache;
use climarisk::embedding::CharCodeEmbedder;
use climarisk::evidence::{LocalEvidenceStore, seed_corpus};
use climarisk::llm::{CannedGenerator, LlmResilienceConfig, ResilientGenerator};
use climarisk::models::{ChatTurn, EnvironmentSource};
use climarisk::services::prediction_cache_key;
use climarisk::{
    AssistantService, CacheClient, EnvironmentProvider, EnvironmentSnapshot, Error, EvidenceHit,
    EvidenceStore, HealthProfile, Location, NewDocument, OperationTimeoutConfig, OperationType,
    PredictionResult, PredictionService, Result, TextGenerator, UserProfile,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct FailingStore;

#[async_trait]
impl EvidenceStore for FailingStore {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn add_documents(&self, _docs: Vec<NewDocument>) -> Result<usize> {
        Err(Error::failed("add_documents", "index unavailable"))
    }

    async fn similarity_search(&self, _query: &str, _k: usize) -> Result<Vec<EvidenceHit>> {
        Err(Error::failed("similarity_search", "index unavailable"))
    }

    async fn count(&self) -> Result<usize> {
        Ok(0)
    }
}

/// Counts calls and answers with a fixed sentence, or fails when told to.
struct CountingGenerator {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingGenerator {
    fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for CountingGenerator {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(Error::failed("complete", "provider returned 503"))
        } else {
            Ok("Stay indoors during the afternoon.".to_string())
        }
    }
}

struct SlowGenerator;

#[async_trait]
impl TextGenerator for SlowGenerator {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("too late".to_string())
    }
}

fn memory_cache() -> CacheClient {
    CacheClient::new(Arc::new(MemoryCache::new()), Duration::from_millis(500))
}

async fn seeded_store() -> Arc<dyn EvidenceStore> {
    let store = LocalEvidenceStore::in_memory(Arc::new(CharCodeEmbedder::new()));
    store.add(seed_corpus()).expect("seeds corpus");
    Arc::new(store)
}

fn service(
    cache: &CacheClient,
    evidence: Arc<dyn EvidenceStore>,
    generator: Arc<dyn TextGenerator>,
) -> PredictionService {
    PredictionService::new(
        EnvironmentProvider::offline(cache.clone()),
        evidence,
        generator,
        cache.clone(),
    )
}

fn asthmatic() -> UserProfile {
    UserProfile::new("user-1", HealthProfile::new().with_age(42).with_comorbidity("Asthma"))
}

fn delhi() -> Location {
    Location::City("Delhi".to_string())
}

#[tokio::test]
async fn test_complete_prediction_is_cached() {
    let cache = memory_cache();
    let generator = Arc::new(CountingGenerator::new(false));
    let service = service(&cache, seeded_store().await, generator.clone());

    let first = service
        .predict(&asthmatic(), &delhi(), None)
        .await
        .expect("predicts");
    assert!(!first.status.is_degraded());
    assert_eq!(first.environment.aqi, 180);
    assert_eq!(first.evidence.len(), 3);
    assert_eq!(first.explanation, "Stay indoors during the afternoon.");
    assert_eq!(generator.calls(), 1);

    let cached: Option<PredictionResult> = cache
        .get_json(&prediction_cache_key(&delhi(), "user-1"))
        .await;
    assert_eq!(cached.as_ref(), Some(&first));

    let second = service
        .predict(&asthmatic(), &delhi(), None)
        .await
        .expect("predicts");
    assert_eq!(second, first);
    assert_eq!(generator.calls(), 1, "second call should be served from cache");
}

#[tokio::test]
async fn test_failing_store_degrades_and_skips_cache() {
    let cache = memory_cache();
    let service = service(
        &cache,
        Arc::new(FailingStore),
        Arc::new(CountingGenerator::new(false)),
    );

    let result = service
        .predict(&asthmatic(), &delhi(), None)
        .await
        .expect("degraded results still succeed");

    assert!(result.status.is_degraded());
    assert!(result.explanation.starts_with("Based on current conditions ("));
    assert!(result.evidence.iter().any(|hit| hit.source.contains("Indian Meteorological")));
    assert!(
        cache
            .get(&prediction_cache_key(&delhi(), "user-1"))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_failing_generator_degrades() {
    let cache = memory_cache();
    let generator = Arc::new(CountingGenerator::new(true));
    let service = service(&cache, seeded_store().await, generator.clone());

    let result = service
        .predict(&asthmatic(), &delhi(), None)
        .await
        .expect("predicts");

    assert!(result.status.is_degraded());
    assert_eq!(generator.calls(), 1);
    // Scores are unaffected by degradation.
    assert_eq!(result.risk_scores.air_quality, 78);
}

#[tokio::test]
async fn test_generator_timeout_degrades() {
    let cache = memory_cache();
    let generator = ResilientGenerator::new(
        SlowGenerator,
        LlmResilienceConfig::default().with_timeout(Duration::from_millis(50)),
    );
    let service = service(&cache, seeded_store().await, Arc::new(generator));

    let result = service
        .predict(&asthmatic(), &delhi(), None)
        .await
        .expect("predicts");

    match &result.status {
        climarisk::PredictionStatus::Degraded { reason } => {
            assert!(reason.contains("timed out"), "unexpected reason: {reason}");
        },
        climarisk::PredictionStatus::Complete => panic!("expected a degraded prediction"),
    }
}

#[tokio::test]
async fn test_text_generation_budget_degrades_bare_generator() {
    let cache = memory_cache();
    let timeouts = OperationTimeoutConfig::default().with(OperationType::TextGeneration, 50);
    let service =
        service(&cache, seeded_store().await, Arc::new(SlowGenerator)).with_timeouts(timeouts);

    let start = std::time::Instant::now();
    let result = service
        .predict(&asthmatic(), &delhi(), None)
        .await
        .expect("predicts");

    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(result.status.is_degraded());
    assert_ne!(result.explanation, "too late");
    assert!(
        cache
            .get(&prediction_cache_key(&delhi(), "user-1"))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_assistant_text_generation_budget_falls_back() {
    let timeouts = OperationTimeoutConfig::default().with(OperationType::TextGeneration, 50);
    let assistant = AssistantService::new(seeded_store().await, Arc::new(SlowGenerator))
        .with_timeouts(timeouts);

    let reply = assistant
        .reply(&UserProfile::anonymous(), &[], "Is the air safe?")
        .await;
    assert!(reply.degraded);
    assert_ne!(reply.content, "too late");
}

#[tokio::test]
async fn test_environment_override_skips_cache() {
    let cache = memory_cache();
    let generator = Arc::new(CountingGenerator::new(false));
    let service = service(&cache, seeded_store().await, generator.clone());

    let snapshot = EnvironmentSnapshot {
        temperature: 42.0,
        humidity: 20.0,
        aqi: 320,
        uv_index: 11.0,
        wind_speed: 2.0,
        pressure: 1002.0,
        description: "haze".to_string(),
        timestamp: Utc::now(),
        source: EnvironmentSource::Live,
    };

    let result = service
        .predict(&asthmatic(), &delhi(), Some(snapshot.clone()))
        .await
        .expect("predicts");
    assert_eq!(result.environment, snapshot);
    assert_eq!(result.risk_scores.heatwave, 100);
    assert_eq!(result.risk_scores.uv_exposure, 90);

    assert!(
        cache
            .get(&prediction_cache_key(&delhi(), "user-1"))
            .await
            .is_none()
    );

    service
        .predict(&asthmatic(), &delhi(), Some(snapshot))
        .await
        .expect("predicts");
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_blank_user_id_is_rejected() {
    let cache = memory_cache();
    let service = service(
        &cache,
        seeded_store().await,
        Arc::new(CannedGenerator::new()),
    );
    let user = UserProfile::new("   ", HealthProfile::new());

    let err = service
        .predict(&user, &delhi(), None)
        .await
        .expect_err("blank id must fail");
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_offline_mode_uses_canned_evidence() {
    let cache = memory_cache();
    let service = service(
        &cache,
        Arc::new(FailingStore),
        Arc::new(CannedGenerator::new()),
    )
    .with_offline(true);

    let result = service
        .predict(&asthmatic(), &delhi(), None)
        .await
        .expect("predicts");
    assert!(!result.status.is_degraded());
    assert!(result.evidence.iter().any(|hit| hit.source.contains("Lancet")));
}

#[tokio::test]
async fn test_assistant_reply_with_context() {
    let assistant = AssistantService::new(seeded_store().await, Arc::new(CannedGenerator::new()));
    let user = asthmatic().with_city("Delhi");
    let history = vec![
        ChatTurn::user("Hello"),
        ChatTurn::assistant("Hi, how can I help?"),
    ];

    let reply = assistant
        .reply(&user, &history, "Is it safe to jog outside today?")
        .await;
    assert!(!reply.degraded);
    assert_eq!(reply.evidence.len(), 2);
    assert!(reply.evidence.iter().all(|e| e.snippet.ends_with("...")));
}

#[tokio::test]
async fn test_assistant_falls_back_on_failure() {
    let assistant = AssistantService::new(
        Arc::new(FailingStore),
        Arc::new(CountingGenerator::new(false)),
    );

    let reply = assistant
        .reply(&UserProfile::anonymous(), &[], "What about pollen?")
        .await;
    assert!(reply.degraded);
    assert!(reply.evidence.is_empty());
    assert!(reply.content.contains("\"What about pollen?\""));
    assert!(reply.content.contains("your area"));
}
