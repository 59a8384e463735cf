//! Service wiring.
//!
//! Builds every collaborator from a [`ClimariskConfig`] and hands out the
//! services that share them. Backends that cannot be reached degrade to
//! their local counterparts rather than failing startup.

use super::{AssistantService, EvidenceService, PredictionService};
use crate::cache::{Cache, CacheClient, MemoryCache, RedisCache};
use crate::config::{ClimariskConfig, EvidenceBackend, OperationType};
use crate::embedding::{CharCodeEmbedder, Embedder};
use crate::environment::{EnvironmentProvider, OpenWeatherClient};
use crate::evidence::{EvidenceStore, LocalEvidenceStore, PineconeEvidenceStore};
use crate::llm::{HttpClientConfig, TextGenerator, build_generator, build_http_client};
use crate::Result;
use std::sync::Arc;

/// Shared collaborators and the services built on them.
pub struct ServiceContainer {
    cache: CacheClient,
    environment: EnvironmentProvider,
    evidence: EvidenceService,
    prediction: PredictionService,
    assistant: AssistantService,
}

impl ServiceContainer {
    /// Connects every collaborator described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if seeding an empty corpus fails while `auto_seed`
    /// is enabled.
    #[tracing::instrument(skip_all)]
    pub async fn connect(config: &ClimariskConfig) -> Result<Self> {
        let http = build_http_client(HttpClientConfig::from_env());
        let timeouts = config.timeouts;
        let offline = config.features.offline_mode;

        let cache = connect_cache(config).await;

        let environment = match config.weather.api_key.clone() {
            Some(key) if !config.weather_offline() => {
                let source = OpenWeatherClient::new(key, http.clone())
                    .with_base_url(&config.weather.base_url);
                EnvironmentProvider::new(Arc::new(source), cache.clone())
            },
            _ => EnvironmentProvider::offline(cache.clone()),
        }
        .with_timeouts(timeouts);

        let embedder: Arc<dyn Embedder> = Arc::new(CharCodeEmbedder::new());
        let store = open_store(config, embedder, http.clone());

        let generator: Arc<dyn TextGenerator> = build_generator(
            &config.llm,
            offline,
            http,
            timeouts.get(OperationType::TextGeneration),
        );

        let evidence = EvidenceService::new(Arc::clone(&store))
            .with_timeouts(timeouts)
            .with_default_k(config.evidence.default_k);

        if config.features.auto_seed {
            let seeded = evidence.seed_if_empty().await?;
            if seeded > 0 {
                tracing::info!(seeded, "Seeded empty evidence store");
            }
        }

        let prediction = PredictionService::new(
            environment.clone(),
            Arc::clone(&store),
            Arc::clone(&generator),
            cache.clone(),
        )
        .with_timeouts(timeouts)
        .with_offline(offline)
        .with_llm_explanations(config.features.llm_explanations)
        .with_evidence_k(config.evidence.default_k);

        let assistant = AssistantService::new(store, generator)
            .with_timeouts(timeouts)
            .with_offline(offline);

        tracing::info!(
            cache = cache.is_enabled(),
            weather_offline = environment.is_offline(),
            evidence = evidence.store().name(),
            "Services connected"
        );

        Ok(Self {
            cache,
            environment,
            evidence,
            prediction,
            assistant,
        })
    }

    /// Returns the prediction service.
    #[must_use]
    pub const fn prediction(&self) -> &PredictionService {
        &self.prediction
    }

    /// Returns the evidence service.
    #[must_use]
    pub const fn evidence(&self) -> &EvidenceService {
        &self.evidence
    }

    /// Returns the assistant service.
    #[must_use]
    pub const fn assistant(&self) -> &AssistantService {
        &self.assistant
    }

    /// Returns the environment provider.
    #[must_use]
    pub const fn environment(&self) -> &EnvironmentProvider {
        &self.environment
    }

    /// Releases backend connections.
    pub async fn close(self) {
        self.cache.close().await;
        tracing::debug!("Services closed");
    }
}

async fn connect_cache(config: &ClimariskConfig) -> CacheClient {
    let timeout = config.timeouts.get(OperationType::Cache);
    let backend: Arc<dyn Cache> = match config.cache.redis_url.as_deref() {
        Some(url) => match RedisCache::connect(url).await {
            Ok(redis) => Arc::new(redis),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, using in-process cache");
                Arc::new(MemoryCache::new())
            },
        },
        None => Arc::new(MemoryCache::new()),
    };
    CacheClient::new(backend, timeout).with_default_ttl(config.cache.ttl_secs)
}

fn open_store(
    config: &ClimariskConfig,
    embedder: Arc<dyn Embedder>,
    http: reqwest::Client,
) -> Arc<dyn EvidenceStore> {
    let settings = &config.evidence;
    if settings.backend == EvidenceBackend::Pinecone {
        match (settings.pinecone_host.as_deref(), settings.pinecone_api_key.clone()) {
            (Some(host), Some(key)) => {
                let mut store = PineconeEvidenceStore::new(host, key, embedder, http);
                if let Some(namespace) = settings.pinecone_namespace.as_deref() {
                    store = store.with_namespace(namespace);
                }
                return Arc::new(store);
            },
            _ => {
                tracing::warn!("Pinecone backend needs a host and API key, using local corpus");
            },
        }
    }
    Arc::new(LocalEvidenceStore::open(settings.corpus_path.clone(), embedder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, UserProfile};

    fn offline_config(dir: &tempfile::TempDir) -> ClimariskConfig {
        let mut config = ClimariskConfig::default()
            .with_offline_mode(true)
            .with_corpus_path(dir.path().join("vectors.json"));
        config.features.auto_seed = true;
        config
    }

    #[tokio::test]
    async fn test_connect_offline_seeds_and_predicts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = ServiceContainer::connect(&offline_config(&dir))
            .await
            .expect("connects");

        assert!(container.environment().is_offline());
        assert_eq!(container.evidence().count().await.expect("counts"), 20);

        let location = Location::City("Delhi".to_string());
        let result = container
            .prediction()
            .predict(&UserProfile::anonymous(), &location, None)
            .await
            .expect("predicts");
        assert!(!result.status.is_degraded());
        assert_eq!(result.environment.aqi, 180);

        container.close().await;
    }

    #[tokio::test]
    async fn test_offline_mode_ignores_weather_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = offline_config(&dir);
        config.weather.api_key = Some(secrecy::SecretString::from("owm-key".to_string()));

        let container = ServiceContainer::connect(&config).await.expect("connects");
        assert!(container.environment().is_offline());
        container.close().await;
    }

    #[tokio::test]
    async fn test_pinecone_without_host_falls_back_to_local() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = offline_config(&dir);
        config.evidence.backend = EvidenceBackend::Pinecone;
        let store = open_store(
            &config,
            Arc::new(CharCodeEmbedder::new()),
            reqwest::Client::new(),
        );
        assert_eq!(store.name(), "local");
    }
}
