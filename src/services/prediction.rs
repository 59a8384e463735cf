//! Prediction orchestration.
//!
//! Ties the pipeline together: environment, scoring, recommendations,
//! evidence retrieval and a generated explanation. Retrieval and
//! explanation failures degrade the result instead of failing it.

use crate::cache::CacheClient;
use crate::config::{DEFAULT_EVIDENCE_K, OperationTimeoutConfig, OperationType};
use crate::environment::EnvironmentProvider;
use crate::evidence::EvidenceStore;
use crate::llm::{SYSTEM_PROMPT, TextGenerator};
use crate::models::{
    EnvironmentSnapshot, EvidenceHit, HealthProfile, Location, PredictionResult,
    PredictionStatus, RiskVector, UserProfile,
};
use crate::risk::{recommend, score};
use crate::{Error, Result, with_timeout};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Returns the cache key for a user's prediction at a location.
#[must_use]
pub fn cache_key(location: &Location, user_id: &str) -> String {
    format!("prediction:{}:{user_id}", location.key())
}

/// Evidence used when retrieval is skipped or fails.
///
/// Heat and air-quality entries appear only when those factors exceed 60;
/// the regional entry is always present.
#[must_use]
pub fn canned_evidence(risk: &RiskVector) -> Vec<EvidenceHit> {
    let mut evidence = Vec::with_capacity(3);
    if risk.heatwave > 60 {
        evidence.push(EvidenceHit::new(
            "WHO Climate Health Report 2024",
            "Extreme heat events are associated with increased mortality, especially among elderly and those with cardiovascular conditions.",
            0.92,
        ));
    }
    if risk.air_quality > 60 {
        evidence.push(EvidenceHit::new(
            "Lancet Study on Air Pollution",
            "PM2.5 levels above 100 μg/m³ are linked to respiratory illnesses and increased hospital admissions.",
            0.88,
        ));
    }
    evidence.push(EvidenceHit::new(
        "Indian Meteorological Department",
        "Regional climate patterns show increasing frequency of extreme weather events requiring adaptive health measures.",
        0.75,
    ));
    evidence
}

/// One-sentence summary used when no generated explanation is available.
#[must_use]
pub fn fallback_explanation(env: &EnvironmentSnapshot, risk: &RiskVector) -> String {
    let advice = if risk.overall > 70 {
        "Take immediate precautions."
    } else {
        "Follow general safety guidelines."
    };
    format!(
        "Based on current conditions ({}°C, AQI {}), your overall health risk is {}/100. {advice}",
        env.temperature, env.aqi, risk.overall
    )
}

/// Query text used to retrieve evidence for an environment.
#[must_use]
pub fn evidence_query(env: &EnvironmentSnapshot) -> String {
    format!(
        "health risks for temperature {}°C, AQI {}, UV index {}",
        env.temperature, env.aqi, env.uv_index
    )
}

fn explanation_prompt(env: &EnvironmentSnapshot, risk: &RiskVector, health: &HealthProfile) -> String {
    format!(
        "Based on the following environmental conditions and health risk scores, provide a clear, concise explanation:

Environment:
- Temperature: {temperature}°C
- Air Quality Index: {aqi}
- UV Index: {uv}
- Humidity: {humidity}%

Risk Scores:
- Overall: {overall}/100
- Heatwave: {heatwave}/100
- Air Quality: {air}/100
- UV Exposure: {uv_score}/100
- Disease: {disease}/100

User Profile:
- Age: {age}
- Health Conditions: {conditions}

Provide a 2-3 sentence explanation of the overall health risk and why certain factors are elevated. Be reassuring but informative.",
        temperature = env.temperature,
        aqi = env.aqi,
        uv = env.uv_index,
        humidity = env.humidity,
        overall = risk.overall,
        heatwave = risk.heatwave,
        air = risk.air_quality,
        uv_score = risk.uv_exposure,
        disease = risk.disease,
        age = health.age_summary(),
        conditions = health.conditions_summary(),
    )
}

/// Service that produces risk predictions.
#[derive(Clone)]
pub struct PredictionService {
    environment: EnvironmentProvider,
    evidence: Arc<dyn EvidenceStore>,
    generator: Arc<dyn TextGenerator>,
    cache: CacheClient,
    timeouts: OperationTimeoutConfig,
    offline: bool,
    llm_explanations: bool,
    evidence_k: usize,
}

impl PredictionService {
    /// Creates a new prediction service.
    #[must_use]
    pub fn new(
        environment: EnvironmentProvider,
        evidence: Arc<dyn EvidenceStore>,
        generator: Arc<dyn TextGenerator>,
        cache: CacheClient,
    ) -> Self {
        Self {
            environment,
            evidence,
            generator,
            cache,
            timeouts: OperationTimeoutConfig::default(),
            offline: false,
            llm_explanations: true,
            evidence_k: DEFAULT_EVIDENCE_K,
        }
    }

    /// Sets operation timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: OperationTimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Uses canned evidence instead of querying the store.
    #[must_use]
    pub const fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Enables or disables generated explanations.
    #[must_use]
    pub const fn with_llm_explanations(mut self, enabled: bool) -> Self {
        self.llm_explanations = enabled;
        self
    }

    /// Sets how many evidence hits to retrieve.
    #[must_use]
    pub const fn with_evidence_k(mut self, k: usize) -> Self {
        self.evidence_k = k;
        self
    }

    /// Returns the environment provider.
    #[must_use]
    pub const fn environment(&self) -> &EnvironmentProvider {
        &self.environment
    }

    /// Produces a prediction for a user at a location.
    ///
    /// With `environment` supplied, the lookup and the prediction cache are
    /// both skipped. Once a snapshot exists the call always succeeds;
    /// retrieval or explanation failures yield a degraded result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the user id is blank.
    #[tracing::instrument(
        skip(self, user, location, environment),
        fields(location = %location, user_id = %user.id, status = tracing::field::Empty)
    )]
    pub async fn predict(
        &self,
        user: &UserProfile,
        location: &Location,
        environment: Option<EnvironmentSnapshot>,
    ) -> Result<PredictionResult> {
        if user.id.trim().is_empty() {
            return Err(Error::InvalidInput("User id cannot be empty".to_string()));
        }
        let start = Instant::now();
        let key = cache_key(location, &user.id);
        let cacheable = environment.is_none();

        if cacheable {
            if let Some(cached) = self.cache.get_json::<PredictionResult>(&key).await {
                tracing::debug!("Prediction cache hit");
                tracing::Span::current().record("status", "cached");
                metrics::counter!("predictions_total", "status" => "cached").increment(1);
                return Ok(cached);
            }
        }

        let env = match environment {
            Some(env) => env,
            None => self.environment.resolve(location).await,
        };

        let risk_scores = score(&env, &user.health);
        let recommendations = recommend(&risk_scores);

        let (evidence, explanation, status) =
            match self.enrich(&env, &risk_scores, &user.health).await {
                Ok((evidence, explanation)) => (evidence, explanation, PredictionStatus::Complete),
                Err(e) => {
                    tracing::warn!(error = %e, "Prediction degraded");
                    metrics::counter!("predictions_degraded_total").increment(1);
                    (
                        canned_evidence(&risk_scores),
                        fallback_explanation(&env, &risk_scores),
                        PredictionStatus::Degraded {
                            reason: e.to_string(),
                        },
                    )
                },
            };

        let status_label = if status.is_degraded() { "degraded" } else { "complete" };
        tracing::Span::current().record("status", status_label);
        metrics::counter!("predictions_total", "status" => status_label).increment(1);
        metrics::histogram!("prediction_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        let result = PredictionResult {
            risk_scores,
            evidence,
            recommendations,
            explanation,
            environment: env,
            generated_at: Utc::now(),
            status,
        };

        if cacheable && !result.status.is_degraded() {
            self.cache.set_json(&key, &result).await;
        }

        tracing::info!(overall = result.risk_scores.overall, "Prediction complete");
        Ok(result)
    }

    /// Retrieves evidence and generates the explanation.
    async fn enrich(
        &self,
        env: &EnvironmentSnapshot,
        risk: &RiskVector,
        health: &HealthProfile,
    ) -> Result<(Vec<EvidenceHit>, String)> {
        let evidence = if self.offline {
            canned_evidence(risk)
        } else {
            with_timeout(
                "evidence_search",
                self.timeouts.get(OperationType::Evidence),
                self.evidence
                    .similarity_search(&evidence_query(env), self.evidence_k),
            )
            .await?
        };

        let explanation = if self.llm_explanations {
            let prompt = explanation_prompt(env, risk, health);
            with_timeout(
                "text_generation",
                self.timeouts.get(OperationType::TextGeneration),
                self.generator.complete_with_system(SYSTEM_PROMPT, &prompt),
            )
            .await?
        } else {
            fallback_explanation(env, risk)
        };

        Ok((evidence, explanation))
    }
}
