//! Business logic services.
//!
//! Services orchestrate the cache, environment provider, evidence store and
//! text generator into the operations exposed by the library and CLI.

mod assistant;
mod container;
mod evidence;
mod prediction;
mod stats;

pub use assistant::AssistantService;
pub use container::ServiceContainer;
pub use evidence::{ADDED_AT_KEY, EvidenceService};
pub use prediction::{
    PredictionService, cache_key as prediction_cache_key, canned_evidence, evidence_query,
    fallback_explanation,
};
pub use stats::{PredictionStats, Trend};
