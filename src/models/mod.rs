//! Data models for climarisk.
//!
//! This module contains the core data structures that flow through the
//! prediction pipeline. Everything here serializes as camelCase JSON, which is
//! the format written to the cache and to the evidence corpus file.

mod environment;
mod evidence;
mod health;
mod prediction;
mod recommendation;
mod risk;

pub use environment::{Coordinates, EnvironmentSnapshot, EnvironmentSource, Location};
pub use evidence::{
    EvidenceDocument, EvidenceHit, NewDocument, SOURCE_KEY, UNKNOWN_SOURCE, source_of,
};
pub use health::{HealthProfile, UserProfile};
pub use prediction::{
    ChatReply, ChatRole, ChatTurn, EvidenceSnippet, PredictionResult, PredictionStatus,
};
pub use recommendation::{Priority, Recommendation, RecommendationCategory};
pub use risk::{RiskFactor, RiskVector};
