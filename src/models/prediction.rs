//! Prediction results and assistant exchanges.

use super::{EnvironmentSnapshot, EvidenceHit, Recommendation, RiskVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a prediction ran the full pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PredictionStatus {
    /// Evidence and explanation came from their collaborators.
    #[default]
    Complete,
    /// A collaborator failed; evidence and explanation are canned.
    Degraded {
        /// What failed.
        reason: String,
    },
}

impl PredictionStatus {
    /// Returns true for degraded results.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// The composite output of a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Scored risk.
    pub risk_scores: RiskVector,
    /// Supporting evidence snippets.
    pub evidence: Vec<EvidenceHit>,
    /// Ordered precautions.
    pub recommendations: Vec<Recommendation>,
    /// Natural-language summary.
    pub explanation: String,
    /// The environment the scores were computed from.
    pub environment: EnvironmentSnapshot,
    /// When the result was assembled.
    pub generated_at: DateTime<Utc>,
    /// Full or degraded.
    #[serde(default)]
    pub status: PredictionStatus,
}

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The person asking.
    User,
    /// The assistant.
    Assistant,
}

impl ChatRole {
    /// Returns the role as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatTurn {
    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// An assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A shortened evidence reference attached to an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    /// Where the snippet comes from.
    pub source: String,
    /// Leading excerpt of the document.
    pub snippet: String,
}

/// The assistant's answer to a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Reply text.
    pub content: String,
    /// Up to two supporting snippets.
    pub evidence: Vec<EvidenceSnippet>,
    /// True when the reply is the canned fallback.
    #[serde(default)]
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_value(PredictionStatus::Degraded {
            reason: "llm timeout".to_string(),
        })
        .expect("serializes");
        assert_eq!(json["state"], "degraded");
        assert_eq!(json["reason"], "llm timeout");

        let json = serde_json::to_value(PredictionStatus::Complete).expect("serializes");
        assert_eq!(json["state"], "complete");
    }
}
