//! Recommended precautions.

use serde::{Deserialize, Serialize};

/// Urgency of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Informational.
    Low,
    /// Worth acting on.
    Medium,
    /// Act today.
    High,
    /// Act now.
    Critical,
}

impl Priority {
    /// Returns the priority as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// The concern a recommendation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationCategory {
    /// Heat stress precautions.
    #[serde(rename = "Heat Protection")]
    HeatProtection,
    /// Air pollution precautions.
    #[serde(rename = "Air Quality")]
    AirQuality,
    /// Sun protection.
    #[serde(rename = "UV Protection")]
    UvProtection,
    /// Hygiene and infection avoidance.
    #[serde(rename = "Disease Prevention")]
    DiseasePrevention,
    /// Emission-reducing habits.
    #[serde(rename = "Sustainable Living")]
    SustainableLiving,
}

impl RecommendationCategory {
    /// Returns the display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::HeatProtection => "Heat Protection",
            Self::AirQuality => "Air Quality",
            Self::UvProtection => "UV Protection",
            Self::DiseasePrevention => "Disease Prevention",
            Self::SustainableLiving => "Sustainable Living",
        }
    }
}

/// A single precaution with its urgency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// What the action addresses.
    pub category: RecommendationCategory,
    /// What to do.
    pub action: String,
    /// How urgent it is.
    pub priority: Priority,
}

impl Recommendation {
    /// Creates a recommendation.
    #[must_use]
    pub fn new(category: RecommendationCategory, action: impl Into<String>, priority: Priority) -> Self {
        Self {
            category,
            action: action.into(),
            priority,
        }
    }
}
