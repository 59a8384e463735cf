//! Rule-based precautions derived from a risk vector.

use crate::models::{Priority, Recommendation, RecommendationCategory, RiskVector};

const HEAT_CRITICAL: &str =
    "Avoid outdoor activities between 11 AM - 4 PM. Stay hydrated and wear light clothing.";
const HEAT_HIGH: &str = "Limit outdoor exposure during peak hours. Drink plenty of water.";
const AIR_CRITICAL: &str =
    "Wear N95 mask outdoors. Keep windows closed. Use air purifier indoors.";
const AIR_HIGH: &str =
    "Sensitive groups should limit outdoor activities. Consider wearing a mask.";
const UV_HIGH: &str =
    "Apply SPF 50+ sunscreen every 2 hours. Wear sunglasses and protective clothing.";
const DISEASE_MEDIUM: &str =
    "Maintain hygiene. Avoid crowded places. Consult doctor if symptoms appear.";
const SUSTAINABLE_LOW: &str =
    "Use public transport or carpool to reduce emissions and improve air quality.";

/// Picks the critical or high variant for a two-tier factor.
fn tiered(score: u8, critical: &'static str, high: &'static str) -> Option<(&'static str, Priority)> {
    if score > 70 {
        Some((critical, Priority::Critical))
    } else if score > 50 {
        Some((high, Priority::High))
    } else {
        None
    }
}

/// Builds the ordered recommendation list for a risk vector.
///
/// Rules are evaluated independently in the order heat, air quality, UV,
/// disease, sustainability. The list is not re-sorted by priority and always
/// ends with the sustainable-living entry.
#[must_use]
pub fn recommend(risk: &RiskVector) -> Vec<Recommendation> {
    let mut out = Vec::with_capacity(5);

    if let Some((action, priority)) = tiered(risk.heatwave, HEAT_CRITICAL, HEAT_HIGH) {
        out.push(Recommendation::new(
            RecommendationCategory::HeatProtection,
            action,
            priority,
        ));
    }

    if let Some((action, priority)) = tiered(risk.air_quality, AIR_CRITICAL, AIR_HIGH) {
        out.push(Recommendation::new(
            RecommendationCategory::AirQuality,
            action,
            priority,
        ));
    }

    if risk.uv_exposure > 70 {
        out.push(Recommendation::new(
            RecommendationCategory::UvProtection,
            UV_HIGH,
            Priority::High,
        ));
    }

    if risk.disease > 60 {
        out.push(Recommendation::new(
            RecommendationCategory::DiseasePrevention,
            DISEASE_MEDIUM,
            Priority::Medium,
        ));
    }

    out.push(Recommendation::new(
        RecommendationCategory::SustainableLiving,
        SUSTAINABLE_LOW,
        Priority::Low,
    ));

    out
}
