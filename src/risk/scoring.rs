//! Threshold-based risk scoring.

// Scores are rounded and clamped to [0, 100] before narrowing.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::models::{EnvironmentSnapshot, HealthProfile, RiskVector};

/// Multiplier for people with at least one comorbidity.
const COMORBIDITY_MULTIPLIER: f64 = 1.3;

/// Multiplier for children and the elderly without comorbidities.
const AGE_MULTIPLIER: f64 = 1.2;

/// Ages strictly below this are treated as children.
const CHILD_AGE_LIMIT: u32 = 12;

/// Ages strictly above this are treated as elderly.
const ELDERLY_AGE_LIMIT: u32 = 65;

fn heatwave_base(temperature: f64) -> f64 {
    if temperature > 40.0 {
        90.0
    } else if temperature > 35.0 {
        70.0
    } else if temperature > 30.0 {
        50.0
    } else {
        20.0
    }
}

fn air_quality_base(aqi: u32) -> f64 {
    match aqi {
        301.. => 95.0,
        201..=300 => 80.0,
        101..=200 => 60.0,
        51..=100 => 30.0,
        _ => 10.0,
    }
}

fn uv_exposure_base(uv_index: f64) -> f64 {
    if uv_index > 10.0 {
        90.0
    } else if uv_index > 7.0 {
        70.0
    } else if uv_index > 5.0 {
        50.0
    } else {
        20.0
    }
}

fn disease_base(temperature: f64, humidity: f64, aqi: u32) -> f64 {
    let heat = if temperature > 30.0 { 40.0 } else { 20.0 };
    let damp = if humidity > 70.0 { 30.0 } else { 10.0 };
    let smog = if aqi > 100 { 30.0 } else { 10.0 };
    heat + damp + smog
}

/// Returns the sensitivity multiplier for a health profile.
///
/// Comorbidities are checked first; the age bands only apply to profiles
/// without any. A missing age never triggers the age band.
#[must_use]
pub fn vulnerability_multiplier(health: &HealthProfile) -> f64 {
    if !health.comorbidities.is_empty() {
        return COMORBIDITY_MULTIPLIER;
    }
    match health.age {
        Some(age) if age < CHILD_AGE_LIMIT || age > ELDERLY_AGE_LIMIT => AGE_MULTIPLIER,
        _ => 1.0,
    }
}

fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Scores an environment for a specific person.
///
/// Heatwave, air quality and disease scores are scaled by
/// [`vulnerability_multiplier`] and capped at 100; UV exposure is not scaled.
#[must_use]
pub fn score(env: &EnvironmentSnapshot, health: &HealthProfile) -> RiskVector {
    let multiplier = vulnerability_multiplier(health);

    let heatwave = (heatwave_base(env.temperature) * multiplier).min(100.0);
    let air_quality = (air_quality_base(env.aqi) * multiplier).min(100.0);
    let uv_exposure = uv_exposure_base(env.uv_index);
    let disease = (disease_base(env.temperature, env.humidity, env.aqi) * multiplier).min(100.0);

    RiskVector::from_factors(
        to_score(heatwave),
        to_score(air_quality),
        to_score(uv_exposure),
        to_score(disease),
    )
}
