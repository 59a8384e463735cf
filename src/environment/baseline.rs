//! Fixed per-city baselines used when live lookups are unavailable.

use crate::models::{EnvironmentSnapshot, EnvironmentSource, Location};
use chrono::Utc;

/// City whose values stand in for unknown cities and coordinate lookups.
pub const DEFAULT_BASELINE_CITY: &str = "Pune";

const HUMIDITY: f64 = 65.0;
const WIND_SPEED: f64 = 12.0;
const PRESSURE: f64 = 1013.0;
const DESCRIPTION: &str = "Partly cloudy";

/// Per-city temperature, AQI and UV values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityBaseline {
    /// City name.
    pub city: &'static str,
    /// Temperature in °C.
    pub temperature: f64,
    /// Air quality index.
    pub aqi: u32,
    /// UV index.
    pub uv_index: f64,
}

const BASELINES: [CityBaseline; 4] = [
    CityBaseline {
        city: "Pune",
        temperature: 28.0,
        aqi: 85,
        uv_index: 7.0,
    },
    CityBaseline {
        city: "Mumbai",
        temperature: 32.0,
        aqi: 120,
        uv_index: 9.0,
    },
    CityBaseline {
        city: "Delhi",
        temperature: 35.0,
        aqi: 180,
        uv_index: 10.0,
    },
    CityBaseline {
        city: "Bangalore",
        temperature: 26.0,
        aqi: 65,
        uv_index: 6.0,
    },
];

/// Looks up a city's baseline, ignoring case and surrounding whitespace.
#[must_use]
pub fn baseline_for(city: &str) -> Option<&'static CityBaseline> {
    let city = city.trim();
    BASELINES.iter().find(|b| b.city.eq_ignore_ascii_case(city))
}

/// Returns the baseline used for `location`.
///
/// Unknown cities and coordinate lookups use [`DEFAULT_BASELINE_CITY`] and
/// log a warning.
#[must_use]
pub fn resolve_baseline(location: &Location) -> &'static CityBaseline {
    if let Some(baseline) = location.city().and_then(baseline_for) {
        return baseline;
    }
    tracing::warn!(
        location = %location,
        baseline = DEFAULT_BASELINE_CITY,
        "No baseline for location, substituting default city"
    );
    &BASELINES[0]
}

/// Synthesizes a snapshot from the baseline table.
#[must_use]
pub fn baseline_snapshot(location: &Location, source: EnvironmentSource) -> EnvironmentSnapshot {
    let baseline = resolve_baseline(location);
    EnvironmentSnapshot {
        temperature: baseline.temperature,
        humidity: HUMIDITY,
        aqi: baseline.aqi,
        uv_index: baseline.uv_index,
        wind_speed: WIND_SPEED,
        pressure: PRESSURE,
        description: DESCRIPTION.to_string(),
        timestamp: Utc::now(),
        source,
    }
}
