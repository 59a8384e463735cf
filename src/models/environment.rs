//! Environment snapshots and location hints.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an [`EnvironmentSnapshot`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentSource {
    /// Fetched from the live weather source.
    #[default]
    Live,
    /// Synthesized from the baseline table because live lookups are disabled.
    Offline,
    /// Synthesized from the baseline table after the live source failed.
    Fallback,
}

impl EnvironmentSource {
    /// Returns the source as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Offline => "offline",
            Self::Fallback => "fallback",
        }
    }
}

/// Current weather and pollution metrics for a location.
///
/// Snapshots are immutable. A refresh produces a new snapshot rather than
/// mutating a cached one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity, 0-100.
    pub humidity: f64,
    /// Air quality index, 0-500+ (higher is worse).
    pub aqi: u32,
    /// UV index, typically 0-15.
    pub uv_index: f64,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Barometric pressure in hPa.
    pub pressure: f64,
    /// Human-readable condition, e.g. "Partly cloudy".
    pub description: String,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Provenance of the values.
    #[serde(default)]
    pub source: EnvironmentSource,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// The location an environment lookup is keyed by.
///
/// Exactly one discriminator determines the lookup. Use
/// [`Location::resolve`] to build one from optional caller input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    /// A named city.
    City(String),
    /// A coordinate pair.
    Coordinates(Coordinates),
}

impl Location {
    /// Picks the lookup discriminator from optional caller input.
    ///
    /// A non-blank city wins over coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when neither a city nor finite
    /// coordinates are supplied.
    pub fn resolve(city: Option<&str>, coordinates: Option<Coordinates>) -> Result<Self> {
        if let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) {
            return Ok(Self::City(city.to_string()));
        }
        match coordinates {
            Some(c) if c.lat.is_finite() && c.lng.is_finite() => Ok(Self::Coordinates(c)),
            Some(_) => Err(Error::InvalidInput(
                "coordinates must be finite numbers".to_string(),
            )),
            None => Err(Error::InvalidInput(
                "either a city or coordinates must be provided".to_string(),
            )),
        }
    }

    /// Returns the city name, if this is a city lookup.
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        match self {
            Self::City(name) => Some(name),
            Self::Coordinates(_) => None,
        }
    }

    /// Returns the stable key fragment used in cache keys.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::City(name) => name.clone(),
            Self::Coordinates(c) => format!("{},{}", c.lat, c.lng),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::City(name) => f.write_str(name),
            Self::Coordinates(c) => write!(f, "({}, {})", c.lat, c.lng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_city() {
        let loc = Location::resolve(Some("Pune"), Some(Coordinates::new(1.0, 2.0)));
        assert_eq!(loc.ok(), Some(Location::City("Pune".to_string())));
    }

    #[test]
    fn test_resolve_blank_city_uses_coordinates() {
        let loc = Location::resolve(Some("  "), Some(Coordinates::new(18.5, 73.8)));
        assert_eq!(
            loc.ok(),
            Some(Location::Coordinates(Coordinates::new(18.5, 73.8)))
        );
    }

    #[test]
    fn test_resolve_nothing_is_invalid_input() {
        assert!(matches!(
            Location::resolve(None, None),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            Location::resolve(None, Some(Coordinates::new(f64::NAN, 1.0))),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_location_key() {
        assert_eq!(Location::City("Delhi".to_string()).key(), "Delhi");
        assert_eq!(
            Location::Coordinates(Coordinates::new(28.6, 77.2)).key(),
            "28.6,77.2"
        );
    }

    #[test]
    fn test_snapshot_source_defaults_to_live() {
        let json = r#"{
            "temperature": 30.5, "humidity": 60, "aqi": 90, "uvIndex": 6.2,
            "windSpeed": 3.1, "pressure": 1008, "description": "haze",
            "timestamp": "2025-05-01T10:00:00Z"
        }"#;
        let snapshot: EnvironmentSnapshot = serde_json::from_str(json).expect("fixture parses");
        assert_eq!(snapshot.source, EnvironmentSource::Live);
        assert_eq!(snapshot.aqi, 90);
    }
}
