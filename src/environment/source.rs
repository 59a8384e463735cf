//! External weather source contract.

use crate::Result;
use crate::models::{Coordinates, Location};
use async_trait::async_trait;

/// Current conditions as reported by a weather source.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    /// Where the reading was taken; used for the AQI and UV lookups.
    pub coordinates: Coordinates,
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity.
    pub humidity: f64,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Pressure in hPa.
    pub pressure: f64,
    /// Condition text.
    pub description: String,
}

/// A weather, air-quality and UV data source.
///
/// The three calls are independent: the provider treats AQI and UV failures
/// as partial and substitutes defaults.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Source name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Fetches current weather for a city or coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    async fn current(&self, location: &Location) -> Result<CurrentWeather>;

    /// Fetches the air quality index on a 0-500 scale.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    async fn air_quality(&self, coordinates: Coordinates) -> Result<u32>;

    /// Fetches the UV index.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    async fn uv_index(&self, coordinates: Coordinates) -> Result<f64>;
}
