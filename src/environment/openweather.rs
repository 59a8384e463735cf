//! `OpenWeather` client.
//!
//! | Lookup | Endpoint | Field used |
//! |--------|----------|------------|
//! | weather | `/data/2.5/weather?q=` or `?lat=&lon=` | `main`, `wind`, `weather[0]`, `coord` |
//! | air quality | `/data/2.5/air_pollution?lat=&lon=` | `list[0].main.aqi` (1-5, scaled by 50) |
//! | UV | `/data/2.5/uvi?lat=&lon=` | `value` |

use super::source::{CurrentWeather, WeatherSource};
use crate::models::{Coordinates, Location};
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// `OpenWeather` reports AQI on a 1-5 scale.
const AQI_SCALE: u32 = 50;

/// `OpenWeather` HTTP client.
pub struct OpenWeatherClient {
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct WeatherResponse {
    coord: Coord,
    main: Main,
    wind: Wind,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Deserialize)]
struct Coord {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct Main {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Deserialize)]
struct Wind {
    #[serde(default)]
    speed: f64,
}

#[derive(Deserialize)]
struct Condition {
    description: String,
}

#[derive(Deserialize)]
struct AirPollutionResponse {
    list: Vec<AirPollutionEntry>,
}

#[derive(Deserialize)]
struct AirPollutionEntry {
    main: AirPollutionMain,
}

#[derive(Deserialize)]
struct AirPollutionMain {
    aqi: u32,
}

#[derive(Deserialize)]
struct UvResponse {
    value: f64,
}

impl OpenWeatherClient {
    /// Default API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openweathermap.org";

    /// Creates a client.
    #[must_use]
    pub fn new(api_key: SecretString, client: reqwest::Client) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key,
            client,
        }
    }

    /// Sets the API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .query(params)
            .query(&[
                ("appid", self.api_key.expose_secret()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| Error::failed(operation, e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::failed(
                operation,
                format!("API returned status: {status}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| Error::failed(operation, e.without_url()))
    }
}

fn coordinate_params(coordinates: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("lat", coordinates.lat.to_string()),
        ("lon", coordinates.lng.to_string()),
    ]
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    fn name(&self) -> &'static str {
        "openweather"
    }

    async fn current(&self, location: &Location) -> Result<CurrentWeather> {
        let params = match location {
            Location::City(city) => vec![("q", city.clone())],
            Location::Coordinates(c) => coordinate_params(*c),
        };
        let weather: WeatherResponse = self
            .fetch("weather_fetch", "/data/2.5/weather", &params)
            .await?;

        Ok(CurrentWeather {
            coordinates: Coordinates::new(weather.coord.lat, weather.coord.lon),
            temperature: weather.main.temp,
            humidity: weather.main.humidity,
            wind_speed: weather.wind.speed,
            pressure: weather.main.pressure,
            description: weather
                .weather
                .into_iter()
                .next()
                .map(|c| c.description)
                .unwrap_or_default(),
        })
    }

    async fn air_quality(&self, coordinates: Coordinates) -> Result<u32> {
        let response: AirPollutionResponse = self
            .fetch(
                "air_quality_fetch",
                "/data/2.5/air_pollution",
                &coordinate_params(coordinates),
            )
            .await?;
        response
            .list
            .first()
            .map(|entry| entry.main.aqi.saturating_mul(AQI_SCALE))
            .ok_or_else(|| Error::failed("air_quality_fetch", "empty pollution list"))
    }

    async fn uv_index(&self, coordinates: Coordinates) -> Result<f64> {
        let response: UvResponse = self
            .fetch("uv_fetch", "/data/2.5/uvi", &coordinate_params(coordinates))
            .await?;
        Ok(response.value)
    }
}
