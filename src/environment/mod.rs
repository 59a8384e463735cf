//! Environment data provider.
//!
//! Resolves a location to an [`EnvironmentSnapshot`] with cache-aside over
//! an optional live [`WeatherSource`]:
//!
//! 1. `weather:<location>` cache hit returns immediately.
//! 2. Live mode fetches weather, then AQI and UV as two independent calls.
//!    AQI failure falls back to 50 and UV failure to 5.0.
//! 3. Offline mode, or a failed weather call, uses the baseline table.
//! 4. Whatever was resolved is cached for the configured TTL.
//!
//! Each external call is attempted once under its own deadline.

mod baseline;
mod openweather;
mod source;

pub use baseline::{
    CityBaseline, DEFAULT_BASELINE_CITY, baseline_for, baseline_snapshot, resolve_baseline,
};
pub use openweather::OpenWeatherClient;
pub use source::{CurrentWeather, WeatherSource};

use crate::cache::CacheClient;
use crate::config::{OperationTimeoutConfig, OperationType};
use crate::models::{EnvironmentSnapshot, EnvironmentSource, Location};
use crate::with_timeout;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// AQI used when the air-quality lookup fails.
pub const DEFAULT_AQI: u32 = 50;

/// UV index used when the UV lookup fails.
pub const DEFAULT_UV_INDEX: f64 = 5.0;

/// Returns the cache key for a location's snapshot.
#[must_use]
pub fn cache_key(location: &Location) -> String {
    format!("weather:{}", location.key())
}

/// Resolves current conditions for a location.
#[derive(Clone)]
pub struct EnvironmentProvider {
    source: Option<Arc<dyn WeatherSource>>,
    cache: CacheClient,
    timeouts: OperationTimeoutConfig,
}

impl std::fmt::Debug for EnvironmentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentProvider")
            .field("source", &self.source.as_ref().map(|s| s.name()))
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl EnvironmentProvider {
    /// Creates a provider backed by a live source.
    #[must_use]
    pub fn new(source: Arc<dyn WeatherSource>, cache: CacheClient) -> Self {
        Self {
            source: Some(source),
            cache,
            timeouts: OperationTimeoutConfig::default(),
        }
    }

    /// Creates a provider that only uses the baseline table.
    #[must_use]
    pub fn offline(cache: CacheClient) -> Self {
        Self {
            source: None,
            cache,
            timeouts: OperationTimeoutConfig::default(),
        }
    }

    /// Sets the per-operation timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: OperationTimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Returns true when no live source is configured.
    #[must_use]
    pub const fn is_offline(&self) -> bool {
        self.source.is_none()
    }

    /// Resolves the snapshot for `location`. Never fails.
    #[tracing::instrument(skip(self, location), fields(location = %location))]
    pub async fn resolve(&self, location: &Location) -> EnvironmentSnapshot {
        let key = cache_key(location);
        if let Some(snapshot) = self.cache.get_json::<EnvironmentSnapshot>(&key).await {
            tracing::debug!(key, "Returning cached environment snapshot");
            return snapshot;
        }

        let snapshot = match self.source.as_ref() {
            None => {
                tracing::debug!("Using offline environment baseline");
                baseline_snapshot(location, EnvironmentSource::Offline)
            },
            Some(source) => self.fetch_live(source.as_ref(), location).await,
        };

        self.cache.set_json(&key, &snapshot).await;
        snapshot
    }

    async fn fetch_live(&self, source: &dyn WeatherSource, location: &Location) -> EnvironmentSnapshot {
        let start = Instant::now();
        let weather = with_timeout(
            "weather_fetch",
            self.timeouts.get(OperationType::Weather),
            source.current(location),
        )
        .await;

        let weather = match weather {
            Ok(weather) => weather,
            Err(e) => {
                record(source.name(), "weather", "error", start);
                tracing::warn!(error = %e, "Weather lookup failed, using baseline");
                return baseline_snapshot(location, EnvironmentSource::Fallback);
            },
        };
        record(source.name(), "weather", "success", start);

        let coordinates = weather.coordinates;
        let (aqi, uv_index) = tokio::join!(
            with_timeout(
                "air_quality_fetch",
                self.timeouts.get(OperationType::AirQuality),
                source.air_quality(coordinates),
            ),
            with_timeout(
                "uv_fetch",
                self.timeouts.get(OperationType::UvIndex),
                source.uv_index(coordinates),
            ),
        );

        let aqi = aqi.unwrap_or_else(|e| {
            record(source.name(), "air_quality", "error", start);
            tracing::warn!(error = %e, default = DEFAULT_AQI, "AQI lookup failed, using default");
            DEFAULT_AQI
        });
        let uv_index = uv_index.unwrap_or_else(|e| {
            record(source.name(), "uv_index", "error", start);
            tracing::warn!(error = %e, default = DEFAULT_UV_INDEX, "UV lookup failed, using default");
            DEFAULT_UV_INDEX
        });

        tracing::info!(
            temperature = weather.temperature,
            aqi,
            uv_index,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Fetched live environment data"
        );

        EnvironmentSnapshot {
            temperature: weather.temperature,
            humidity: weather.humidity,
            aqi,
            uv_index,
            wind_speed: weather.wind_speed,
            pressure: weather.pressure,
            description: weather.description,
            timestamp: Utc::now(),
            source: EnvironmentSource::Live,
        }
    }
}

fn record(source: &'static str, lookup: &'static str, status: &'static str, start: Instant) {
    metrics::counter!(
        "environment_lookups_total",
        "source" => source,
        "lookup" => lookup,
        "status" => status
    )
    .increment(1);
    metrics::histogram!("environment_lookup_duration_ms", "source" => source)
        .record(start.elapsed().as_secs_f64() * 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::models::Coordinates;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeSource {
        fail_weather: bool,
        fail_aqi: bool,
        fail_uv: bool,
        weather_calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn current(&self, _location: &Location) -> Result<CurrentWeather> {
            self.weather_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_weather {
                return Err(Error::failed("weather_fetch", "503"));
            }
            Ok(CurrentWeather {
                coordinates: Coordinates::new(18.5, 73.8),
                temperature: 41.5,
                humidity: 20.0,
                wind_speed: 4.0,
                pressure: 1002.0,
                description: "clear sky".to_string(),
            })
        }

        async fn air_quality(&self, _coordinates: Coordinates) -> Result<u32> {
            if self.fail_aqi {
                return Err(Error::failed("air_quality_fetch", "503"));
            }
            Ok(200)
        }

        async fn uv_index(&self, _coordinates: Coordinates) -> Result<f64> {
            if self.fail_uv {
                return Err(Error::failed("uv_fetch", "503"));
            }
            Ok(11.2)
        }
    }

    fn memory_cache() -> CacheClient {
        CacheClient::new(Arc::new(MemoryCache::new()), Duration::from_secs(1))
    }

    fn pune() -> Location {
        Location::City("Pune".to_string())
    }

    #[test]
    fn test_cache_keys() {
        assert_eq!(cache_key(&pune()), "weather:Pune");
        assert_eq!(
            cache_key(&Location::Coordinates(Coordinates::new(18.5, 73.8))),
            "weather:18.5,73.8"
        );
    }

    #[tokio::test]
    async fn test_live_lookup() {
        let provider = EnvironmentProvider::new(Arc::new(FakeSource::default()), memory_cache());
        let snapshot = provider.resolve(&pune()).await;
        assert_eq!(snapshot.source, EnvironmentSource::Live);
        assert!((snapshot.temperature - 41.5).abs() < f64::EPSILON);
        assert_eq!(snapshot.aqi, 200);
        assert!((snapshot.uv_index - 11.2).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_partial_failures_use_defaults() {
        let source = FakeSource {
            fail_aqi: true,
            fail_uv: true,
            ..FakeSource::default()
        };
        let provider = EnvironmentProvider::new(Arc::new(source), memory_cache());
        let snapshot = provider.resolve(&pune()).await;
        assert_eq!(snapshot.source, EnvironmentSource::Live);
        assert_eq!(snapshot.aqi, DEFAULT_AQI);
        assert!((snapshot.uv_index - DEFAULT_UV_INDEX).abs() < f64::EPSILON);
        assert!((snapshot.temperature - 41.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_weather_failure_falls_back_to_baseline() {
        let source = FakeSource {
            fail_weather: true,
            ..FakeSource::default()
        };
        let provider = EnvironmentProvider::new(Arc::new(source), memory_cache());
        let snapshot = provider.resolve(&Location::City("Delhi".to_string())).await;
        assert_eq!(snapshot.source, EnvironmentSource::Fallback);
        assert_eq!(snapshot.aqi, 180);
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let source = Arc::new(FakeSource::default());
        let provider = EnvironmentProvider::new(source.clone(), memory_cache());
        let first = provider.resolve(&pune()).await;
        let second = provider.resolve(&pune()).await;
        assert_eq!(first, second);
        assert_eq!(source.weather_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_is_cached() {
        let source = Arc::new(FakeSource {
            fail_weather: true,
            ..FakeSource::default()
        });
        let provider = EnvironmentProvider::new(source.clone(), memory_cache());
        provider.resolve(&pune()).await;
        provider.resolve(&pune()).await;
        assert_eq!(source.weather_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_offline_without_cache() {
        let provider = EnvironmentProvider::offline(CacheClient::disabled());
        let snapshot = provider.resolve(&Location::City("Gotham".to_string())).await;
        assert_eq!(snapshot.source, EnvironmentSource::Offline);
        assert!((snapshot.temperature - 28.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.aqi, 85);
    }

    #[tokio::test]
    async fn test_slow_source_times_out_to_baseline() {
        struct SlowSource;

        #[async_trait]
        impl WeatherSource for SlowSource {
            fn name(&self) -> &'static str {
                "slow"
            }

            async fn current(&self, _location: &Location) -> Result<CurrentWeather> {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Err(Error::failed("weather_fetch", "unreachable"))
            }

            async fn air_quality(&self, _coordinates: Coordinates) -> Result<u32> {
                Ok(0)
            }

            async fn uv_index(&self, _coordinates: Coordinates) -> Result<f64> {
                Ok(0.0)
            }
        }

        let provider = EnvironmentProvider::new(Arc::new(SlowSource), CacheClient::disabled())
            .with_timeouts(OperationTimeoutConfig::default().with(OperationType::Weather, 20));
        let snapshot = provider.resolve(&pune()).await;
        assert_eq!(snapshot.source, EnvironmentSource::Fallback);
    }
}
