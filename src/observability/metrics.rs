//! Prometheus metrics.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_METRICS_PORT: u16 = 9090;

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether to install the recorder.
    pub enabled: bool,
    /// Address for the scrape listener.
    pub listen_addr: SocketAddr,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: Option<&MetricsSettings>) -> Self {
        Self::from_settings_with(settings, |key| std::env::var(key).ok())
    }

    /// Builds metrics configuration, reading overrides through `lookup`.
    #[must_use]
    pub fn from_settings_with(
        settings: Option<&MetricsSettings>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let enabled = lookup("CLIMARISK_METRICS_ENABLED")
            .map(|value| matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
            .or_else(|| settings.and_then(|config| config.enabled))
            .unwrap_or(false);
        let port = lookup("CLIMARISK_METRICS_PORT")
            .and_then(|value| value.trim().parse::<u16>().ok())
            .or_else(|| settings.and_then(|config| config.port))
            .unwrap_or(DEFAULT_METRICS_PORT);

        Self {
            enabled,
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        }
    }
}

/// Handle to the installed recorder.
#[derive(Debug, Clone)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
}

impl MetricsHandle {
    /// Renders the current metrics in the Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus.render()
    }
}

/// Installs the Prometheus recorder, with a scrape listener when `expose` is set.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the listener
/// cannot bind.
pub fn install_prometheus(config: &MetricsConfig, expose: bool) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let builder = PrometheusBuilder::new();
    let prometheus = if expose {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::failed("metrics_listener_spawn", e))?;
        let (recorder, exporter) = {
            let _guard = runtime.enter();
            builder
                .with_http_listener(config.listen_addr)
                .build()
                .map_err(|e| Error::failed("metrics_listener_build", e))?
        };
        let handle = recorder.handle();
        ::metrics::set_global_recorder(recorder)
            .map_err(|e| Error::failed("metrics_recorder_install", e))?;
        runtime.spawn(async move {
            if let Err(e) = exporter.await {
                tracing::warn!(error = ?e, "Metrics listener stopped");
            }
        });
        tracing::info!(addr = %config.listen_addr, "Serving Prometheus metrics");
        handle
    } else {
        builder
            .install_recorder()
            .map_err(|e| Error::failed("metrics_recorder_install", e))?
    };

    Ok(Some(MetricsHandle { prometheus }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let config = MetricsConfig::from_settings_with(None, |_| None);
        assert!(!config.enabled);
        assert_eq!(config.listen_addr.port(), 9090);
        assert!(install_prometheus(&config, false).expect("no-op").is_none());
    }

    #[test]
    fn test_env_overrides_settings() {
        let settings = MetricsSettings {
            enabled: Some(false),
            port: Some(9100),
        };
        let config = MetricsConfig::from_settings_with(Some(&settings), |key| match key {
            "CLIMARISK_METRICS_ENABLED" => Some("1".to_string()),
            _ => None,
        });
        assert!(config.enabled);
        assert_eq!(config.listen_addr.port(), 9100);
    }
}
