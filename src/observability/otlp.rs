//! OTLP exporter configuration.

use crate::config::TracingSettings;

/// OTLP transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtlpProtocol {
    /// gRPC transport (4317 default).
    Grpc,
    /// HTTP/protobuf transport (4318 default).
    Http,
}

impl OtlpProtocol {
    /// Parses a protocol name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "grpc" => Some(Self::Grpc),
            "http" | "http/protobuf" | "http_binary" | "http-binary" => Some(Self::Http),
            _ => None,
        }
    }
}

/// OTLP exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtlpConfig {
    /// Collector endpoint URL.
    pub endpoint: Option<String>,
    /// Transport protocol.
    pub protocol: OtlpProtocol,
}

impl OtlpConfig {
    /// Builds OTLP configuration from config settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: Option<&TracingSettings>) -> Self {
        Self::from_settings_with(settings, |key| std::env::var(key).ok())
    }

    /// Builds OTLP configuration, reading overrides through `lookup`.
    #[must_use]
    pub fn from_settings_with(
        settings: Option<&TracingSettings>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let explicit = settings
            .and_then(|config| config.protocol.as_deref())
            .and_then(OtlpProtocol::parse);
        let mut endpoint = settings.and_then(|config| config.endpoint.clone());

        let endpoint_override = endpoint_from(&lookup);
        let overridden = endpoint_override.is_some();
        if overridden {
            endpoint = endpoint_override;
        }

        let protocol = lookup("CLIMARISK_OTLP_PROTOCOL")
            .or_else(|| lookup("OTEL_EXPORTER_OTLP_PROTOCOL"))
            .and_then(|value| OtlpProtocol::parse(&value))
            .or(explicit)
            .unwrap_or_else(|| protocol_from_endpoint(endpoint.as_deref()));

        Self { endpoint, protocol }
    }
}

/// Reads the collector endpoint from the environment.
pub(super) fn endpoint_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    lookup("CLIMARISK_OTLP_ENDPOINT")
        .or_else(|| lookup("OTEL_EXPORTER_OTLP_ENDPOINT"))
        .filter(|value| !value.trim().is_empty())
}

fn protocol_from_endpoint(endpoint: Option<&str>) -> OtlpProtocol {
    match endpoint {
        Some(endpoint) if endpoint.contains(":4317") => OtlpProtocol::Grpc,
        _ => OtlpProtocol::Http,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key| map.get(key).map(ToString::to_string)
    }

    #[test]
    fn test_protocol_inferred_from_grpc_port() {
        let config = OtlpConfig::from_settings_with(
            None,
            lookup(&[("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317")]),
        );
        assert_eq!(config.protocol, OtlpProtocol::Grpc);
        assert_eq!(config.endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_prefixed_endpoint_wins() {
        let config = OtlpConfig::from_settings_with(
            None,
            lookup(&[
                ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://a:4317"),
                ("CLIMARISK_OTLP_ENDPOINT", "http://b:4318"),
            ]),
        );
        assert_eq!(config.endpoint.as_deref(), Some("http://b:4318"));
        assert_eq!(config.protocol, OtlpProtocol::Http);
    }

    #[test]
    fn test_settings_protocol_respected() {
        let settings = TracingSettings {
            endpoint: Some("http://collector:4317".to_string()),
            protocol: Some("http".to_string()),
            ..TracingSettings::default()
        };
        let config = OtlpConfig::from_settings_with(Some(&settings), lookup(&[]));
        assert_eq!(config.protocol, OtlpProtocol::Http);
    }
}
