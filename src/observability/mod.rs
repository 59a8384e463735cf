//! Observability and telemetry.
//!
//! One-shot process setup for structured logs (`tracing-subscriber`),
//! optional OTLP span export and an optional Prometheus recorder.

mod logging;
mod metrics;
mod otlp;
mod tracing;

pub use logging::{LogFormat, LoggingConfig};
pub use metrics::{MetricsConfig, MetricsHandle, install_prometheus};
pub use otlp::{OtlpConfig, OtlpProtocol};
pub use tracing::{TracingConfig, TracingInit, build_tracing};

use crate::config::ObservabilitySettings;
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Full observability configuration.
#[derive(Debug)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Tracing configuration.
    pub tracing: TracingConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
    /// Whether to expose metrics via HTTP listener.
    pub metrics_expose: bool,
}

/// Options supplied by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Whether verbose output was requested.
    pub verbose: bool,
    /// Whether to expose metrics via HTTP listener.
    pub metrics_expose: bool,
}

/// Handle for observability runtime components.
pub struct ObservabilityHandle {
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
    metrics_handle: Option<MetricsHandle>,
}

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

impl ObservabilityHandle {
    /// Returns the metrics handle when a recorder was installed.
    #[must_use]
    pub const fn metrics(&self) -> Option<&MetricsHandle> {
        self.metrics_handle.as_ref()
    }

    /// Flushes and shuts down span export.
    pub fn shutdown(&mut self) {
        let _ = self.metrics_handle.take();
        let Some(provider) = self.tracer_provider.take() else {
            return;
        };
        let flush = || {
            let _ = provider.force_flush();
            let _ = provider.shutdown();
        };
        // The batch exporter blocks while flushing.
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::task::block_in_place(flush);
        } else {
            flush();
        }
    }
}

impl Drop for ObservabilityHandle {
    fn drop(&mut self) {
        if self.tracer_provider.is_some() {
            self.shutdown();
        }
    }
}

/// Initializes observability from config settings with env overrides.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if any
/// telemetry component fails to initialize.
pub fn init_from_config(
    settings: &ObservabilitySettings,
    options: InitOptions,
) -> Result<ObservabilityHandle> {
    init(build_config(settings, options))
}

fn build_config(settings: &ObservabilitySettings, options: InitOptions) -> ObservabilityConfig {
    ObservabilityConfig {
        logging: LoggingConfig::from_settings(settings.logging.as_ref(), options.verbose),
        tracing: TracingConfig::from_settings(settings.tracing.as_ref()),
        metrics: MetricsConfig::from_settings(settings.metrics.as_ref()),
        metrics_expose: options.metrics_expose,
    }
}

/// Initializes logging, tracing, and metrics for the process.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if any
/// telemetry component fails to initialize.
pub fn init(config: ObservabilityConfig) -> Result<ObservabilityHandle> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::failed(
            "observability_init",
            "observability already initialized",
        ));
    }

    let metrics_handle = install_prometheus(&config.metrics, config.metrics_expose)?;

    let (tracing_layer, tracer_provider) = match build_tracing(&config.tracing)? {
        Some(init) => (Some(init.layer), Some(init.provider)),
        None => (None, None),
    };

    let to_file = config.logging.file.is_some();
    let writer = match &config.logging.file {
        Some(path) => BoxMakeWriter::new(open_log_file(path)?),
        None => BoxMakeWriter::new(io::stderr),
    };

    let registry = tracing_subscriber::registry().with(tracing_layer);
    match config.logging.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
            )
            .with(config.logging.filter)
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(writer)
                    .with_ansi(!to_file)
                    .with_target(true),
            )
            .with(config.logging.filter)
            .try_init(),
    }
    .map_err(|e| Error::failed("observability_init", e))?;

    OBSERVABILITY_INIT.set(()).map_err(|()| {
        Error::failed(
            "observability_init",
            "failed to mark observability initialized",
        )
    })?;

    Ok(ObservabilityHandle {
        tracer_provider,
        metrics_handle,
    })
}

/// Thread-safe file writer for logging.
#[derive(Clone)]
struct LogFileWriter {
    file: Arc<Mutex<File>>,
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Opens a log file for appending, creating parent directories.
fn open_log_file(path: &Path) -> Result<LogFileWriter> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::failed("create_log_dir", e))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::failed("open_log_file", format!("{}: {e}", path.display())))?;

    Ok(LogFileWriter {
        file: Arc::new(Mutex::new(file)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_writer_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("climarisk.log");

        let mut writer = open_log_file(&path).expect("opens");
        writer.write_all(b"first\n").expect("writes");
        let mut again = open_log_file(&path).expect("reopens");
        again.write_all(b"second\n").expect("writes");
        again.flush().expect("flushes");

        let contents = std::fs::read_to_string(&path).expect("reads");
        assert_eq!(contents, "first\nsecond\n");
    }
}
