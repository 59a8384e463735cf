//! Binary entry point for climarisk.
//!
//! Command-line access to predictions, environment lookups, evidence search
//! and ingestion, and the assistant. Every command prints JSON to stdout.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use climarisk::config::ClimariskConfig;
use climarisk::models::{ChatTurn, Coordinates, EnvironmentSnapshot, RiskVector};
use climarisk::observability::{self, InitOptions};
use climarisk::{
    HealthProfile, Location, NewDocument, PredictionStats, ServiceContainer, UserProfile,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// climarisk - Climate-driven health risk scoring.
#[derive(Parser)]
#[command(name = "climarisk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Skip all external weather and text-generation calls.
    #[arg(long, global = true)]
    offline: bool,

    /// Serve Prometheus metrics while the command runs.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where to look up conditions.
#[derive(Args)]
struct LocationArgs {
    /// City name.
    #[arg(long)]
    city: Option<String>,

    /// Latitude, used with --lng when no city is given.
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,
}

impl LocationArgs {
    fn resolve(&self) -> Result<Location> {
        let coordinates = self.lat.zip(self.lng).map(|(lat, lng)| Coordinates::new(lat, lng));
        Ok(Location::resolve(self.city.as_deref(), coordinates)?)
    }
}

/// Who the prediction is for.
#[derive(Args)]
struct ProfileArgs {
    /// User identifier, used in cache keys.
    #[arg(long, default_value = "anonymous")]
    user_id: String,

    /// Age in years.
    #[arg(long)]
    age: Option<u32>,

    /// Chronic condition (repeatable).
    #[arg(long = "comorbidity")]
    comorbidities: Vec<String>,
}

impl ProfileArgs {
    fn profile(&self, city: Option<&str>) -> UserProfile {
        let mut health = HealthProfile::new();
        health.age = self.age;
        for tag in &self.comorbidities {
            health = health.with_comorbidity(tag.as_str());
        }
        let user = UserProfile::new(self.user_id.clone(), health);
        match city {
            Some(city) => user.with_city(city),
            None => user,
        }
    }
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Predict health risk for a location.
    Predict {
        #[command(flatten)]
        location: LocationArgs,

        #[command(flatten)]
        profile: ProfileArgs,

        /// JSON file with an environment snapshot to score instead of looking one up.
        #[arg(long)]
        environment: Option<PathBuf>,
    },

    /// Show current conditions for a location.
    Environment {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Search the evidence corpus.
    Search {
        /// The search query.
        query: String,

        /// Maximum number of results.
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Ingest documents from a JSON array of `{content, metadata}` objects.
    Ingest {
        /// Path to the documents file.
        file: PathBuf,

        /// Source label stamped on every document.
        #[arg(short, long)]
        source: String,
    },

    /// Ingest the built-in corpus.
    Seed,

    /// Ask the assistant a question.
    Chat {
        /// The question.
        message: String,

        /// Home city for context.
        #[arg(long)]
        city: Option<String>,

        #[command(flatten)]
        profile: ProfileArgs,

        /// JSON file with prior `{role, content}` turns.
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Summarize a JSON array of risk vectors, newest first.
    Stats {
        /// Path to the history file.
        file: PathBuf,
    },

    /// Show the effective configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), cli.offline) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let mut observability = match observability::init_from_config(
        &config.observability,
        InitOptions {
            verbose: cli.verbose,
            metrics_expose: cli.metrics,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    let result = run_command(cli.command, config).await;
    observability.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Loads `.env`, the config file and environment overrides.
fn load_config(path: Option<&Path>, offline: bool) -> Result<ClimariskConfig> {
    let _ = dotenvy::dotenv();
    let config = match path {
        Some(path) => ClimariskConfig::load_from_file(path)?,
        None => ClimariskConfig::load_default(),
    }
    .with_env_overrides();
    Ok(if offline {
        config.with_offline_mode(true)
    } else {
        config
    })
}

/// Runs the selected command.
async fn run_command(command: Commands, config: ClimariskConfig) -> Result<()> {
    if let Commands::Config = command {
        return print_json(&config.redacted_summary());
    }
    if let Commands::Stats { file } = &command {
        let history: Vec<RiskVector> = read_json(file)?;
        return print_json(&PredictionStats::from_history(&history));
    }

    let container = ServiceContainer::connect(&config)
        .await
        .context("failed to connect services")?;
    let result = dispatch(&container, command).await;
    container.close().await;
    result
}

async fn dispatch(container: &ServiceContainer, command: Commands) -> Result<()> {
    match command {
        Commands::Predict {
            location,
            profile,
            environment,
        } => {
            let location = location.resolve()?;
            let user = profile.profile(location.city());
            let snapshot = environment
                .map(|path| read_json::<EnvironmentSnapshot>(&path))
                .transpose()?;
            let result = container
                .prediction()
                .predict(&user, &location, snapshot)
                .await?;
            print_json(&result)
        },

        Commands::Environment { location } => {
            let location = location.resolve()?;
            print_json(&container.environment().resolve(&location).await)
        },

        Commands::Search { query, k } => {
            let evidence = container.evidence();
            let k = k.unwrap_or_else(|| evidence.default_k());
            print_json(&evidence.chat_evidence(&query, k).await?)
        },

        Commands::Ingest { file, source } => {
            let docs: Vec<NewDocument> = read_json(&file)?;
            let count = container.evidence().ingest_documents(docs, &source).await?;
            print_json(&serde_json::json!({ "count": count }))
        },

        Commands::Seed => {
            let count = container.evidence().seed().await?;
            print_json(&serde_json::json!({ "count": count }))
        },

        Commands::Chat {
            message,
            city,
            profile,
            history,
        } => {
            if message.trim().is_empty() {
                bail!("message cannot be empty");
            }
            let user = profile.profile(city.as_deref());
            let history: Vec<ChatTurn> = match history {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            print_json(&container.assistant().reply(&user, &history, &message).await)
        },

        Commands::Stats { .. } | Commands::Config => Ok(()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
