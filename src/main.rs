//! cardiorisk: heart disease risk screening
//!
//! Main entry point for the command line application.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::load_artifacts;
use cardiorisk::adapters::sanitize::SanitizingMakeWriter;
use cardiorisk::cli::{load_input, render_columns, render_outcome, Cli, Command};
use cardiorisk::config::{AppConfig, LogMode};
use cardiorisk::PredictionService;

fn init_logging(config: &AppConfig) -> Result<WorkerGuard> {
    // stdout carries the screening outcome, so logs default to stderr.
    let (writer, guard) = match config.log_mode {
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: a missing directory surfaces as an open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("failed to open log file {:?}", config.log_file))?;
            tracing_appender::non_blocking(file)
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(dir) = &cli.artifacts {
        config = config.with_artifact_dir(dir);
    }

    let _guard = init_logging(&config)?;
    tracing::info!("Starting cardiorisk...");

    // Artifacts are loaded before any input is read; failure here is fatal.
    let artifacts = load_artifacts(&config.artifact_paths())
        .with_context(|| format!("failed to load model artifacts from {:?}", config.artifact_dir))?;
    let verified = artifacts.verified;
    let service = PredictionService::from_artifacts(artifacts)
        .context("model artifacts are inconsistent")?;

    match cli.command {
        Command::Predict(args) => {
            let input = match &args.input {
                Some(path) => load_input(path)
                    .with_context(|| format!("failed to read patient input from {path:?}"))?,
                None => args.form.into_input(),
            };

            let diagnosis = service.run_prediction(&input)?;
            println!("{}", render_outcome(&diagnosis, args.json)?);
        }
        Command::Columns => {
            println!("{}", render_columns(service.schema()));
        }
        Command::Verify => {
            let unmapped = service.aligner().unmapped_columns();
            println!("artifacts: {}", config.artifact_dir.display());
            println!("columns: {}", service.schema().len());
            println!("classifier: {}", service.classifier_kind());
            println!("manifest: {}", if verified { "verified" } else { "absent" });
            if unmapped.is_empty() {
                println!("form coverage: complete");
            } else {
                println!("form coverage: missing {}", unmapped.join(", "));
            }
        }
    }

    tracing::info!("cardiorisk finished.");
    Ok(())
}
