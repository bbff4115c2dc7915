//! Colorisk: colorectal cancer risk prediction service
//!
//! Main entry point for the HTTP server.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use colorisk::adapters::sanitize::SanitizingMakeWriter;
use colorisk::application::{InferenceService, ModelGateway};
use colorisk::http::{self, AppState};
use colorisk::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenv::dotenv();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Initialize logging. RUST_LOG, when set, overrides LOG_LEVEL.
    let (writer, _guard) = match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                // Best-effort: a missing directory surfaces as an open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Unable to open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Colorisk...");

    // Refuse to serve traffic without a usable model.
    let gateway = ModelGateway::load(&config.model_path, config.model_sha256.as_deref())
        .inspect_err(|e| tracing::error!("Error loading model: {}", e))
        .with_context(|| format!("Unable to load model from {}", config.model_path.display()))?;

    let policy = config.risk_policy();
    tracing::info!(
        "Risk policy: {} (threshold={}, high_risk_threshold={})",
        policy.scheme,
        policy.threshold,
        policy.high_risk_threshold
    );

    let service = InferenceService::new(gateway, policy);
    let state = AppState::new(service, &config).context("Unable to load templates")?;

    http::serve(state, &config).await.context("HTTP server failed")?;

    tracing::info!("Colorisk shutdown complete.");
    Ok(())
}
