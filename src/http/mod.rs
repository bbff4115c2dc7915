//! HTTP surface built on axum.
//!
//! Routes:
//! - `GET  /`              - questionnaire form
//! - `POST /predict`       - run an assessment (HTML view or JSON)
//! - `GET  /visualization` - visualization page without an assessment
//! - `GET  /static/*`      - static assets

mod error;
mod handlers;
mod views;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::application::InferenceService;
use crate::config::{AppConfig, ResponseFormat};

pub use error::ApiError;
pub use views::Views;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InferenceService>,
    pub views: Arc<Views>,
    pub response_format: ResponseFormat,
    pub inference_timeout: Option<Duration>,
}

impl AppState {
    /// Build the state from a ready service and the startup configuration.
    ///
    /// # Errors
    /// Returns an error if the bundled templates fail to parse.
    pub fn new(service: InferenceService, config: &AppConfig) -> Result<Self, minijinja::Error> {
        Ok(Self {
            service: Arc::new(service),
            views: Arc::new(Views::new(config.debug)?),
            response_format: config.response_format,
            inference_timeout: config.inference_timeout,
        })
    }
}

/// Build the router. Static assets are served only when `static_dir` exists.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict))
        .route("/visualization", get(handlers::visualization));

    if let Some(dir) = static_dir.filter(|d| d.is_dir()) {
        app = app.nest_service("/static", ServeDir::new(dir));
    } else if let Some(dir) = static_dir {
        tracing::warn!("Static directory {} not found; /static is disabled", dir.display());
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind the configured address and serve until Ctrl-C or SIGTERM.
///
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(state: AppState, config: &AppConfig) -> std::io::Result<()> {
    let app = router(state, Some(&config.static_dir));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        "App is running on {}, debug mode: {}",
        listener.local_addr()?,
        config.debug
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
