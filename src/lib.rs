//! # Colorisk
//!
//! HTTP service exposing a pre-trained colorectal cancer risk model.
//!
//! A client submits ten questionnaire answers; the service validates them,
//! runs the model and answers with a risk tier and a recommendation.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (FeatureVector, RiskPolicy, PredictionResult)
//! - `ports`: Trait definitions for external operations (RiskModel)
//! - `adapters`: Concrete implementations (JSON model artifacts, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `http`: axum routes, views and error mapping

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;

pub use config::AppConfig;
pub use domain::{FeatureVector, PredictionResult, RiskPolicy, RiskTier};

/// Result type for Colorisk operations
pub type Result<T> = std::result::Result<T, ColoriskError>;

/// Main error type for Colorisk
#[derive(Debug, thiserror::Error)]
pub enum ColoriskError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    ModelLoad(#[from] adapters::artifact::ArtifactError),

    #[error(transparent)]
    InvalidInput(#[from] domain::ValidationError),

    #[error("Prediction failed: {0}")]
    PredictionFailed(#[from] ports::ModelError),

    #[error("Template rendering error: {0}")]
    Render(#[from] minijinja::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
