//! Risk model port: Trait for a loaded predictive model.
//!
//! This trait abstracts the serialized model artifact from the application
//! logic, so the service can be driven by a stub in tests.

use crate::domain::FeatureVector;

/// What a loaded model can produce, decided once when it is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelCapability {
    /// The model estimates the positive-class probability.
    Probability,
    /// The model only predicts a class label.
    LabelOnly,
}

impl std::fmt::Display for ModelCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Probability => write!(f, "probability"),
            Self::LabelOnly => write!(f, "label-only"),
        }
    }
}

/// Error type for inference.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Model does not support probability estimation")]
    ProbabilityUnsupported,

    #[error("Feature count mismatch: got {got}, expected {expected}")]
    FeatureCount { expected: usize, got: usize },

    #[error("Model produced an invalid output: {0}")]
    InvalidOutput(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Trait for a read-only predictive model.
///
/// Implementations must be safe to call concurrently: the same instance is
/// shared by every request for the lifetime of the process.
pub trait RiskModel: Send + Sync {
    /// Capability tag reported to the gateway at load time.
    fn capability(&self) -> ModelCapability;

    /// Predict the class label (0 or 1).
    ///
    /// # Errors
    /// Returns `ModelError` if inference fails.
    fn predict_label(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Estimate the probability of the positive class.
    ///
    /// Only called on models reporting [`ModelCapability::Probability`].
    ///
    /// # Errors
    /// Returns `ModelError::ProbabilityUnsupported` by default.
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let _ = features;
        Err(ModelError::ProbabilityUnsupported)
    }
}
