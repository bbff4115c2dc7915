//! Model gateway: owns the loaded model and dispatches on its capability.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::artifact::{self, ArtifactError};
use crate::domain::{FeatureVector, Prediction};
use crate::ports::{ModelCapability, ModelError, RiskModel};

/// Where the serving model was loaded from.
#[derive(Debug, Clone)]
pub struct ModelSource {
    pub path: PathBuf,
    pub kind: &'static str,
    pub sha256: String,
}

/// Read-only handle to the serving model.
///
/// The capability tag is captured once at construction; `predict` never
/// probes the model for what it supports.
#[derive(Clone)]
pub struct ModelGateway {
    model: Arc<dyn RiskModel>,
    capability: ModelCapability,
    source: Option<ModelSource>,
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("capability", &self.capability)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl ModelGateway {
    /// Load the model artifact at `path`.
    ///
    /// # Errors
    /// Returns `ArtifactError` if the artifact is missing, fails its digest
    /// check, or cannot be turned into a usable model.
    pub fn load(path: &Path, expected_sha256: Option<&str>) -> Result<Self, ArtifactError> {
        let loaded = artifact::load(path, expected_sha256)?;
        let source = ModelSource {
            path: loaded.path,
            kind: loaded.model.kind(),
            sha256: loaded.sha256,
        };
        let mut gateway = Self::from_model(Arc::new(loaded.model));
        gateway.source = Some(source);
        Ok(gateway)
    }

    /// Wrap an already constructed model.
    pub fn from_model(model: Arc<dyn RiskModel>) -> Self {
        let capability = model.capability();
        if capability == ModelCapability::LabelOnly {
            tracing::warn!("Model does not support probability estimation; serving labels only");
        }
        Self {
            model,
            capability,
            source: None,
        }
    }

    #[must_use]
    pub fn capability(&self) -> ModelCapability {
        self.capability
    }

    #[must_use]
    pub fn source(&self) -> Option<&ModelSource> {
        self.source.as_ref()
    }

    /// Run inference for one feature vector.
    ///
    /// # Errors
    /// Returns `ModelError` if the model fails or produces a value outside
    /// its contract.
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        match self.capability {
            ModelCapability::Probability => {
                let p = self.model.predict_proba(features)?;
                if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                    return Err(ModelError::InvalidOutput(format!(
                        "probability {p} outside [0, 1]"
                    )));
                }
                Ok(Prediction::Probability(p))
            }
            ModelCapability::LabelOnly => {
                let label = self.model.predict_label(features)?;
                if !label.is_finite() {
                    return Err(ModelError::InvalidOutput(format!("label {label}")));
                }
                Ok(Prediction::RawLabel(label))
            }
        }
    }
}
