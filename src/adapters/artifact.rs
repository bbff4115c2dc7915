//! Model artifact adapter: Implementation of `RiskModel` for exported JSON models.
//!
//! The training pipeline exports the fitted estimator as a JSON document tagged
//! by `kind`:
//! - `random_forest`: flat-array decision trees (sklearn `tree_` layout)
//! - `logistic_regression`: linear weights with an optional standard scaler
//! - `linear_classifier`: linear decision function without probabilities
//!
//! # Integrity
//!
//! The SHA-256 of the artifact bytes is computed on every load. When an
//! expected digest is configured the artifact is refused on mismatch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{ModelCapability, ModelError, RiskModel};

/// Marker for "no child" in the flat tree arrays.
const LEAF: i64 = -1;

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Model file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to load model: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Loaded model is invalid: {0}")]
    Invalid(String),

    #[error("Model digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
}

/// A model artifact with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub model: ModelArtifact,
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the artifact bytes.
    pub sha256: String,
}

/// Estimators the exporter knows how to write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
    LinearClassifier(LinearClassifier),
}

/// Ensemble of binary classification trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub trees: Vec<DecisionTree>,
}

/// One tree in flat-array form. Node `i` is a leaf when
/// `children_left[i] == -1`; otherwise samples with
/// `x[feature[i]] <= threshold[i]` go left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights `[negative, positive]`.
    pub value: Vec<[f64; 2]>,
}

/// Logistic regression with optional standardization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Linear classifier that only exposes labels (e.g. an SVM fitted without
/// probability calibration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Load and validate a model artifact.
///
/// # Errors
/// Returns `ArtifactError` if the file is missing, unreadable, fails the
/// digest check, cannot be deserialized, or describes an unusable model.
pub fn load(path: &Path, expected_sha256: Option<&str>) -> Result<LoadedArtifact, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }

    tracing::info!("Loading model file: {}", path.display());
    let bytes = std::fs::read(path)?;
    let sha256 = sha256_hex(&bytes);

    if let Some(expected) = expected_sha256 {
        let expected = expected.trim().to_ascii_lowercase();
        if expected != sha256 {
            return Err(ArtifactError::DigestMismatch {
                expected,
                actual: sha256,
            });
        }
        tracing::debug!("Model digest verified");
    }

    let model: ModelArtifact = serde_json::from_slice(&bytes)?;
    model.validate()?;

    tracing::info!(
        "Loaded {} model (capability={}, sha256={})",
        model.kind(),
        model.capability(),
        sha256
    );

    Ok(LoadedArtifact {
        model,
        path: path.to_path_buf(),
        sha256,
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn check_feature_names(names: Option<&Vec<String>>) -> Result<(), ArtifactError> {
    let Some(names) = names else {
        return Ok(());
    };
    if names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
        return Err(ArtifactError::Invalid(format!(
            "feature_names {names:?} do not match expected order {FEATURE_NAMES:?}"
        )));
    }
    Ok(())
}

fn check_weights(coefficients: &[f64]) -> Result<(), ArtifactError> {
    if coefficients.len() != FEATURE_COUNT {
        return Err(ArtifactError::Invalid(format!(
            "expected {FEATURE_COUNT} coefficients, got {}",
            coefficients.len()
        )));
    }
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(ArtifactError::Invalid("coefficients must be finite".into()));
    }
    Ok(())
}

fn dot(weights: &[f64], x: &[f64]) -> f64 {
    weights.iter().zip(x).map(|(w, v)| w * v).sum()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl ModelArtifact {
    /// Estimator kind as written in the artifact.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::LogisticRegression(_) => "logistic_regression",
            Self::LinearClassifier(_) => "linear_classifier",
        }
    }

    /// Structural checks run once at load time so inference never indexes
    /// out of bounds or loops.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            Self::RandomForest(forest) => forest.validate(),
            Self::LogisticRegression(model) => {
                check_feature_names(model.feature_names.as_ref())?;
                check_weights(&model.coefficients)?;
                if !model.intercept.is_finite() {
                    return Err(ArtifactError::Invalid("intercept must be finite".into()));
                }
                if let Some(scaler) = &model.scaler {
                    if scaler.mean.len() != FEATURE_COUNT || scaler.scale.len() != FEATURE_COUNT {
                        return Err(ArtifactError::Invalid(
                            "scaler lengths do not match feature count".into(),
                        ));
                    }
                    if scaler.scale.iter().any(|s| !s.is_finite() || *s == 0.0)
                        || scaler.mean.iter().any(|m| !m.is_finite())
                    {
                        return Err(ArtifactError::Invalid(
                            "scaler values must be finite and scale non-zero".into(),
                        ));
                    }
                }
                Ok(())
            }
            Self::LinearClassifier(model) => {
                check_feature_names(model.feature_names.as_ref())?;
                check_weights(&model.coefficients)?;
                if !model.intercept.is_finite() {
                    return Err(ArtifactError::Invalid("intercept must be finite".into()));
                }
                Ok(())
            }
        }
    }
}

impl RiskModel for ModelArtifact {
    fn capability(&self) -> ModelCapability {
        match self {
            Self::RandomForest(_) | Self::LogisticRegression(_) => ModelCapability::Probability,
            Self::LinearClassifier(_) => ModelCapability::LabelOnly,
        }
    }

    fn predict_label(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let x = features.to_array();
        let label = match self {
            Self::RandomForest(forest) => forest.probability(&x)? > 0.5,
            Self::LogisticRegression(model) => model.decision(&x) > 0.0,
            Self::LinearClassifier(model) => dot(&model.coefficients, &x) + model.intercept > 0.0,
        };
        Ok(if label { 1.0 } else { 0.0 })
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let x = features.to_array();
        match self {
            Self::RandomForest(forest) => forest.probability(&x),
            Self::LogisticRegression(model) => Ok(sigmoid(model.decision(&x))),
            Self::LinearClassifier(_) => Err(ModelError::ProbabilityUnsupported),
        }
    }
}

impl RandomForest {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.n_features != FEATURE_COUNT {
            return Err(ArtifactError::Invalid(format!(
                "model expects {} features, service provides {FEATURE_COUNT}",
                self.n_features
            )));
        }
        check_feature_names(self.feature_names.as_ref())?;
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("forest has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| ArtifactError::Invalid(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }

    /// Mean of the per-tree positive-class fractions.
    fn probability(&self, x: &[f64]) -> Result<f64, ModelError> {
        if x.len() != self.n_features {
            return Err(ModelError::FeatureCount {
                expected: self.n_features,
                got: x.len(),
            });
        }
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.probability(x)?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("node arrays have different lengths".into());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(format!("node {node} has only one child"));
                }
                let [neg, pos] = self.value[node];
                if !(neg.is_finite() && pos.is_finite()) || neg < 0.0 || pos < 0.0 || neg + pos <= 0.0 {
                    return Err(format!("leaf {node} has invalid class weights"));
                }
                continue;
            }
            // Children always follow their parent, which rules out cycles.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has out-of-order child {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(format!("node {node} splits on unknown feature {feature}"));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {node} has a non-finite threshold"));
            }
        }
        Ok(())
    }

    fn probability(&self, x: &[f64]) -> Result<f64, ModelError> {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left == LEAF {
                let [neg, pos] = self.value[node];
                return Ok(pos / (neg + pos));
            }
            let feature = usize::try_from(self.feature[node])
                .map_err(|_| ModelError::Inference(format!("bad feature index at node {node}")))?;
            let value = x.get(feature).copied().ok_or(ModelError::FeatureCount {
                expected: feature + 1,
                got: x.len(),
            })?;
            let next = if value <= self.threshold[node] {
                left
            } else {
                self.children_right[node]
            };
            node = usize::try_from(next)
                .map_err(|_| ModelError::Inference(format!("bad child index at node {node}")))?;
        }
    }
}

impl LogisticRegression {
    fn decision(&self, x: &[f64]) -> f64 {
        match &self.scaler {
            Some(scaler) => {
                let z: Vec<f64> = x
                    .iter()
                    .zip(scaler.mean.iter().zip(&scaler.scale))
                    .map(|(v, (m, s))| (v - m) / s)
                    .collect();
                dot(&self.coefficients, &z) + self.intercept
            }
            None => dot(&self.coefficients, x) + self.intercept,
        }
    }
}
