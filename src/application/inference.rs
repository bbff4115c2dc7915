//! Inference service: Orchestrates a single risk assessment.
//!
//! This service coordinates:
//! - Input validation
//! - Model inference through the gateway
//! - Risk classification

use std::collections::HashMap;

use crate::application::ModelGateway;
use crate::domain::{FeatureVector, PredictionResult, RiskPolicy};

/// Service for running risk assessments.
///
/// Holds no mutable state; one instance is shared by every request.
#[derive(Debug, Clone)]
pub struct InferenceService {
    gateway: ModelGateway,
    policy: RiskPolicy,
}

impl InferenceService {
    /// Create a new inference service.
    pub fn new(gateway: ModelGateway, policy: RiskPolicy) -> Self {
        Self { gateway, policy }
    }

    #[must_use]
    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    #[must_use]
    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Run the full pipeline on raw form fields.
    ///
    /// # Errors
    /// Returns `InvalidInput` if validation fails and `PredictionFailed` if
    /// inference fails.
    pub fn assess(&self, form: &HashMap<String, String>) -> crate::Result<PredictionResult> {
        tracing::debug!("Step 1: Validating {} submitted fields...", form.len());
        let features = FeatureVector::validate(form)?;
        self.assess_features(features)
    }

    /// Run inference and classification on an already validated vector.
    ///
    /// # Errors
    /// Returns `PredictionFailed` if inference fails.
    pub fn assess_features(&self, features: FeatureVector) -> crate::Result<PredictionResult> {
        tracing::debug!("Step 2: Running model inference...");
        let prediction = self.gateway.predict(&features)?;

        tracing::debug!("Step 3: Classifying prediction...");
        let result = self.policy.classify(prediction, features);

        tracing::info!(
            "Assessment complete: risk={:.2}%, level={}, policy={}",
            result.risk_percent,
            result.tier,
            result.scheme
        );

        Ok(result)
    }
}
