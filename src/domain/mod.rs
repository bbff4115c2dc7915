//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O: input validation and the risk decision table.

mod assessment;
mod features;

pub use assessment::{
    Prediction, PredictionResult, RiskPolicy, RiskTier, TierScheme, DEFAULT_HIGH_RISK_THRESHOLD,
    DEFAULT_THRESHOLD,
};
pub use features::{FeatureVector, ValidationError, FEATURE_COUNT, FEATURE_NAMES};
