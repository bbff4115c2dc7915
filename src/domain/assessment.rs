//! Risk assessment types.
//!
//! Turns a raw model output into the tier and recommendation shown to the
//! clinician.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::FeatureVector;

/// Default probability cutoff between low and elevated risk.
pub const DEFAULT_THRESHOLD: f64 = 0.136868298;

/// Default cutoff above which the three-tier policy reports high risk.
pub const DEFAULT_HIGH_RISK_THRESHOLD: f64 = 0.9;

const HIGH_RISK_COLONOSCOPY: &str = "High risk! Immediate colonoscopy is recommended.";
const HIGH_RISK_EXAMINATION: &str = "High risk! Immediate examination is recommended.";
const MEDIUM_RISK: &str = "Medium risk. A colonoscopy in the near future is recommended.";
const LOW_RISK: &str = "Low risk. Observation and regular follow-ups are recommended.";
const UNKNOWN_RISK: &str =
    "The model does not support probability prediction. Please check the model type.";

/// Raw model output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    /// Estimated probability of the positive class, in `[0, 1]`.
    Probability(f64),
    /// Plain class label from a model without probability estimates.
    RawLabel(f64),
}

/// Discrete risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    /// The model only produced a label, so no tier can be derived.
    Unknown,
}

impl RiskTier {
    /// Label shown to users.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
            Self::Unknown => "Unknown Risk",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How probabilities are bucketed into tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierScheme {
    /// Low / High around the threshold.
    #[default]
    TwoTier,
    /// Low / Medium / High with an additional high-risk cutoff.
    ThreeTier,
}

impl FromStr for TierScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "two_tier" | "2" => Ok(Self::TwoTier),
            "three_tier" | "3" => Ok(Self::ThreeTier),
            other => Err(format!("unknown risk policy '{other}' (expected two_tier or three_tier)")),
        }
    }
}

impl fmt::Display for TierScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TwoTier => f.write_str("two_tier"),
            Self::ThreeTier => f.write_str("three_tier"),
        }
    }
}

/// Decision table applied to every prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskPolicy {
    pub scheme: TierScheme,
    /// Probabilities strictly above this are at least elevated risk.
    pub threshold: f64,
    /// Three-tier only: probabilities strictly above this are high risk.
    pub high_risk_threshold: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            scheme: TierScheme::TwoTier,
            threshold: DEFAULT_THRESHOLD,
            high_risk_threshold: DEFAULT_HIGH_RISK_THRESHOLD,
        }
    }
}

impl RiskPolicy {
    /// Two-tier policy around `threshold`.
    #[must_use]
    pub fn two_tier(threshold: f64) -> Self {
        Self {
            scheme: TierScheme::TwoTier,
            threshold,
            ..Self::default()
        }
    }

    /// Three-tier policy.
    #[must_use]
    pub fn three_tier(threshold: f64, high_risk_threshold: f64) -> Self {
        Self {
            scheme: TierScheme::ThreeTier,
            threshold,
            high_risk_threshold,
        }
    }

    /// Map a probability to a tier and recommendation.
    #[must_use]
    pub fn tier_for(&self, probability: f64) -> (RiskTier, &'static str) {
        match self.scheme {
            TierScheme::TwoTier => {
                if probability > self.threshold {
                    (RiskTier::High, HIGH_RISK_COLONOSCOPY)
                } else {
                    (RiskTier::Low, LOW_RISK)
                }
            }
            TierScheme::ThreeTier => {
                if probability > self.high_risk_threshold {
                    (RiskTier::High, HIGH_RISK_EXAMINATION)
                } else if probability > self.threshold {
                    (RiskTier::Medium, MEDIUM_RISK)
                } else {
                    (RiskTier::Low, LOW_RISK)
                }
            }
        }
    }

    /// Classify a model output for the given input.
    #[must_use]
    pub fn classify(&self, prediction: Prediction, input: FeatureVector) -> PredictionResult {
        let (risk_percent, tier, recommendation) = match prediction {
            Prediction::Probability(p) => {
                let (tier, recommendation) = self.tier_for(p);
                (round2(p * 100.0), tier, recommendation)
            }
            Prediction::RawLabel(label) => (round2(label * 100.0), RiskTier::Unknown, UNKNOWN_RISK),
        };

        PredictionResult {
            risk_percent,
            tier,
            recommendation,
            input,
            threshold: self.threshold,
            scheme: self.scheme,
            assessed_at: chrono::Utc::now(),
        }
    }
}

/// Outcome of one assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Risk as a percentage, rounded to two decimals.
    pub risk_percent: f64,
    pub tier: RiskTier,
    pub recommendation: &'static str,
    /// Input echoed back for display.
    pub input: FeatureVector,
    /// Threshold the tier was derived with.
    pub threshold: f64,
    pub scheme: TierScheme,
    pub assessed_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionResult {
    #[must_use]
    pub fn tier_label(&self) -> &'static str {
        self.tier.label()
    }
}

/// JSON shape returned to clients and handed to templates.
#[derive(Serialize)]
struct WirePredictionResult<'a> {
    risk: f64,
    level: &'static str,
    recommendation: &'static str,
    input_data: &'a FeatureVector,
    threshold: f64,
    policy: TierScheme,
    assessed_at: &'a chrono::DateTime<chrono::Utc>,
}

impl<'a> From<&'a PredictionResult> for WirePredictionResult<'a> {
    fn from(result: &'a PredictionResult) -> Self {
        Self {
            risk: result.risk_percent,
            level: result.tier.label(),
            recommendation: result.recommendation,
            input_data: &result.input,
            threshold: result.threshold,
            policy: result.scheme,
            assessed_at: &result.assessed_at,
        }
    }
}

impl Serialize for PredictionResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WirePredictionResult::from(self).serialize(serializer)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
