//! Screening questionnaire features for colorectal cancer risk prediction.
//!
//! The model consumes ten positional inputs. Raw form values arrive as
//! untyped strings and are turned into a [`FeatureVector`] by [`FeatureVector::validate`].

use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde::{Serialize, Serializer};

/// Number of inputs the model expects.
pub const FEATURE_COUNT: usize = 10;

/// Canonical feature order. The model is positional, so this order must match
/// the order the artifact was trained with.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "age",
    "bmi",
    "residence",
    "fx",
    "bm",
    "lwy",
    "smoke",
    "drink",
    "fit",
];

const AGE_RANGE: RangeInclusive<i64> = 0..=3;
const BINARY_RANGE: RangeInclusive<i64> = 0..=1;
const BMI_RANGE: RangeInclusive<f64> = 0.0..=50.0;

/// Error raised when a submitted form cannot be turned into a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Input data validation failed: {reason}")]
pub struct ValidationError {
    /// First offending field, in canonical order.
    pub field: &'static str,
    /// Human-readable reason.
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validated model input.
///
/// Categorical answers are encoded as small integers:
/// - `gender`: 0 = female, 1 = male
/// - `age`: age band 0-3
/// - `residence`: 0 = urban, 1 = rural
/// - `fx` (diarrhoea), `bm` (bloody stool), `lwy` (appendectomy history),
///   `smoke`, `drink`, `fit` (positive faecal immunochemical test): 0 = no, 1 = yes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector {
    pub gender: u8,
    pub age: u8,
    pub bmi: f64,
    pub residence: u8,
    pub fx: u8,
    pub bm: u8,
    pub lwy: u8,
    pub smoke: u8,
    pub drink: u8,
    pub fit: u8,
}

impl FeatureVector {
    /// Parse and range-check raw form fields.
    ///
    /// Missing fields default to `0` (or `0.0` for `bmi`). Every field is parsed
    /// before any range is checked, so a malformed value is reported ahead of
    /// an out-of-range one.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] naming the first offending field.
    pub fn validate(form: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let gender = parse_int(form, "gender")?;
        let age = parse_int(form, "age")?;
        let bmi = parse_float(form, "bmi")?;
        let residence = parse_int(form, "residence")?;
        let fx = parse_int(form, "fx")?;
        let bm = parse_int(form, "bm")?;
        let lwy = parse_int(form, "lwy")?;
        let smoke = parse_int(form, "smoke")?;
        let drink = parse_int(form, "drink")?;
        let fit = parse_int(form, "fit")?;

        if !BINARY_RANGE.contains(&gender) {
            return Err(ValidationError::new("gender", "Gender value must be 0 or 1"));
        }
        if !AGE_RANGE.contains(&age) {
            return Err(ValidationError::new("age", "Age value must be between 0-3"));
        }
        // NaN and infinities fall outside the range as well.
        if !BMI_RANGE.contains(&bmi) {
            return Err(ValidationError::new(
                "bmi",
                "BMI value must be between 0.0-50.0",
            ));
        }
        if !BINARY_RANGE.contains(&residence) {
            return Err(ValidationError::new(
                "residence",
                "Residence value must be 0 or 1",
            ));
        }
        let binaries = [
            ("fx", fx),
            ("bm", bm),
            ("lwy", lwy),
            ("smoke", smoke),
            ("drink", drink),
            ("fit", fit),
        ];
        if let Some(&(field, _)) = binaries.iter().find(|(_, v)| !BINARY_RANGE.contains(v)) {
            return Err(ValidationError::new(
                field,
                "Binary input values must be 0 or 1",
            ));
        }

        // Ranges checked above, so the narrowing casts are lossless.
        Ok(Self {
            gender: gender as u8,
            age: age as u8,
            bmi,
            residence: residence as u8,
            fx: fx as u8,
            bm: bm as u8,
            lwy: lwy as u8,
            smoke: smoke as u8,
            drink: drink as u8,
            fit: fit as u8,
        })
    }

    /// Features in canonical model order.
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.gender),
            f64::from(self.age),
            self.bmi,
            f64::from(self.residence),
            f64::from(self.fx),
            f64::from(self.bm),
            f64::from(self.lwy),
            f64::from(self.smoke),
            f64::from(self.drink),
            f64::from(self.fit),
        ]
    }
}

/// Serialized as a one-row matrix, the shape clients of the model service
/// have always received in `input_data`.
impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.to_array()].serialize(serializer)
    }
}

fn raw_value<'a>(form: &'a HashMap<String, String>, field: &str, default: &'a str) -> &'a str {
    form.get(field).map_or(default, |v| v.trim())
}

fn parse_int(form: &HashMap<String, String>, field: &'static str) -> Result<i64, ValidationError> {
    let raw = raw_value(form, field, "0");
    raw.parse::<i64>().map_err(|_| {
        ValidationError::new(
            field,
            format!("invalid literal for {field}: '{raw}' is not an integer"),
        )
    })
}

fn parse_float(form: &HashMap<String, String>, field: &'static str) -> Result<f64, ValidationError> {
    let raw = raw_value(form, field, "0.0");
    raw.parse::<f64>().map_err(|_| {
        ValidationError::new(
            field,
            format!("could not convert {field} to float: '{raw}'"),
        )
    })
}
