use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ColoriskError;

/// Error returned by the JSON-speaking routes.
///
/// Every body carries a human-readable `error` summary, a machine-checkable
/// `code` and a `details` string. Internal failures never include more than
/// the error message itself.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    summary: &'static str,
    details: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
    details: &'a str,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, summary: &'static str, details: String) -> Self {
        Self {
            status,
            code,
            summary,
            details,
        }
    }

    pub fn invalid_input(details: impl Into<String>) -> Self {
        let details = details.into();
        tracing::warn!("Input validation failed: {}", details);
        Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_INPUT",
            "Invalid input data",
            details,
        )
    }

    pub fn prediction_failed(details: impl Into<String>) -> Self {
        let details = details.into();
        tracing::error!("Prediction processing failed: {}", details);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PREDICTION_FAILED",
            "Server error",
            details,
        )
    }

    pub fn render_failed(details: impl Into<String>) -> Self {
        let details = details.into();
        tracing::error!("Template rendering error: {}", details);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "RENDER_FAILED",
            "Server error",
            details,
        )
    }

    pub fn internal(details: impl Into<String>) -> Self {
        let details = details.into();
        tracing::error!("Internal error: {}", details);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Server error",
            details,
        )
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<ColoriskError> for ApiError {
    fn from(err: ColoriskError) -> Self {
        match err {
            ColoriskError::InvalidInput(e) => Self::invalid_input(e.to_string()),
            ColoriskError::PredictionFailed(e) => Self::prediction_failed(e.to_string()),
            ColoriskError::Render(e) => Self::render_failed(e.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.summary,
            code: self.code,
            details: &self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureVector;
    use crate::ports::ModelError;
    use std::collections::HashMap;

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let mut form = HashMap::new();
        form.insert("gender".to_string(), "2".to_string());
        let err = FeatureVector::validate(&form).expect_err("invalid");

        let api: ApiError = ColoriskError::from(err).into();
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_model_error_maps_to_server_error() {
        let api: ApiError = ColoriskError::from(ModelError::Inference("boom".into())).into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.code(), "PREDICTION_FAILED");
    }
}
