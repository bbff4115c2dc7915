use std::collections::HashMap;

use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};

use super::{ApiError, AppState};
use crate::config::ResponseFormat;
use crate::domain::PredictionResult;

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Response {
    match state.views.index() {
        Ok(html) => Html(html).into_response(),
        Err(e) => render_error_page(&e),
    }
}

/// `GET /visualization`
pub async fn visualization(State(state): State<AppState>) -> Response {
    match state.views.visualization(None) {
        Ok(html) => Html(html).into_response(),
        Err(e) => render_error_page(&e),
    }
}

/// `POST /predict`
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(pairs) = form.map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;
    let fields = first_values(pairs);

    let result = run_assessment(&state, fields).await?;

    if wants_json(&headers, state.response_format) {
        return Ok(Json(result).into_response());
    }
    let html = state
        .views
        .visualization(Some(&result))
        .map_err(|e| ApiError::render_failed(e.to_string()))?;
    Ok(Html(html).into_response())
}

/// Run the assessment on the blocking pool, bounded by the configured
/// inference timeout.
async fn run_assessment(
    state: &AppState,
    fields: HashMap<String, String>,
) -> Result<PredictionResult, ApiError> {
    let service = state.service.clone();
    let task = tokio::task::spawn_blocking(move || service.assess(&fields));

    let joined = match state.inference_timeout {
        Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
            ApiError::prediction_failed(format!(
                "Prediction failed: inference timed out after {} ms",
                limit.as_millis()
            ))
        })?,
        None => task.await,
    };

    let outcome = joined.map_err(|e| {
        if e.is_panic() {
            ApiError::internal("model panicked during inference")
        } else {
            ApiError::internal(format!("inference task cancelled: {e}"))
        }
    })?;

    outcome.map_err(ApiError::from)
}

/// Collapse repeated keys, keeping the first value submitted for each.
fn first_values(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    let mut fields = HashMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        fields.entry(key).or_insert(value);
    }
    fields
}

fn wants_json(headers: &HeaderMap, format: ResponseFormat) -> bool {
    if format == ResponseFormat::Json {
        return true;
    }
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json") && !accept.contains("text/html"))
}

fn render_error_page(err: &minijinja::Error) -> Response {
    tracing::error!("Template rendering error: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Template rendering error: {err}"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_wants_json() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers, ResponseFormat::Html));
        assert!(wants_json(&headers, ResponseFormat::Json));

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(wants_json(&headers, ResponseFormat::Html));

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9"),
        );
        assert!(!wants_json(&headers, ResponseFormat::Html));
    }

    #[test]
    fn test_first_values_keeps_first_occurrence() {
        let pairs = vec![
            ("gender".to_string(), "1".to_string()),
            ("age".to_string(), "2".to_string()),
            ("gender".to_string(), "5".to_string()),
        ];
        let fields = first_values(pairs);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["gender"], "1");
        assert_eq!(fields["age"], "2");
    }
}
