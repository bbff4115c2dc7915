//! End-to-end tests for the HTTP surface, driven through the router without
//! binding a socket.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use colorisk::application::{InferenceService, ModelGateway};
use colorisk::config::ResponseFormat;
use colorisk::domain::FeatureVector;
use colorisk::http::{router, AppState, Views};
use colorisk::ports::{ModelCapability, ModelError, RiskModel};
use colorisk::RiskPolicy;

const FULL_FORM: &str = "gender=1&age=2&bmi=24.5&residence=0&fx=1&bm=0&lwy=1&smoke=0&drink=1&fit=1";
const REFERENCE_FORM: &str =
    "gender=1&age=2&bmi=25.5&residence=0&fx=0&bm=1&lwy=0&smoke=0&drink=1&fit=0";

/// Model returning a fixed probability, or failing when `fail` is set.
struct StubModel {
    probability: f64,
    fail: bool,
}

impl RiskModel for StubModel {
    fn capability(&self) -> ModelCapability {
        ModelCapability::Probability
    }

    fn predict_label(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(if self.probability > 0.5 { 1.0 } else { 0.0 })
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        if self.fail {
            return Err(ModelError::Inference("boom".to_string()));
        }
        Ok(self.probability)
    }
}

struct LabelOnlyModel;

impl RiskModel for LabelOnlyModel {
    fn capability(&self) -> ModelCapability {
        ModelCapability::LabelOnly
    }

    fn predict_label(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(1.0)
    }
}

/// Model that sleeps before answering.
struct SlowModel {
    delay: Duration,
}

impl RiskModel for SlowModel {
    fn capability(&self) -> ModelCapability {
        ModelCapability::Probability
    }

    fn predict_label(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(0.0)
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        std::thread::sleep(self.delay);
        Ok(0.2)
    }
}

struct PanickingModel;

impl RiskModel for PanickingModel {
    fn capability(&self) -> ModelCapability {
        ModelCapability::Probability
    }

    fn predict_label(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(0.0)
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        panic!("corrupted tree");
    }
}

fn build_app(
    gateway: ModelGateway,
    policy: RiskPolicy,
    format: ResponseFormat,
    inference_timeout: Option<Duration>,
) -> Router {
    let state = AppState {
        service: Arc::new(InferenceService::new(gateway, policy)),
        views: Arc::new(Views::new(false).unwrap()),
        response_format: format,
        inference_timeout,
    };
    router(state, None)
}

fn app_with(gateway: ModelGateway, format: ResponseFormat) -> Router {
    build_app(gateway, RiskPolicy::default(), format, None)
}

fn stub_app(probability: f64, fail: bool, format: ResponseFormat) -> Router {
    let model = StubModel { probability, fail };
    app_with(ModelGateway::from_model(Arc::new(model)), format)
}

fn predict_request(body: &'static str, accept: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::ACCEPT, accept)
        .body(Body::from(body))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

#[tokio::test]
async fn test_predict_json_high_risk() {
    let app = stub_app(0.2, false, ResponseFormat::Html);

    let response = app
        .oneshot(predict_request(FULL_FORM, "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["risk"], 20.0);
    assert_eq!(json["level"], "High Risk");
    assert_eq!(
        json["recommendation"],
        "High risk! Immediate colonoscopy is recommended."
    );
    assert_eq!(json["input_data"][0][2], 24.5);
    assert_eq!(json["input_data"][0][9], 1.0);
}

#[tokio::test]
async fn test_predict_json_by_configuration() {
    let app = stub_app(0.05, false, ResponseFormat::Json);

    let response = app.oneshot(predict_request(FULL_FORM, "*/*")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["risk"], 5.0);
    assert_eq!(json["level"], "Low Risk");
}

#[tokio::test]
async fn test_predict_html_view() {
    let app = stub_app(0.2, false, ResponseFormat::Html);

    let response = app
        .oneshot(predict_request(FULL_FORM, "text/html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("High Risk"));
    assert!(html.contains("20"));
}

#[tokio::test]
async fn test_predict_missing_fields_use_defaults() {
    let app = stub_app(0.5, false, ResponseFormat::Json);

    let response = app.oneshot(predict_request("age=3", "*/*")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["input_data"][0][1], 3.0);
    assert_eq!(json["input_data"][0][2], 0.0);
}

#[tokio::test]
async fn test_predict_invalid_age() {
    let app = stub_app(0.2, false, ResponseFormat::Json);

    let response = app
        .oneshot(predict_request("age=9&bmi=20", "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
    assert_eq!(json["error"], "Invalid input data");
    assert!(json["details"].as_str().unwrap().contains("Age"));
}

#[tokio::test]
async fn test_predict_malformed_bmi() {
    let app = stub_app(0.2, false, ResponseFormat::Json);

    let response = app
        .oneshot(predict_request("bmi=abc", "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_predict_model_failure() {
    let app = stub_app(0.2, true, ResponseFormat::Json);

    let response = app
        .oneshot(predict_request(FULL_FORM, "application/json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["code"], "PREDICTION_FAILED");
    assert!(json["details"].as_str().unwrap().contains("boom"));
}

#[tokio::test]
async fn test_predict_label_only_model() {
    let app = app_with(
        ModelGateway::from_model(Arc::new(LabelOnlyModel)),
        ResponseFormat::Json,
    );

    let response = app.oneshot(predict_request(FULL_FORM, "*/*")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["level"], "Unknown Risk");
    assert_eq!(json["risk"], 100.0);
}

#[tokio::test]
async fn test_index_page() {
    let app = stub_app(0.2, false, ResponseFormat::Html);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("action=\"/predict\""));
    assert!(html.contains("name=\"fit\""));
}

#[tokio::test]
async fn test_visualization_without_assessment() {
    let app = stub_app(0.2, false, ResponseFormat::Html);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/visualization")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("No assessment yet"));
}

#[tokio::test]
async fn test_predict_rejects_get() {
    let app = stub_app(0.2, false, ResponseFormat::Html);

    let response = app
        .oneshot(Request::builder().uri("/predict").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_bundled_demo_model() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/rf_model.json");
    let gateway = ModelGateway::load(&path, None).unwrap();
    assert_eq!(gateway.capability(), ModelCapability::Probability);

    let app = app_with(gateway, ResponseFormat::Json);
    let response = app
        .clone()
        .oneshot(predict_request("gender=0", "*/*"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["level"], "Low Risk");

    let response = app
        .oneshot(predict_request("age=3&bm=1&smoke=1&fit=1", "*/*"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["level"], "High Risk");
}

#[tokio::test]
async fn test_predict_reference_questionnaire() {
    let app = stub_app(0.2, false, ResponseFormat::Json);

    let response = app
        .oneshot(predict_request(REFERENCE_FORM, "*/*"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["risk"], 20.0);
    assert_eq!(json["level"], "High Risk");
    assert_eq!(
        json["input_data"],
        serde_json::json!([[1.0, 2.0, 25.5, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]])
    );
}

#[tokio::test]
async fn test_predict_three_tier_policy() {
    let gateway = ModelGateway::from_model(Arc::new(StubModel {
        probability: 0.2,
        fail: false,
    }));
    let app = build_app(
        gateway,
        RiskPolicy::three_tier(0.136868298, 0.9),
        ResponseFormat::Json,
        None,
    );

    let response = app.oneshot(predict_request(FULL_FORM, "*/*")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["level"], "Medium Risk");
    assert_eq!(
        json["recommendation"],
        "Medium risk. A colonoscopy in the near future is recommended."
    );
    assert_eq!(json["policy"], "three_tier");
}

#[tokio::test]
async fn test_predict_inference_timeout() {
    let gateway = ModelGateway::from_model(Arc::new(SlowModel {
        delay: Duration::from_millis(300),
    }));
    let app = build_app(
        gateway,
        RiskPolicy::default(),
        ResponseFormat::Json,
        Some(Duration::from_millis(50)),
    );

    let response = app.oneshot(predict_request(FULL_FORM, "*/*")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["code"], "PREDICTION_FAILED");
    assert!(json["details"].as_str().unwrap().contains("timed out after 50 ms"));
}

#[tokio::test]
async fn test_predict_within_timeout() {
    let gateway = ModelGateway::from_model(Arc::new(SlowModel {
        delay: Duration::from_millis(10),
    }));
    let app = build_app(
        gateway,
        RiskPolicy::default(),
        ResponseFormat::Json,
        Some(Duration::from_secs(5)),
    );

    let response = app.oneshot(predict_request(FULL_FORM, "*/*")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_predict_model_panic_is_internal_error() {
    let app = app_with(
        ModelGateway::from_model(Arc::new(PanickingModel)),
        ResponseFormat::Json,
    );

    let response = app.oneshot(predict_request(FULL_FORM, "*/*")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "Server error");
    assert!(!json["details"].as_str().unwrap().contains("corrupted tree"));
}

#[tokio::test]
async fn test_predict_repeated_field_uses_first_value() {
    let app = stub_app(0.2, false, ResponseFormat::Json);

    let response = app
        .oneshot(predict_request("gender=1&gender=5&age=2", "*/*"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["input_data"][0][0], 1.0);
}
