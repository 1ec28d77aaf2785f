use async_trait::async_trait;
use authority_audit_lib::analysis::normalizer::FALLBACK_ACTIONS;
use authority_audit_lib::commands::analyze::Analyzer;
use authority_audit_lib::commands::completion::CompletionProvider;
use authority_audit_lib::commands::fetcher::PageFetcher;
use authority_audit_lib::commands::settings::load_effective_settings;
use authority_audit_lib::error::AnalysisError;
use authority_audit_lib::models::request::{FetchOptions, PageSnapshot};
use authority_audit_lib::server::router;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tower::ServiceExt;

struct FixedPage;

#[async_trait]
impl PageFetcher for FixedPage {
    async fn fetch(&self, _url: &str, _options: FetchOptions) -> PageSnapshot {
        PageSnapshot {
            html: "<title>Jane Coaching</title><p>Contact us</p>".to_string(),
            screenshot_base64: None,
        }
    }
}

struct FixedCompletion(Result<String, AnalysisError>);

#[async_trait]
impl CompletionProvider for FixedCompletion {
    async fn complete(&self, _prompt: &str, _image: Option<&[u8]>) -> Result<String, AnalysisError> {
        self.0.clone()
    }
}

fn app_with_settings(
    completion: Result<String, AnalysisError>,
    settings_json: Value,
) -> (tempfile::TempDir, axum::Router) {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let path = tmp.path().join("authority-audit.json");
    fs::write(&path, settings_json.to_string()).expect("write settings");

    let settings = load_effective_settings(&path).expect("load settings");
    let analyzer = Analyzer::new(Arc::new(FixedPage), Arc::new(FixedCompletion(completion)), settings);
    (tmp, router(Arc::new(analyzer)))
}

fn app(completion: Result<String, AnalysisError>) -> (tempfile::TempDir, axum::Router) {
    app_with_settings(completion, json!({}))
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

const VALID_REQUEST: &str = r#"{"name":"Jane","website":"jane.example","instagram":null,"linkedin":"jane-doe"}"#;

#[tokio::test]
async fn successful_analysis_returns_normalized_report() {
    let (_tmp, app) = app(Ok(
        r#"Sure! ```json
{"clarity":90,"credibility":80,"visibility":70,"overall":12,"badge":"CRITICAL","interpretation":"Great job","summary":"Good work overall.","actions":["Do X"]}
```"#
            .to_string(),
    ));

    let response = app
        .oneshot(post("/api/analyze", VALID_REQUEST))
        .await
        .expect("router response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
        Some("no-cache")
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");

    assert_eq!(body["clarity"], json!(90));
    assert_eq!(body["overall"], json!(81));
    assert_eq!(body["badge"], json!("STRONG"));
    assert_eq!(body["badgeLabel"], json!("STRONG"));
    assert_eq!(body["interpretation"], json!("Great job"));
    assert_eq!(body["actions"], json!(["Do X"]));
}

#[tokio::test]
async fn netlify_path_is_an_alias() {
    let (_tmp, app) = app(Ok(r#"{"clarity":60}"#.to_string()));

    let (status, body) = send(app, post("/.netlify/functions/analyze", VALID_REQUEST)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credibility"], json!(50));
    assert_eq!(body["actions"], json!(FALLBACK_ACTIONS));
}

#[tokio::test]
async fn configured_weights_and_profile_flow_into_the_report() {
    let (_tmp, app) = app_with_settings(
        Ok(r#"{"clarity":100,"credibility":100,"visibility":0}"#.to_string()),
        json!({
            "schema_version": 0,
            "weights": { "clarity": 33, "credibility": 33, "visibility": 34 },
            "badgeProfile": "momentum"
        }),
    );

    let (status, body) = send(app, post("/api/analyze", VALID_REQUEST)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall"], json!(66));
    assert_eq!(body["badge"], json!("SOLID_FOUNDATION"));
    assert_eq!(body["badgeLabel"], json!("BUILDING MOMENTUM"));
}

#[tokio::test]
async fn non_post_methods_are_rejected() {
    for method in ["GET", "PUT", "DELETE"] {
        let (_tmp, app) = app(Ok("{}".to_string()));
        let request = Request::builder()
            .method(method)
            .uri("/api/analyze")
            .body(Body::empty())
            .expect("build request");

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }
}

#[tokio::test]
async fn missing_website_is_a_bad_request() {
    let (_tmp, app) = app(Ok("{}".to_string()));

    let (status, body) = send(app, post("/api/analyze", r#"{"name":"Jane"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid request"));
    assert_eq!(body["details"], json!("website is required"));
}

#[tokio::test]
async fn non_json_body_is_a_bad_request() {
    let (_tmp, app) = app(Ok("{}".to_string()));

    let (status, body) = send(app, post("/api/analyze", "name=Jane")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().starts_with("body is not a valid request"));
}

#[tokio::test]
async fn provider_failure_is_reported_as_analysis_failed() {
    let (_tmp, app) = app(Err(AnalysisError::CompletionProviderUnavailable(
        "API returned HTTP 429 Too Many Requests".to_string(),
    )));

    let (status, body) = send(app, post("/api/analyze", VALID_REQUEST)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Analysis failed"));
    let details = body["details"].as_str().unwrap();
    assert!(details.starts_with("Completion provider failed"));
    assert!(details.contains("429"));
    assert!(body["tip"].as_str().unwrap().contains("CLAUDE_API_KEY"));
}

#[tokio::test]
async fn malformed_completion_is_distinguished_from_provider_failure() {
    let (_tmp, app) = app(Ok("not json at all".to_string()));

    let (status, body) = send(app, post("/api/analyze", VALID_REQUEST)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Analysis failed"));
    let details = body["details"].as_str().unwrap();
    assert!(details.starts_with("Malformed completion"));
    assert!(details.contains("not json at all"));
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let (_tmp, app) = app(Ok("{}".to_string()));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build request");
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let request = Request::builder()
        .uri("/nope")
        .body(Body::empty())
        .expect("build request");
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn settings_file_is_created_with_defaults() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let path = tmp.path().join("nested").join("authority-audit.json");

    let settings = load_effective_settings(&path).expect("load settings");
    assert_eq!(settings.bind_address, "127.0.0.1:8888");

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).expect("settings written"))
        .expect("valid json");
    assert_eq!(written["schema_version"], json!(1));
    assert_eq!(written["weights"]["visibility"], json!(0.3));
}

#[tokio::test]
async fn unparseable_settings_file_is_rejected_and_preserved() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let path = tmp.path().join("authority-audit.json");
    let hand_edited = r#"{"model":"claude-sonnet","bindAddress":"0.0.0.0:9000",}"#;
    fs::write(&path, hand_edited).expect("write settings");

    let err = load_effective_settings(&path).expect_err("trailing comma must not load");
    assert!(err.contains("is not valid JSON"), "{err}");
    assert_eq!(fs::read_to_string(&path).expect("settings kept"), hand_edited);
}

#[tokio::test]
async fn non_object_settings_file_is_rejected_and_preserved() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let path = tmp.path().join("authority-audit.json");
    fs::write(&path, "[1, 2]").expect("write settings");

    let err = load_effective_settings(&path).expect_err("array must not load");
    assert!(err.contains("JSON object"), "{err}");
    assert_eq!(fs::read_to_string(&path).expect("settings kept"), "[1, 2]");
}

#[tokio::test]
async fn valid_settings_file_keeps_operator_values() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let path = tmp.path().join("authority-audit.json");
    fs::write(&path, r#"{"model":"claude-sonnet","bindAddress":"0.0.0.0:9000"}"#).expect("write settings");

    let settings = load_effective_settings(&path).expect("load settings");
    assert_eq!(settings.bind_address, "0.0.0.0:9000");
    assert_eq!(settings.completion.model, "claude-sonnet");

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).expect("settings written"))
        .expect("valid json");
    assert_eq!(written["model"], json!("claude-sonnet"));
    assert_eq!(written["schema_version"], json!(1));
}
