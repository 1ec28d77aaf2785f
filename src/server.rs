use crate::commands::analyze::{parse_request, Analyzer};
use crate::error::AnalysisError;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Slack on top of the fetch and completion timeouts before the request is cut.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);
const RENDER_SETTLE_ALLOWANCE: Duration = Duration::from_secs(1);

pub fn router(analyzer: Arc<Analyzer>) -> Router {
    let settings = analyzer.settings();
    // A failed render is followed by a plain GET, each bounded by the fetch timeout.
    let fetch_attempts = if settings.fetch.render { 2 } else { 1 };
    let request_timeout = Duration::from_millis(settings.fetch.timeout_ms) * fetch_attempts
        + RENDER_SETTLE_ALLOWANCE * (fetch_attempts - 1)
        + Duration::from_secs(settings.completion.timeout_secs)
        + REQUEST_TIMEOUT_MARGIN;

    Router::new()
        .route("/api/analyze", post(analyze).fallback(method_not_allowed))
        .route(
            "/.netlify/functions/analyze",
            post(analyze).fallback(method_not_allowed),
        )
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(analyzer)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(request_timeout))
}

pub async fn serve(analyzer: Arc<Analyzer>) -> anyhow::Result<()> {
    let addr = analyzer.settings().bind_address.clone();
    let app = router(analyzer);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn analyze(State(analyzer): State<Arc<Analyzer>>, body: Bytes) -> Result<Response, AnalysisError> {
    let request = parse_request(&body)?;
    let report = analyzer.analyze(&request).await?;
    Ok(([(header::CACHE_CONTROL, "no-cache")], Json(report)).into_response())
}

async fn method_not_allowed(method: Method) -> Response {
    log::warn!("rejected {method} request to analysis endpoint");
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AnalysisError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
            AnalysisError::CompletionProviderUnavailable(_)
            | AnalysisError::MalformedCompletion { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Analysis failed")
            }
        };

        let body = json!({
            "error": error,
            "details": self.details(),
            "tip": self.tip(),
        });
        (status, Json(body)).into_response()
    }
}
