//! HTTP surface: health probe and the scrape endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chatscrape_web::browser::BrowserCapturer;
use chatscrape_web::service::{ScrapeError, ScrapeService};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build the router around a shared scrape service.
pub fn build_router<C: BrowserCapturer + 'static>(service: Arc<ScrapeService<C>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/scrape", post(scrape::<C>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

struct ApiError(ScrapeError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self.0 {
            ScrapeError::MissingUrl => (StatusCode::BAD_REQUEST, "URL is required", None),
            ScrapeError::InvalidUrl { .. } => {
                (StatusCode::BAD_REQUEST, "Invalid URL", Some(self.0.to_string()))
            }
            ScrapeError::Timeout(_) => {
                (StatusCode::GATEWAY_TIMEOUT, "Scrape failed", Some(self.0.to_string()))
            }
            ScrapeError::Capture(_) | ScrapeError::Extraction(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Scrape failed",
                Some(self.0.to_string()),
            ),
        };
        (status, Json(ErrorBody { error, details })).into_response()
    }
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// POST /scrape with `{"url": "..."}`.
///
/// The body is parsed leniently: anything that is not an object carrying a
/// string `url` is treated as a missing URL.
async fn scrape<C: BrowserCapturer + 'static>(
    State(service): State<Arc<ScrapeService<C>>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ScrapeRequest = serde_json::from_slice(&body).unwrap_or_default();
    let url = request.url.unwrap_or_default();

    match service.scrape(&url).await {
        Ok(response) => Ok(Json(response).into_response()),
        Err(err) => {
            warn!(target: "server", error = %err, "scrape request failed");
            Err(ApiError(err))
        }
    }
}
