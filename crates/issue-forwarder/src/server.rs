//! HTTP server hosting the issue forwarder web trigger.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue as HttpHeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::debug;

use crate::handler::IssueForwarder;
use crate::models::{HeaderValue, IncomingRequest, OutgoingResponse};

/// Response header carrying the trigger's status text.
pub const STATUS_TEXT_HEADER: &str = "x-status-text";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Request handler.
    pub forwarder: Arc<IssueForwarder>,
}

/// Build the HTTP router for the issue forwarder.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        // Raw HTTP form of the trigger
        .route("/webtrigger", post(webtrigger_handler))
        // Host envelope form: request and response as JSON documents
        .route("/invoke", post(invoke_handler))
        // Health check
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Handle a trigger delivered as a plain HTTP request.
pub async fn webtrigger_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let headers = collect_headers(&headers);

    debug!(
        header_count = headers.len(),
        body_len = body.len(),
        "Received web trigger"
    );

    let response = state.forwarder.handle_raw(headers, &body).await;
    into_http_response(response)
}

/// Handle a trigger delivered as a host envelope.
pub async fn invoke_handler(
    State(state): State<AppState>,
    Json(request): Json<IncomingRequest>,
) -> Json<OutgoingResponse> {
    Json(state.forwarder.handle(&request).await)
}

/// Convert HTTP headers into the trigger's header map.
///
/// Repeated headers become [`HeaderValue::Multiple`] in arrival order.
/// Values that are not valid UTF-8 are dropped.
#[must_use]
pub fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, HeaderValue> {
    let mut collected = BTreeMap::new();

    for name in headers.keys() {
        let mut values: Vec<String> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();

        let value = match values.len() {
            0 => continue,
            1 => HeaderValue::Single(values.remove(0)),
            _ => HeaderValue::Multiple(values),
        };
        collected.insert(name.as_str().to_string(), value);
    }

    collected
}

/// Map a trigger response onto an HTTP response.
#[must_use]
pub fn into_http_response(response: OutgoingResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut http_response = (status, response.body).into_response();
    let http_headers = http_response.headers_mut();
    http_headers.remove(CONTENT_TYPE);

    for (name, values) in &response.headers {
        let Ok(name) = HeaderName::try_from(name.as_str()) else {
            continue;
        };
        for value in values {
            if let Ok(value) = HttpHeaderValue::from_str(value) {
                http_headers.append(name.clone(), value);
            }
        }
    }

    if let Ok(status_text) = HttpHeaderValue::from_str(&response.status_text) {
        http_headers.insert(STATUS_TEXT_HEADER, status_text);
    }

    http_response
}
