//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::web_client::state::SharedState;
use crate::web_client::utils::api_error;

pub async fn health_handler(State(state): State<SharedState>) -> Response {
    let post_count = match state.store.storage().lock().await.count_posts() {
        Ok(count) => count,
        Err(e) => return api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    };

    let body = serde_json::json!({
        "status": "ok",
        "posts": post_count,
        "sessions": state.session_count().await,
        "lookup_timeout_ms": state.policy.timeout.as_millis() as u64,
    });
    (StatusCode::OK, axum::Json(body)).into_response()
}
