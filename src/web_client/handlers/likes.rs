//! Like toggle handler.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::like_toggle::{IgnoreReason, ToggleOutcome};
use crate::web_client::state::SharedState;
use crate::web_client::utils::{api_error, like_snapshot_to_json, non_blank, notice_error};

#[derive(Deserialize)]
pub struct ToggleLikeRequest {
    viewer_id: Option<String>,
}

pub async fn toggle_like_handler(
    State(state): State<SharedState>,
    Path(post_id): Path<String>,
    axum::Json(req): axum::Json<ToggleLikeRequest>,
) -> Response {
    let Some(viewer_id) = non_blank(req.viewer_id) else {
        return api_error(StatusCode::BAD_REQUEST, "viewer_id is required to like a post");
    };

    // Short lock: verify the post exists
    match state.store.storage().lock().await.has_post(&post_id) {
        Ok(true) => {}
        Ok(false) => return api_error(StatusCode::NOT_FOUND, "post not found"),
        Err(e) => return api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }

    let session = state.session(Some(&viewer_id)).await;
    match session.toggle_like(&post_id).await {
        Ok(ToggleOutcome::Settled(snapshot)) => (
            StatusCode::OK,
            axum::Json(like_snapshot_to_json("ok", &snapshot)),
        )
            .into_response(),
        Ok(ToggleOutcome::Ignored(IgnoreReason::Pending)) => api_error(
            StatusCode::CONFLICT,
            "a like toggle for this post is already in progress",
        ),
        Ok(ToggleOutcome::Ignored(IgnoreReason::NoViewer)) => {
            api_error(StatusCode::BAD_REQUEST, "viewer_id is required to like a post")
        }
        Ok(ToggleOutcome::Reverted { snapshot, notice }) => {
            let mut json = like_snapshot_to_json("reverted", &snapshot);
            json["notice"] = serde_json::json!(notice);
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(json)).into_response()
        }
        Err(e) => notice_error(
            StatusCode::SERVICE_UNAVAILABLE,
            e.to_string(),
            &crate::notice::Notice::action_failed(),
        ),
    }
}
