//! Feed and engagement handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::notice::Notice;
use crate::session::RefreshOutcome;
use crate::web_client::state::SharedState;
use crate::web_client::utils::{api_error, feed_item_to_json, non_blank, notice_error};

#[derive(Deserialize)]
pub struct ViewerQuery {
    pub(crate) viewer_id: Option<String>,
}

/// Refresh the viewer's feed and return it, newest post first.
pub async fn feed_handler(
    State(state): State<SharedState>,
    Query(query): Query<ViewerQuery>,
) -> Response {
    let viewer_id = non_blank(query.viewer_id);
    let session = state.session(viewer_id.as_deref()).await;

    let superseded = match session.refresh().await {
        Ok(RefreshOutcome::Applied(_)) => false,
        Ok(RefreshOutcome::Superseded) => true,
        Err(e) => {
            return notice_error(
                StatusCode::SERVICE_UNAVAILABLE,
                e.to_string(),
                &Notice::feed_unavailable(),
            )
        }
    };

    let items: Vec<serde_json::Value> = session.feed().await.iter().map(feed_item_to_json).collect();
    let json = serde_json::json!({
        "viewer_id": viewer_id,
        "superseded": superseded,
        "items": items,
    });
    (StatusCode::OK, axum::Json(json)).into_response()
}

pub async fn engagement_handler(
    State(state): State<SharedState>,
    Path(post_id): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> Response {
    let viewer_id = non_blank(query.viewer_id);
    let session = state.session(viewer_id.as_deref()).await;

    match session.engagement(&post_id).await {
        Ok(engagement) => {
            let json = serde_json::json!({
                "post_id": post_id,
                "like_count": engagement.like_count,
                "comment_count": engagement.comment_count,
                "liked_by_viewer": engagement.liked_by_viewer,
            });
            (StatusCode::OK, axum::Json(json)).into_response()
        }
        Err(e) => api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}
