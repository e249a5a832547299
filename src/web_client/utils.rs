//! Shared helpers for the HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::feed::FeedItem;
use crate::like_toggle::LikeSnapshot;
use crate::notice::Notice;

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, axum::Json(body)).into_response()
}

/// Error response that also carries a notice for the user.
pub fn notice_error(status: StatusCode, message: impl Into<String>, notice: &Notice) -> Response {
    let body = serde_json::json!({ "error": message.into(), "notice": notice });
    (status, axum::Json(body)).into_response()
}

/// Treat a missing or blank id as absent.
pub fn non_blank(id: Option<String>) -> Option<String> {
    id.filter(|v| !v.trim().is_empty())
}

/// JSON form of a feed item, with the author fallbacks applied.
pub fn feed_item_to_json(item: &FeedItem) -> serde_json::Value {
    serde_json::json!({
        "post_id": item.post.id,
        "content": item.post.content,
        "author_id": item.post.author_id,
        "created_at": item.post.created_at,
        "author": {
            "resolved": item.profile.is_some(),
            "display_name": item.display_name(),
            "username": item.username(),
            "handle": item.handle(),
            "avatar_url": item.avatar_url(),
            "avatar_initial": item.avatar_initial(),
        },
        "like_count": item.like_count(),
        "comment_count": item.comment_count(),
        "liked_by_viewer": item.liked_by_viewer(),
        "engagement_resolved": item.engagement.is_some(),
    })
}

pub fn like_snapshot_to_json(status: &str, snapshot: &LikeSnapshot) -> serde_json::Value {
    serde_json::json!({
        "status": status,
        "post_id": snapshot.post_id,
        "state": snapshot.state,
        "liked": snapshot.liked,
        "like_count": snapshot.like_count,
    })
}
