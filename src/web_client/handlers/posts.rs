//! Post submission handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::{FeedError, ValidationError};
use crate::web_client::state::SharedState;
use crate::web_client::utils::{api_error, non_blank};

#[derive(Deserialize)]
pub struct CreatePostRequest {
    content: String,
    author_id: Option<String>,
}

pub async fn create_post_handler(
    State(state): State<SharedState>,
    axum::Json(req): axum::Json<CreatePostRequest>,
) -> Response {
    let Some(author_id) = non_blank(req.author_id) else {
        return api_error(
            StatusCode::UNAUTHORIZED,
            ValidationError::MissingActor.to_string(),
        );
    };

    let session = state.session(Some(&author_id)).await;
    let submission = session.submit_content(req.content.clone()).await;

    match submission.result {
        Ok(post) => {
            let json = serde_json::json!({
                "status": "created",
                "post": post,
                "notice": submission.notice,
            });
            (StatusCode::CREATED, axum::Json(json)).into_response()
        }
        Err(FeedError::Validation(e)) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e @ FeedError::StoreUnavailable(_)) => {
            let json = serde_json::json!({
                "error": e.to_string(),
                "notice": submission.notice,
                "draft": req.content,
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(json)).into_response()
        }
    }
}
