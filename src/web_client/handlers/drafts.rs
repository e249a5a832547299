//! Draft handlers: the composer's held text, counter and submit state.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::web_client::handlers::feed::ViewerQuery;
use crate::web_client::state::SharedState;
use crate::web_client::utils::non_blank;

pub async fn get_draft_handler(
    State(state): State<SharedState>,
    Query(query): Query<ViewerQuery>,
) -> Response {
    let session = state.session(non_blank(query.viewer_id).as_deref()).await;
    (StatusCode::OK, axum::Json(session.draft_status().await)).into_response()
}

#[derive(Deserialize)]
pub struct UpdateDraftRequest {
    viewer_id: Option<String>,
    content: String,
}

pub async fn update_draft_handler(
    State(state): State<SharedState>,
    axum::Json(req): axum::Json<UpdateDraftRequest>,
) -> Response {
    let session = state.session(non_blank(req.viewer_id).as_deref()).await;
    session.set_draft(req.content).await;
    (StatusCode::OK, axum::Json(session.draft_status().await)).into_response()
}
