//! Axum router construction.

use axum::routing::{get, post};
use axum::Router;

use crate::web_client::handlers;
use crate::web_client::state::SharedState;

/// Build the complete Axum router with all API routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        // Feed
        .route("/api/feed", get(handlers::feed::feed_handler))
        .route(
            "/api/posts/:post_id/engagement",
            get(handlers::feed::engagement_handler),
        )
        // Composer draft
        .route(
            "/api/draft",
            get(handlers::drafts::get_draft_handler).put(handlers::drafts::update_draft_handler),
        )
        // Posts and likes
        .route("/api/posts", post(handlers::posts::create_post_handler))
        .route(
            "/api/posts/:post_id/like",
            post(handlers::likes::toggle_like_handler),
        )
        .with_state(state)
}
