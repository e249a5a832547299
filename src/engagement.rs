//! Per-post engagement: like count, comment count and the viewer's like.

use serde::Serialize;

use crate::error::FeedError;
use crate::lookup::LookupPolicy;
use crate::store::StoreClient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Engagement {
    pub like_count: u32,
    pub comment_count: u32,
    pub liked_by_viewer: bool,
}

/// Compute the current engagement of `post_id` as seen by `viewer_id`.
///
/// The three lookups run concurrently and each is bounded by `policy`.
/// Without a viewer `liked_by_viewer` is `false` and no like lookup is
/// made. A missing like is an ordinary `false`, not an error.
pub async fn engagement_for<S: StoreClient>(
    store: &S,
    policy: &LookupPolicy,
    post_id: &str,
    viewer_id: Option<&str>,
) -> Result<Engagement, FeedError> {
    let likes = policy.bounded(store.count_likes(post_id));
    let comments = policy.bounded(store.count_comments(post_id));
    let liked = async {
        match viewer_id {
            Some(viewer) => policy
                .bounded(store.find_like(post_id, viewer))
                .await
                .map(|like| like.is_some()),
            None => Ok(false),
        }
    };

    let (like_count, comment_count, liked_by_viewer) = tokio::join!(likes, comments, liked);

    Ok(Engagement {
        like_count: like_count?,
        comment_count: comment_count?,
        liked_by_viewer: liked_by_viewer?,
    })
}
