//! Feed assembly: posts joined with their author profile and engagement.

use futures_util::future::join_all;
use serde::Serialize;

use crate::engagement::{engagement_for, Engagement};
use crate::error::FeedError;
use crate::logging;
use crate::lookup::LookupPolicy;
use crate::storage::{PostRow, ProfileRow};
use crate::store::StoreClient;

pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown User";
pub const UNKNOWN_USERNAME: &str = "unknown";

/// One denormalized entry of the feed. Rebuilt on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub post: PostRow,
    /// `None` when the author has no profile or it could not be loaded.
    pub profile: Option<ProfileRow>,
    /// `None` when the engagement lookup failed or timed out.
    pub engagement: Option<Engagement>,
}

impl FeedItem {
    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.display_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_DISPLAY_NAME)
    }

    pub fn username(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.username.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_USERNAME)
    }

    /// The username as shown next to the display name, e.g. `@alice`.
    pub fn handle(&self) -> String {
        format!("@{}", self.username())
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|p| p.avatar_url.as_deref())
    }

    /// Fallback avatar letter: first character of the display name, or `U`.
    pub fn avatar_initial(&self) -> String {
        self.profile
            .as_ref()
            .and_then(|p| p.display_name.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }

    pub fn like_count(&self) -> u32 {
        self.engagement.map(|e| e.like_count).unwrap_or(0)
    }

    pub fn comment_count(&self) -> u32 {
        self.engagement.map(|e| e.comment_count).unwrap_or(0)
    }

    pub fn liked_by_viewer(&self) -> bool {
        self.engagement.map(|e| e.liked_by_viewer).unwrap_or(false)
    }
}

/// Build the feed for `viewer_id`, newest post first.
///
/// Fails only if the post list itself cannot be read. Profile and
/// engagement lookups are issued for all posts at once; a failing or slow
/// lookup degrades that one item and never reorders or drops it.
pub async fn assemble_feed<S: StoreClient>(
    store: &S,
    policy: &LookupPolicy,
    viewer_id: Option<&str>,
) -> Result<Vec<FeedItem>, FeedError> {
    let posts = policy.bounded(store.select_posts()).await?;
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let items = join_all(
        posts
            .into_iter()
            .map(|post| enrich(store, policy, post, viewer_id)),
    )
    .await;

    crate::tlog!("feed: assembled {} item(s)", items.len());
    Ok(items)
}

async fn enrich<S: StoreClient>(
    store: &S,
    policy: &LookupPolicy,
    post: PostRow,
    viewer_id: Option<&str>,
) -> FeedItem {
    let (profile, engagement) = tokio::join!(
        policy.bounded(store.select_profile(&post.author_id)),
        engagement_for(store, policy, &post.id, viewer_id),
    );

    let profile = profile.unwrap_or_else(|e| {
        crate::tlog!(
            "feed: profile of {} unavailable for {}: {}",
            logging::user_id(&post.author_id),
            logging::post_id(&post.id),
            e
        );
        None
    });

    let engagement = match engagement {
        Ok(engagement) => Some(engagement),
        Err(e) => {
            crate::tlog!(
                "feed: engagement unavailable for {}: {}",
                logging::post_id(&post.id),
                e
            );
            None
        }
    };

    FeedItem {
        post,
        profile,
        engagement,
    }
}
