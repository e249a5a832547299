//! A viewing session: the displayed feed of one viewer, its like toggles
//! and its post draft.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::compose::{Composer, Submission, MAX_POST_CHARS};
use crate::engagement::{engagement_for, Engagement};
use crate::error::FeedError;
use crate::feed::{assemble_feed, FeedItem};
use crate::like_toggle::{LikeController, ToggleOutcome};
use crate::lookup::LookupPolicy;
use crate::store::StoreClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The new feed is now displayed; carries its length.
    Applied(usize),
    /// A newer refresh started meanwhile; these results were dropped.
    Superseded,
}

/// What a composer shows next to the draft: a `n/280` counter and whether
/// the submit button is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftStatus {
    pub draft: String,
    pub char_count: usize,
    pub max_chars: usize,
    pub can_submit: bool,
}

#[derive(Default)]
struct FeedView {
    items: Vec<FeedItem>,
    loading: bool,
}

pub struct FeedSession<S> {
    store: Arc<S>,
    policy: LookupPolicy,
    viewer_id: Option<String>,
    generation: AtomicU64,
    view: Mutex<FeedView>,
    likes: LikeController<S>,
    composer: Mutex<Composer>,
}

impl<S: StoreClient> FeedSession<S> {
    /// A session for `viewer_id`; `None` is an anonymous viewer.
    pub fn new(store: Arc<S>, policy: LookupPolicy, viewer_id: Option<String>) -> Self {
        Self {
            likes: LikeController::new(Arc::clone(&store), policy),
            store,
            policy,
            viewer_id,
            generation: AtomicU64::new(0),
            view: Mutex::new(FeedView::default()),
            composer: Mutex::new(Composer::new()),
        }
    }

    pub fn viewer_id(&self) -> Option<&str> {
        self.viewer_id.as_deref()
    }

    pub async fn is_loading(&self) -> bool {
        self.view.lock().await.loading
    }

    /// Re-read the whole feed. Only the most recently started refresh may
    /// replace the displayed items; a failed refresh keeps the old ones.
    /// Like toggles touched while the read was running keep their state.
    pub async fn refresh(&self) -> Result<RefreshOutcome, FeedError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let read_epoch = self.likes.epoch();
        self.view.lock().await.loading = true;

        let result = assemble_feed(&*self.store, &self.policy, self.viewer_id()).await;

        let mut view = self.view.lock().await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            crate::tlog!("session: dropping results of superseded refresh #{}", ticket);
            return Ok(RefreshOutcome::Superseded);
        }
        view.loading = false;

        let items = result?;
        if let Some(viewer) = self.viewer_id() {
            for item in &items {
                if let Some(engagement) = &item.engagement {
                    self.likes
                        .seed(&item.post.id, viewer, engagement, read_epoch)
                        .await;
                }
            }
        }
        view.items = items;
        Ok(RefreshOutcome::Applied(view.items.len()))
    }

    /// The displayed feed, with each post's like state as currently shown
    /// by its toggle (optimistic while a toggle is pending).
    pub async fn feed(&self) -> Vec<FeedItem> {
        let mut items = self.view.lock().await.items.clone();
        let Some(viewer) = self.viewer_id() else {
            return items;
        };
        for item in &mut items {
            if let Some(snapshot) = self.likes.snapshot(&item.post.id, viewer).await {
                let engagement = item.engagement.get_or_insert_with(Engagement::default);
                engagement.like_count = snapshot.like_count;
                engagement.liked_by_viewer = snapshot.liked;
            }
        }
        items
    }

    /// Current engagement of one post for this session's viewer.
    pub async fn engagement(&self, post_id: &str) -> Result<Engagement, FeedError> {
        engagement_for(&*self.store, &self.policy, post_id, self.viewer_id()).await
    }

    pub async fn toggle_like(&self, post_id: &str) -> Result<ToggleOutcome, FeedError> {
        self.likes.toggle_like(post_id, self.viewer_id()).await
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.composer.lock().await.set_draft(text);
    }

    pub async fn draft(&self) -> String {
        self.composer.lock().await.draft().to_string()
    }

    /// Submit the draft as this session's viewer, then refresh the feed.
    pub async fn submit_post(&self) -> Submission {
        let submission = self
            .composer
            .lock()
            .await
            .submit(&*self.store, self.viewer_id())
            .await;
        self.refresh_after(&submission).await;
        submission
    }

    /// Replace the draft with `content` and submit it, holding the composer
    /// for both steps so concurrent submissions cannot swap drafts.
    pub async fn submit_content(&self, content: impl Into<String>) -> Submission {
        let submission = {
            let mut composer = self.composer.lock().await;
            composer.set_draft(content);
            composer.submit(&*self.store, self.viewer_id()).await
        };
        self.refresh_after(&submission).await;
        submission
    }

    /// Character count and submit readiness of the current draft. An
    /// anonymous session can never submit.
    pub async fn draft_status(&self) -> DraftStatus {
        let composer = self.composer.lock().await;
        DraftStatus {
            draft: composer.draft().to_string(),
            char_count: composer.char_count(),
            max_chars: MAX_POST_CHARS,
            can_submit: self.viewer_id.is_some() && composer.can_submit(),
        }
    }

    async fn refresh_after(&self, submission: &Submission) {
        if submission.result.is_ok() {
            if let Err(e) = self.refresh().await {
                crate::tlog!("session: refresh after post failed: {}", e);
            }
        }
    }
}
