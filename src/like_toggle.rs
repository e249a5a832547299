//! Optimistic like/unlike for a single (post, viewer) pair.
//!
//! [`LikeToggle`] is the pure state machine: it flips the displayed state
//! and count as soon as a toggle starts, and either keeps or rolls back
//! that change once the store has answered. [`LikeController`] owns one
//! toggle per pair and performs the store calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::engagement::{engagement_for, Engagement};
use crate::error::FeedError;
use crate::logging;
use crate::lookup::LookupPolicy;
use crate::notice::Notice;
use crate::store::{StoreClient, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeState {
    Unliked,
    Liked,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Like,
    Unlike,
}

/// A toggle that has been started and awaits the store's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Begun {
    pub action: LikeAction,
    /// The optimistic decrement hit zero and was clamped.
    pub clamped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finished {
    pub state: LikeState,
    pub reverted: bool,
    /// The rollback decrement hit zero and was clamped.
    pub clamped: bool,
}

/// Displayed like state and count of one post for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeToggle {
    state: LikeState,
    in_flight: Option<LikeAction>,
    liked: bool,
    count: u32,
}

impl LikeToggle {
    pub fn new(liked: bool, count: u32) -> Self {
        Self {
            state: if liked {
                LikeState::Liked
            } else {
                LikeState::Unliked
            },
            in_flight: None,
            liked,
            count,
        }
    }

    pub fn from_engagement(engagement: &Engagement) -> Self {
        Self::new(engagement.liked_by_viewer, engagement.like_count)
    }

    pub fn state(&self) -> LikeState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == LikeState::Pending
    }

    /// Displayed liked flag, optimistic while pending.
    pub fn liked(&self) -> bool {
        self.liked
    }

    /// Displayed like count, optimistic while pending.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Start a toggle. Returns `None` while another toggle is in flight.
    pub fn begin(&mut self) -> Option<Begun> {
        let action = match self.state {
            LikeState::Pending => return None,
            LikeState::Unliked => LikeAction::Like,
            LikeState::Liked => LikeAction::Unlike,
        };

        let clamped = match action {
            LikeAction::Like => {
                self.liked = true;
                self.increment();
                false
            }
            LikeAction::Unlike => {
                self.liked = false;
                self.decrement()
            }
        };
        self.state = LikeState::Pending;
        self.in_flight = Some(action);
        Some(Begun { action, clamped })
    }

    /// Settle the in-flight toggle. On failure the optimistic change is
    /// undone. Calling this with nothing in flight changes nothing.
    pub fn finish(&mut self, succeeded: bool) -> Finished {
        let Some(action) = self.in_flight.take() else {
            return Finished {
                state: self.state,
                reverted: false,
                clamped: false,
            };
        };

        let mut clamped = false;
        self.state = match (action, succeeded) {
            (LikeAction::Like, true) => LikeState::Liked,
            (LikeAction::Unlike, true) => LikeState::Unliked,
            (LikeAction::Like, false) => {
                self.liked = false;
                clamped = self.decrement();
                LikeState::Unliked
            }
            (LikeAction::Unlike, false) => {
                self.liked = true;
                self.increment();
                LikeState::Liked
            }
        };

        Finished {
            state: self.state,
            reverted: !succeeded,
            clamped,
        }
    }

    fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Returns `true` if the count was already zero.
    fn decrement(&mut self) -> bool {
        match self.count.checked_sub(1) {
            Some(count) => {
                self.count = count;
                false
            }
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LikeKey {
    post_id: String,
    viewer_id: String,
}

impl LikeKey {
    fn new(post_id: &str, viewer_id: &str) -> Self {
        Self {
            post_id: post_id.to_string(),
            viewer_id: viewer_id.to_string(),
        }
    }
}

/// Displayed like state of a post at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeSnapshot {
    pub post_id: String,
    pub state: LikeState,
    pub liked: bool,
    pub like_count: u32,
}

impl LikeSnapshot {
    fn of(post_id: &str, toggle: &LikeToggle) -> Self {
        Self {
            post_id: post_id.to_string(),
            state: toggle.state(),
            liked: toggle.liked(),
            like_count: toggle.count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Anonymous viewers cannot like.
    NoViewer,
    /// A toggle for this pair is already in flight.
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Settled(LikeSnapshot),
    Ignored(IgnoreReason),
    Reverted {
        snapshot: LikeSnapshot,
        notice: Notice,
    },
}

/// A toggle plus the epoch at which a toggle last began or settled on it.
struct Tracked {
    toggle: LikeToggle,
    touched: u64,
}

impl Tracked {
    fn seeded(engagement: &Engagement) -> Self {
        Self {
            toggle: LikeToggle::from_engagement(engagement),
            touched: 0,
        }
    }
}

/// Owns the like toggles of one viewing session and talks to the store.
pub struct LikeController<S> {
    store: Arc<S>,
    policy: LookupPolicy,
    /// Advances whenever any toggle begins or settles.
    clock: AtomicU64,
    toggles: Mutex<HashMap<LikeKey, Tracked>>,
}

impl<S: StoreClient> LikeController<S> {
    pub fn new(store: Arc<S>, policy: LookupPolicy) -> Self {
        Self {
            store,
            policy,
            clock: AtomicU64::new(0),
            toggles: Mutex::new(HashMap::new()),
        }
    }

    /// Current epoch. Take it before reading engagement that will later be
    /// passed to [`seed`](Self::seed).
    pub fn epoch(&self) -> u64 {
        self.clock.load(Ordering::SeqCst)
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reset the toggle of a pair from engagement read at `read_epoch`.
    /// A toggle that is in flight, or that began or settled after
    /// `read_epoch`, is left alone. Returns whether the seed applied.
    pub async fn seed(
        &self,
        post_id: &str,
        viewer_id: &str,
        engagement: &Engagement,
        read_epoch: u64,
    ) -> bool {
        let mut toggles = self.toggles.lock().await;
        let key = LikeKey::new(post_id, viewer_id);
        match toggles.get(&key) {
            Some(existing) if existing.toggle.is_pending() => false,
            Some(existing) if existing.touched > read_epoch => false,
            _ => {
                toggles.insert(key, Tracked::seeded(engagement));
                true
            }
        }
    }

    pub async fn snapshot(&self, post_id: &str, viewer_id: &str) -> Option<LikeSnapshot> {
        let toggles = self.toggles.lock().await;
        toggles
            .get(&LikeKey::new(post_id, viewer_id))
            .map(|tracked| LikeSnapshot::of(post_id, &tracked.toggle))
    }

    /// Flip the like of `viewer_id` on `post_id`.
    ///
    /// The displayed state changes before the store is asked; a store
    /// failure rolls it back and yields a notice. Returns an error only if
    /// the pair was never seen and its current engagement cannot be read.
    pub async fn toggle_like(
        &self,
        post_id: &str,
        viewer_id: Option<&str>,
    ) -> Result<ToggleOutcome, FeedError> {
        let Some(viewer_id) = viewer_id else {
            return Ok(ToggleOutcome::Ignored(IgnoreReason::NoViewer));
        };
        let key = LikeKey::new(post_id, viewer_id);

        let known = self.toggles.lock().await.contains_key(&key);
        let seed = if known {
            None
        } else {
            Some(engagement_for(&*self.store, &self.policy, post_id, Some(viewer_id)).await?)
        };

        // Short lock: start the toggle
        let begun = {
            let mut toggles = self.toggles.lock().await;
            let tracked = toggles
                .entry(key.clone())
                .or_insert_with(|| Tracked::seeded(&seed.unwrap_or_default()));
            match tracked.toggle.begin() {
                Some(begun) => {
                    tracked.touched = self.tick();
                    begun
                }
                None => return Ok(ToggleOutcome::Ignored(IgnoreReason::Pending)),
            }
        };
        // Lock released

        if begun.clamped {
            crate::twarn!(
                "like: count of {} was already zero before unlike by {}",
                logging::post_id(post_id),
                logging::user_id(viewer_id)
            );
        }

        let result = match begun.action {
            LikeAction::Like => self.store.insert_like(post_id, viewer_id).await,
            LikeAction::Unlike => self.store.delete_like(post_id, viewer_id).await,
        };

        if let Err(ref e) = result {
            match e {
                StoreError::DuplicateKey { .. } => crate::tlog!(
                    "like: {} already liked by {}, reverting",
                    logging::post_id(post_id),
                    logging::user_id(viewer_id)
                ),
                StoreError::Unavailable(reason) => crate::tlog!(
                    "like: {:?} of {} by {} failed: {}",
                    begun.action,
                    logging::post_id(post_id),
                    logging::user_id(viewer_id),
                    reason
                ),
            }
        }

        // Short lock: settle
        let mut toggles = self.toggles.lock().await;
        let Some(tracked) = toggles.get_mut(&key) else {
            return Err(FeedError::StoreUnavailable(format!(
                "like state for {post_id} disappeared while pending"
            )));
        };
        let finished = tracked.toggle.finish(result.is_ok());
        tracked.touched = self.tick();
        let snapshot = LikeSnapshot::of(post_id, &tracked.toggle);

        if finished.clamped {
            crate::twarn!(
                "like: count of {} clamped at zero while reverting",
                logging::post_id(post_id)
            );
        }

        if finished.reverted {
            Ok(ToggleOutcome::Reverted {
                snapshot,
                notice: Notice::action_failed(),
            })
        } else {
            Ok(ToggleOutcome::Settled(snapshot))
        }
    }
}
