//! Shared fixtures: a seeded in-memory store and a fault-injecting wrapper.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Semaphore;

use feedline::storage::{LikeRow, PostRow, ProfileRow, Storage};
use feedline::store::{SqliteStore, StoreClient, StoreError};

pub fn memory_store() -> SqliteStore {
    SqliteStore::new(Storage::open_in_memory().expect("in-memory storage"))
}

pub fn post_row(id: &str, author_id: &str, created_at: u64) -> PostRow {
    PostRow {
        id: id.to_string(),
        content: format!("post {id}"),
        author_id: author_id.to_string(),
        created_at,
    }
}

pub fn profile_row(user_id: &str, display_name: &str) -> ProfileRow {
    ProfileRow {
        user_id: user_id.to_string(),
        username: user_id.to_string(),
        display_name: display_name.to_string(),
        avatar_url: None,
    }
}

pub async fn add_post(store: &SqliteStore, id: &str, author_id: &str, created_at: u64) {
    store
        .storage()
        .lock()
        .await
        .insert_post_row(&post_row(id, author_id, created_at))
        .expect("insert post");
}

pub async fn add_profile(store: &SqliteStore, user_id: &str, display_name: &str) {
    store
        .storage()
        .lock()
        .await
        .upsert_profile(&profile_row(user_id, display_name))
        .expect("insert profile");
}

pub async fn add_like(store: &SqliteStore, post_id: &str, user_id: &str) {
    store
        .storage()
        .lock()
        .await
        .insert_like(post_id, user_id)
        .expect("insert like");
}

pub async fn add_comment(store: &SqliteStore, post_id: &str, author_id: &str) {
    store
        .storage()
        .lock()
        .await
        .insert_comment(post_id, author_id, "a comment")
        .expect("insert comment");
}

pub async fn like_count(store: &SqliteStore, post_id: &str) -> u32 {
    store
        .storage()
        .lock()
        .await
        .count_likes(post_id)
        .expect("count likes")
}

fn unavailable(what: &str) -> StoreError {
    StoreError::Unavailable(format!("injected failure: {what}"))
}

/// Wraps a [`SqliteStore`] and fails, delays or holds selected calls.
pub struct FlakyStore {
    pub inner: SqliteStore,
    pub fail_select_posts: AtomicBool,
    pub fail_insert_like: AtomicBool,
    pub fail_delete_like: AtomicBool,
    pub fail_insert_post: AtomicBool,
    /// Author ids whose profile lookup fails.
    pub failing_profiles: Mutex<HashSet<String>>,
    /// Author ids whose profile lookup never completes.
    pub hanging_profiles: Mutex<HashSet<String>>,
    /// Post ids whose like/comment counts fail.
    pub failing_counts: Mutex<HashSet<String>>,
    /// Delays applied to successive `select_posts` answers, after the read.
    pub select_posts_delays: Mutex<VecDeque<Duration>>,
    hold_likes: AtomicBool,
    like_gate: Semaphore,
    pub select_posts_calls: AtomicUsize,
    pub insert_like_calls: AtomicUsize,
    pub delete_like_calls: AtomicUsize,
    pub insert_post_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            fail_select_posts: AtomicBool::new(false),
            fail_insert_like: AtomicBool::new(false),
            fail_delete_like: AtomicBool::new(false),
            fail_insert_post: AtomicBool::new(false),
            failing_profiles: Mutex::new(HashSet::new()),
            hanging_profiles: Mutex::new(HashSet::new()),
            failing_counts: Mutex::new(HashSet::new()),
            select_posts_delays: Mutex::new(VecDeque::new()),
            hold_likes: AtomicBool::new(false),
            like_gate: Semaphore::new(0),
            select_posts_calls: AtomicUsize::new(0),
            insert_like_calls: AtomicUsize::new(0),
            delete_like_calls: AtomicUsize::new(0),
            insert_post_calls: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &SqliteStore {
        &self.inner
    }

    /// Make like inserts and deletes wait until [`release_likes`] is called.
    pub fn hold_likes(&self) {
        self.hold_likes.store(true, Ordering::SeqCst);
    }

    pub fn release_likes(&self, count: usize) {
        self.like_gate.add_permits(count);
    }

    async fn pass_like_gate(&self) {
        if self.hold_likes.load(Ordering::SeqCst) {
            self.like_gate
                .acquire()
                .await
                .expect("like gate open")
                .forget();
        }
    }

    fn listed(set: &Mutex<HashSet<String>>, key: &str) -> bool {
        set.lock().unwrap().contains(key)
    }
}

impl StoreClient for FlakyStore {
    async fn select_posts(&self) -> Result<Vec<PostRow>, StoreError> {
        self.select_posts_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_select_posts.load(Ordering::SeqCst) {
            return Err(unavailable("select_posts"));
        }
        // Read first, answer late: a delayed call returns a stale snapshot.
        let posts = self.inner().select_posts().await;
        let delay = self.select_posts_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        posts
    }

    async fn select_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, StoreError> {
        if Self::listed(&self.hanging_profiles, user_id) {
            std::future::pending::<()>().await;
        }
        if Self::listed(&self.failing_profiles, user_id) {
            return Err(unavailable("select_profile"));
        }
        self.inner().select_profile(user_id).await
    }

    async fn count_likes(&self, post_id: &str) -> Result<u32, StoreError> {
        if Self::listed(&self.failing_counts, post_id) {
            return Err(unavailable("count_likes"));
        }
        self.inner().count_likes(post_id).await
    }

    async fn count_comments(&self, post_id: &str) -> Result<u32, StoreError> {
        if Self::listed(&self.failing_counts, post_id) {
            return Err(unavailable("count_comments"));
        }
        self.inner().count_comments(post_id).await
    }

    async fn find_like(&self, post_id: &str, user_id: &str) -> Result<Option<LikeRow>, StoreError> {
        self.inner().find_like(post_id, user_id).await
    }

    async fn insert_like(&self, post_id: &str, user_id: &str) -> Result<(), StoreError> {
        self.insert_like_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_like_gate().await;
        if self.fail_insert_like.load(Ordering::SeqCst) {
            return Err(unavailable("insert_like"));
        }
        self.inner().insert_like(post_id, user_id).await
    }

    async fn delete_like(&self, post_id: &str, user_id: &str) -> Result<(), StoreError> {
        self.delete_like_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_like_gate().await;
        if self.fail_delete_like.load(Ordering::SeqCst) {
            return Err(unavailable("delete_like"));
        }
        self.inner().delete_like(post_id, user_id).await
    }

    async fn insert_post(&self, content: &str, author_id: &str) -> Result<PostRow, StoreError> {
        self.insert_post_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert_post.load(Ordering::SeqCst) {
            return Err(unavailable("insert_post"));
        }
        self.inner().insert_post(content, author_id).await
    }
}
