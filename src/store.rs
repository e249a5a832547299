//! The store client boundary.
//!
//! The feed core never touches SQL directly: it talks to a [`StoreClient`],
//! whose every call is asynchronous and may fail independently. The
//! production implementation is [`SqliteStore`]; tests substitute their own.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::storage::{LikeRow, PostRow, ProfileRow, Storage, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or failed while serving the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A like for this `(post, user)` pair already exists.
    #[error("duplicate like for post {post_id} by {user_id}")]
    DuplicateKey { post_id: String, user_id: String },
}

/// Query interface over the posts, profiles, likes and comments
/// collections.
pub trait StoreClient: Send + Sync {
    /// All posts ordered by creation time, newest first.
    fn select_posts(&self) -> impl Future<Output = Result<Vec<PostRow>, StoreError>> + Send;

    fn select_profile(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<ProfileRow>, StoreError>> + Send;

    fn count_likes(&self, post_id: &str) -> impl Future<Output = Result<u32, StoreError>> + Send;

    fn count_comments(&self, post_id: &str)
        -> impl Future<Output = Result<u32, StoreError>> + Send;

    /// Absence of a like is `Ok(None)`, never an error.
    fn find_like(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<LikeRow>, StoreError>> + Send;

    fn insert_like(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_like(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Persist a post. The store assigns its id and timestamp.
    fn insert_post(
        &self,
        content: &str,
        author_id: &str,
    ) -> impl Future<Output = Result<PostRow, StoreError>> + Send;
}

/// [`StoreClient`] backed by the SQLite [`Storage`].
///
/// Each call takes the connection lock only for the duration of one query.
#[derive(Clone)]
pub struct SqliteStore {
    storage: Arc<Mutex<Storage>>,
}

impl SqliteStore {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Direct access to the underlying storage, for seeding and tooling.
    pub fn storage(&self) -> &Arc<Mutex<Storage>> {
        &self.storage
    }
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl StoreClient for SqliteStore {
    async fn select_posts(&self) -> Result<Vec<PostRow>, StoreError> {
        Ok(self.storage.lock().await.list_posts()?)
    }

    async fn select_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, StoreError> {
        Ok(self.storage.lock().await.get_profile(user_id)?)
    }

    async fn count_likes(&self, post_id: &str) -> Result<u32, StoreError> {
        Ok(self.storage.lock().await.count_likes(post_id)?)
    }

    async fn count_comments(&self, post_id: &str) -> Result<u32, StoreError> {
        Ok(self.storage.lock().await.count_comments(post_id)?)
    }

    async fn find_like(&self, post_id: &str, user_id: &str) -> Result<Option<LikeRow>, StoreError> {
        Ok(self.storage.lock().await.get_like(post_id, user_id)?)
    }

    async fn insert_like(&self, post_id: &str, user_id: &str) -> Result<(), StoreError> {
        match self.storage.lock().await.insert_like(post_id, user_id) {
            Ok(_) => Ok(()),
            Err(StorageError::AlreadyExists(_)) => Err(StoreError::DuplicateKey {
                post_id: post_id.to_string(),
                user_id: user_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_like(&self, post_id: &str, user_id: &str) -> Result<(), StoreError> {
        // Deleting an absent like leaves the store in the requested state.
        self.storage.lock().await.delete_like(post_id, user_id)?;
        Ok(())
    }

    async fn insert_post(&self, content: &str, author_id: &str) -> Result<PostRow, StoreError> {
        Ok(self.storage.lock().await.insert_post(content, author_id)?)
    }
}
