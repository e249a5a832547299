//! Failure taxonomy shared by the feed operations.

use crate::compose::MAX_POST_CHARS;
use crate::store::StoreError;

/// Input rejected before any store call was made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("post content is empty")]
    EmptyContent,
    #[error("post content is {len} characters, the limit is {max}")]
    ContentTooLong { len: usize, max: usize },
    #[error("an authenticated author is required")]
    MissingActor,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for FeedError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(reason) => FeedError::StoreUnavailable(reason),
            dup @ StoreError::DuplicateKey { .. } => FeedError::StoreUnavailable(dup.to_string()),
        }
    }
}

impl ValidationError {
    pub(crate) fn too_long(len: usize) -> Self {
        ValidationError::ContentTooLong {
            len,
            max: MAX_POST_CHARS,
        }
    }
}
