//! Post submission: validation, persistence and the held draft.

use crate::error::{FeedError, ValidationError};
use crate::logging;
use crate::notice::Notice;
use crate::storage::PostRow;
use crate::store::StoreClient;

/// Longest accepted post, in characters, after trimming.
pub const MAX_POST_CHARS: usize = 280;

/// Trim `content` and check it is between 1 and [`MAX_POST_CHARS`]
/// characters long.
pub fn validate_content(content: &str) -> Result<&str, ValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    let len = trimmed.chars().count();
    if len > MAX_POST_CHARS {
        return Err(ValidationError::too_long(len));
    }
    Ok(trimmed)
}

/// Validate and store a post by `author_id`. Nothing reaches the store
/// unless both the author and the content are acceptable.
pub async fn submit_post<S: StoreClient>(
    store: &S,
    content: &str,
    author_id: Option<&str>,
) -> Result<PostRow, FeedError> {
    let author_id = author_id.ok_or(ValidationError::MissingActor)?;
    let content = validate_content(content)?;

    let post = store.insert_post(content, author_id).await?;
    crate::tlog!(
        "compose: {} posted {}",
        logging::user_id(author_id),
        logging::post_id(&post.id)
    );
    Ok(post)
}

/// Result of a submission attempt, with the notice to show for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub result: Result<PostRow, FeedError>,
    pub notice: Option<Notice>,
}

/// Holds the draft text between edits and submissions. The draft is
/// cleared only by a successful submission.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Characters typed so far, untrimmed, for a `n/280` counter.
    pub fn char_count(&self) -> usize {
        self.draft.chars().count()
    }

    /// Whether a submission could currently pass validation.
    pub fn can_submit(&self) -> bool {
        validate_content(&self.draft).is_ok()
    }

    /// Submit the draft as `author_id`.
    ///
    /// Validation failures come back without a notice; the caller shows
    /// them inline. Store failures carry the "failed to create" notice.
    pub async fn submit<S: StoreClient>(&mut self, store: &S, author_id: Option<&str>) -> Submission {
        let result = submit_post(store, &self.draft, author_id).await;
        let notice = match &result {
            Ok(_) => {
                self.draft.clear();
                Some(Notice::post_created())
            }
            Err(FeedError::Validation(_)) => None,
            Err(FeedError::StoreUnavailable(reason)) => {
                crate::tlog!("compose: post failed: {}", reason);
                Some(Notice::post_failed())
            }
        };
        Submission { result, notice }
    }
}
