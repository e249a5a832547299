//! User-visible, non-fatal notices raised by feed operations.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeVariant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub variant: NoticeVariant,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn new(variant: NoticeVariant, title: &str, description: &str) -> Self {
        Self {
            variant,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    /// A like or unlike could not be persisted and was rolled back.
    pub fn action_failed() -> Self {
        Self::new(NoticeVariant::Destructive, "Action failed", "Please try again.")
    }

    pub fn post_created() -> Self {
        Self::new(
            NoticeVariant::Default,
            "Post created!",
            "Your post has been shared successfully.",
        )
    }

    pub fn post_failed() -> Self {
        Self::new(
            NoticeVariant::Destructive,
            "Failed to create post",
            "Please try again.",
        )
    }

    pub fn feed_unavailable() -> Self {
        Self::new(
            NoticeVariant::Destructive,
            "Couldn't load posts",
            "Please try again.",
        )
    }
}
