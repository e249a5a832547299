//! Route handler modules for the feedline REST API.

pub mod drafts;
pub mod feed;
pub mod health;
pub mod likes;
pub mod posts;
