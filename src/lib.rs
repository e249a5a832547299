pub mod compose;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod like_toggle;
pub mod logging;
pub mod lookup;
pub mod notice;
pub mod session;
pub mod storage;
pub mod store;
pub mod web_client;
