//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::lookup::LookupPolicy;
use crate::session::FeedSession;
use crate::store::SqliteStore;

pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub policy: LookupPolicy,
    /// One session per viewer id; the anonymous viewer is keyed by `None`.
    sessions: Mutex<HashMap<Option<String>, Arc<FeedSession<SqliteStore>>>>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: SqliteStore, policy: LookupPolicy) -> Self {
        Self {
            store: Arc::new(store),
            policy,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The session of `viewer_id`, created on first use.
    pub async fn session(&self, viewer_id: Option<&str>) -> Arc<FeedSession<SqliteStore>> {
        let key = viewer_id.map(str::to_string);
        let mut sessions = self.sessions.lock().await;
        Arc::clone(sessions.entry(key.clone()).or_insert_with(|| {
            Arc::new(FeedSession::new(
                Arc::clone(&self.store),
                self.policy,
                key,
            ))
        }))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
