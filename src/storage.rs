//! SQLite storage layer for feedline.
//!
//! Owns the four record collections the feed is built from: posts,
//! profiles, likes and comments. Handles schema creation and the CRUD
//! operations the store client and the dev tooling need.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use rand::RngCore;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("already exists: {0}")]
    AlreadyExists(String),
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A short text post. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRow {
    pub id: String,
    pub content: String,
    pub author_id: String,
    /// Seconds since the UNIX epoch, assigned on insert.
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// One user's like of one post. `(post_id, user_id)` is the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRow {
    pub post_id: String,
    pub user_id: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: u64,
}

// ---------------------------------------------------------------------------
// Storage handle
// ---------------------------------------------------------------------------

/// Main storage handle wrapping a SQLite connection.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create a database at the given path, creating the schema
    /// and the parent directory if needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let storage = Self {
            conn: Connection::open_in_memory()?,
        };
        storage.create_schema()?;
        Ok(storage)
    }

    fn create_schema(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS posts (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT NOT NULL UNIQUE,
                content     TEXT NOT NULL,
                author_id   TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_posts_created
                ON posts(created_at, seq);

            CREATE TABLE IF NOT EXISTS profiles (
                user_id         TEXT PRIMARY KEY,
                username        TEXT NOT NULL,
                display_name    TEXT NOT NULL,
                avatar_url      TEXT
            );

            CREATE TABLE IF NOT EXISTS likes (
                post_id     TEXT NOT NULL,
                user_id     TEXT NOT NULL,
                created_at  INTEGER NOT NULL,
                PRIMARY KEY (post_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id     TEXT NOT NULL,
                author_id   TEXT NOT NULL,
                body        TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_comments_post
                ON comments(post_id);
            ",
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    /// Store a new post authored by `author_id`. The timestamp is the
    /// current time, raised to the latest stored timestamp if the clock
    /// went backwards, so `created_at` never decreases across inserts.
    pub fn insert_post(&self, content: &str, author_id: &str) -> Result<PostRow, StorageError> {
        let latest: Option<i64> =
            self.conn
                .query_row("SELECT MAX(created_at) FROM posts", [], |row| row.get(0))?;
        let created_at = now_secs().max(latest.unwrap_or(0) as u64);

        let row = PostRow {
            id: derive_post_id(author_id, content, created_at),
            content: content.to_string(),
            author_id: author_id.to_string(),
            created_at,
        };
        self.insert_post_row(&row)?;
        Ok(row)
    }

    /// Store a fully formed post row, timestamp included.
    pub fn insert_post_row(&self, row: &PostRow) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO posts (id, content, author_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![row.id, row.content, row.author_id, row.created_at as i64],
            )
            .map_err(|e| constraint_to_exists(e, format!("post {}", row.id)))?;
        Ok(())
    }

    /// All posts, newest first. Posts sharing a timestamp come out in
    /// reverse insertion order.
    pub fn list_posts(&self) -> Result<Vec<PostRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, author_id, created_at
             FROM posts ORDER BY created_at DESC, seq DESC",
        )?;
        let rows = stmt.query_map([], post_from_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn count_posts(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn has_post(&self, post_id: &str) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // -----------------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------------

    pub fn upsert_profile(&self, row: &ProfileRow) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO profiles (user_id, username, display_name, avatar_url)
             VALUES (?1, ?2, ?3, ?4)",
            params![row.user_id, row.username, row.display_name, row.avatar_url],
        )?;
        Ok(())
    }

    pub fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, username, display_name, avatar_url
                 FROM profiles WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(ProfileRow {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        display_name: row.get(2)?,
                        avatar_url: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    // -----------------------------------------------------------------------
    // Likes
    // -----------------------------------------------------------------------

    /// Record that `user_id` likes `post_id`. A second like for the same
    /// pair fails with [`StorageError::AlreadyExists`].
    pub fn insert_like(&self, post_id: &str, user_id: &str) -> Result<LikeRow, StorageError> {
        let row = LikeRow {
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            created_at: now_secs(),
        };
        self.conn
            .execute(
                "INSERT INTO likes (post_id, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![row.post_id, row.user_id, row.created_at as i64],
            )
            .map_err(|e| constraint_to_exists(e, format!("like {post_id}/{user_id}")))?;
        Ok(row)
    }

    /// Remove a like. Returns whether a row was deleted.
    pub fn delete_like(&self, post_id: &str, user_id: &str) -> Result<bool, StorageError> {
        let affected = self.conn.execute(
            "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?;
        Ok(affected > 0)
    }

    pub fn get_like(&self, post_id: &str, user_id: &str) -> Result<Option<LikeRow>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT post_id, user_id, created_at FROM likes
                 WHERE post_id = ?1 AND user_id = ?2",
                params![post_id, user_id],
                |row| {
                    Ok(LikeRow {
                        post_id: row.get(0)?,
                        user_id: row.get(1)?,
                        created_at: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn count_likes(&self, post_id: &str) -> Result<u32, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    pub fn insert_comment(
        &self,
        post_id: &str,
        author_id: &str,
        body: &str,
    ) -> Result<CommentRow, StorageError> {
        let created_at = now_secs();
        self.conn.execute(
            "INSERT INTO comments (post_id, author_id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![post_id, author_id, body, created_at as i64],
        )?;
        Ok(CommentRow {
            id: self.conn.last_insert_rowid(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            body: body.to_string(),
            created_at,
        })
    }

    pub fn count_comments(&self, post_id: &str) -> Result<u32, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
            params![post_id],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }
}

fn post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        content: row.get(1)?,
        author_id: row.get(2)?,
        created_at: row.get::<_, i64>(3)? as u64,
    })
}

fn constraint_to_exists(error: rusqlite::Error, what: String) -> StorageError {
    match error.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StorageError::AlreadyExists(what),
        _ => StorageError::Sqlite(error),
    }
}

/// Content-derived post id: URL-safe base64 of SHA-256 over the author,
/// timestamp, content and a random salt.
pub fn derive_post_id(author_id: &str, content: &str, created_at: u64) -> String {
    let mut salt = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let mut hasher = Sha256::new();
    hasher.update(author_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(created_at.to_be_bytes());
    hasher.update(content.as_bytes());
    hasher.update(salt);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Resolve the database path: `{data_dir}/feedline.db`.
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("feedline.db")
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
