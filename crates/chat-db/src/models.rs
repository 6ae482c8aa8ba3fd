//! Database row types. These map directly to SQLite rows and are kept
//! independent of the chat-types API models.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeletionResult {
    Deleted,
    /// Absent, already deleted, or not within the requester's reach.
    Missing,
    /// The statement for this id failed; the rest of the batch still ran.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletionOutcome {
    pub id: i64,
    pub result: DeletionResult,
}
