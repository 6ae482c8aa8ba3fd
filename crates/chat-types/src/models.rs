use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Outcome of soft-deleting one chat in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedChat {
    pub chat_id: i64,
    pub result: String,
}

/// Outcome of soft-deleting one message in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedMessage {
    pub message_id: i64,
    pub result: String,
}
