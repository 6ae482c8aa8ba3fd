//! Capability traits over the store, one per service. `Database` implements
//! all of them; services depend only on the one they need.

use crate::StoreError;
use crate::models::{ChatRow, DeletionOutcome, MessageRow, UserRow};

pub trait UserStore: Send + Sync {
    /// Returns the new user's id, or `UniqueViolation` if the name is taken.
    fn create_user(&self, username: &str, encrypted_password: &str) -> Result<i64, StoreError>;

    fn find_user_by_username(&self, username: &str) -> Result<UserRow, StoreError>;
}

pub trait ChatStore: Send + Sync {
    /// Creates the chat and one membership per member atomically.
    fn create_chat(&self, name: &str, members: &[i64]) -> Result<i64, StoreError>;

    /// Chats `user_id` belongs to, most recently active first.
    fn get_chats(&self, user_id: i64) -> Result<Vec<ChatRow>, StoreError>;

    fn delete_chats(&self, chat_ids: &[i64], user_id: i64)
    -> Result<Vec<DeletionOutcome>, StoreError>;
}

pub trait MessageStore: Send + Sync {
    /// Stores the message and places it in the sender's membership of the chat.
    fn add_message(&self, chat_id: i64, user_id: i64, text: &str) -> Result<i64, StoreError>;

    fn get_messages(
        &self,
        chat_id: i64,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MessageRow>, StoreError>;

    fn update_message(&self, message_id: i64, user_id: i64, new_text: &str)
    -> Result<i64, StoreError>;

    fn delete_messages(
        &self,
        message_ids: &[i64],
        user_id: i64,
    ) -> Result<Vec<DeletionOutcome>, StoreError>;
}
