//! Business layer between the handlers and the store. Each service holds
//! only the store capability it needs.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use chat_crypto::{CipherError, SecretCipher};
use chat_db::models::{ChatRow, DeletionOutcome, DeletionResult, MessageRow};
use chat_db::{ChatStore, ErrorKind, MessageStore, StoreError, UserStore};
use chat_types::models::{Chat, DeletedChat, DeletedMessage, Message};

use crate::token::{TokenError, TokenService};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserExists,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// -- Auth --

pub struct AuthService {
    users: Arc<dyn UserStore>,
    cipher: SecretCipher,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, cipher: SecretCipher, tokens: TokenService) -> Self {
        Self { users, cipher, tokens }
    }

    /// Encrypts the password and stores the user. The password is sealed
    /// before storage is touched, so a bad cipher key never writes a row.
    pub fn create_user(&self, username: &str, password: &str) -> Result<i64, AuthError> {
        let encrypted = self.cipher.encrypt(password)?;

        self.users
            .create_user(username, &encrypted)
            .map_err(|e| match e.kind() {
                ErrorKind::UniqueViolation => AuthError::UserExists,
                _ => AuthError::Store(e),
            })
    }

    pub fn generate_token(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .users
            .find_user_by_username(username)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => AuthError::UserNotFound,
                _ => AuthError::Store(e),
            })?;

        let stored = self.cipher.decrypt(&user.password)?;
        if stored != password {
            return Err(AuthError::IncorrectPassword);
        }

        let token = self.tokens.issue(user.id)?;
        debug!(user_id = user.id, "token issued");
        Ok(token)
    }

    pub fn parse_token(&self, token: &str) -> Result<i64, TokenError> {
        self.tokens.parse(token)
    }
}

// -- Chats --

pub const CHAT_DELETED: &str = "Chat successfully deleted";
pub const CHAT_NOT_DELETED: &str = "Chat does not exist or has already been deleted";

pub struct ChatService {
    store: Arc<dyn ChatStore>,
}

impl ChatService {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    pub fn create_chat(&self, name: &str, members: &[i64]) -> Result<i64, StoreError> {
        let id = self.store.create_chat(name, members)?;
        info!(chat_id = id, "chat created");
        Ok(id)
    }

    pub fn get_chats(&self, user_id: i64) -> Result<Vec<Chat>, StoreError> {
        Ok(self.store.get_chats(user_id)?.into_iter().map(chat_from_row).collect())
    }

    pub fn delete_chats(&self, chat_ids: &[i64], user_id: i64) -> Result<Vec<DeletedChat>, StoreError> {
        let outcomes = self.store.delete_chats(chat_ids, user_id)?;
        Ok(outcomes
            .into_iter()
            .map(|DeletionOutcome { id, result }| DeletedChat {
                chat_id: id,
                result: describe_outcome(result, CHAT_DELETED, CHAT_NOT_DELETED),
            })
            .collect())
    }
}

// -- Messages --

pub const MESSAGE_DELETED: &str = "Message successfully deleted";
pub const MESSAGE_NOT_DELETED: &str = "Message does not exist or has already been deleted";

pub struct MessageService {
    store: Arc<dyn MessageStore>,
}

impl MessageService {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    pub fn add_message(&self, chat_id: i64, user_id: i64, text: &str) -> Result<i64, StoreError> {
        let id = self.store.add_message(chat_id, user_id, text)?;
        info!(message_id = id, chat_id, "message created");
        Ok(id)
    }

    pub fn get_messages(
        &self,
        chat_id: i64,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = self.store.get_messages(chat_id, user_id, limit, offset)?;
        Ok(rows.into_iter().map(message_from_row).collect())
    }

    pub fn update_message(&self, message_id: i64, user_id: i64, new_text: &str) -> Result<i64, StoreError> {
        self.store.update_message(message_id, user_id, new_text)
    }

    pub fn delete_messages(
        &self,
        message_ids: &[i64],
        user_id: i64,
    ) -> Result<Vec<DeletedMessage>, StoreError> {
        let outcomes = self.store.delete_messages(message_ids, user_id)?;
        Ok(outcomes
            .into_iter()
            .map(|DeletionOutcome { id, result }| DeletedMessage {
                message_id: id,
                result: describe_outcome(result, MESSAGE_DELETED, MESSAGE_NOT_DELETED),
            })
            .collect())
    }
}

fn describe_outcome(result: DeletionResult, deleted: &str, missing: &str) -> String {
    match result {
        DeletionResult::Deleted => deleted.to_string(),
        DeletionResult::Missing => missing.to_string(),
        DeletionResult::Failed(reason) => reason,
    }
}

fn chat_from_row(row: ChatRow) -> Chat {
    Chat {
        id: row.id,
        name: row.name,
        created_at: row.created_at,
        is_deleted: row.is_deleted,
    }
}

fn message_from_row(row: MessageRow) -> Message {
    Message {
        id: row.id,
        text: row.text,
        user_id: row.user_id,
        created_at: row.created_at,
        is_deleted: row.is_deleted,
    }
}
