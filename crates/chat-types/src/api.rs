use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Chat, DeletedChat, DeletedMessage, Message};
use crate::validate::{
    chat_name_rules, member_ids, password_rules, positive_ids, required_id, required_text,
    username_rules,
};

// -- JWT Claims --

/// Claims carried by every bearer token. Shared between the token service
/// (issuing) and the auth middleware (verifying).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --
//
// Request bodies default every field so that a missing field reaches
// validation and is reported as "required" rather than as a decode failure.

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SignUpRequest {
    #[validate(
        length(max = 20, message = "cannot exceed 20 characters"),
        custom(function = "username_rules")
    )]
    pub username: String,
    #[validate(
        length(max = 12, message = "cannot exceed 12 characters"),
        custom(function = "password_rules")
    )]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SignInRequest {
    #[validate(
        length(max = 20, message = "cannot exceed 20 characters"),
        custom(function = "username_rules")
    )]
    pub username: String,
    #[validate(
        length(max = 12, message = "cannot exceed 12 characters"),
        custom(function = "password_rules")
    )]
    pub password: String,
}

// -- Chats --

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ChatAddRequest {
    #[validate(
        length(max = 20, message = "cannot exceed 20 characters"),
        custom(function = "chat_name_rules")
    )]
    pub chat_name: String,
    #[validate(
        required,
        length(min = 2, message = "must have at least 2 elements"),
        custom(function = "member_ids")
    )]
    pub users: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ChatGetRequest {
    /// Zero passes here and is refused by the identity check.
    #[validate(required)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ChatDeleteRequest {
    #[validate(
        required,
        length(min = 1, message = "must have at least 1 elements"),
        custom(function = "positive_ids")
    )]
    pub chat_ids: Option<Vec<i64>>,
}

// -- Messages --

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct MessageAddRequest {
    #[validate(custom(function = "required_id"))]
    pub chat_id: i64,
    #[validate(custom(function = "required_id"))]
    pub user_id: i64,
    #[validate(custom(function = "required_text"))]
    pub text: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct MessageGetRequest {
    #[validate(custom(function = "required_id"))]
    pub chat_id: i64,
    #[validate(required, range(min = 1, message = "must be greater than 0"))]
    pub limit: Option<i64>,
    #[validate(required, range(min = 0, message = "must not be negative"))]
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct MessageUpdateRequest {
    #[validate(custom(function = "required_id"))]
    pub message_id: i64,
    #[validate(custom(function = "required_id"))]
    pub user_id: i64,
    #[validate(custom(function = "required_text"))]
    pub new_text: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct MessageDeleteRequest {
    #[validate(
        required,
        length(min = 1, message = "must have at least 1 elements"),
        custom(function = "positive_ids")
    )]
    pub message_ids: Option<Vec<i64>>,
}

// -- Response envelope --

pub const STATUS_OK: &str = "OK";
pub const STATUS_ERROR: &str = "Error";

/// Body of every response, successful or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_list: Option<Vec<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chats_list: Option<Vec<Chat>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub del_chats_list: Option<Vec<DeletedChat>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub del_msg_list: Option<Vec<DeletedMessage>>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_chats(mut self, chats: Vec<Chat>) -> Self {
        self.chats_list = Some(chats);
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages_list = Some(messages);
        self
    }

    pub fn with_deleted_chats(mut self, outcomes: Vec<DeletedChat>) -> Self {
        self.del_chats_list = Some(outcomes);
        self
    }

    pub fn with_deleted_messages(mut self, outcomes: Vec<DeletedMessage>) -> Self {
        self.del_msg_list = Some(outcomes);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}
