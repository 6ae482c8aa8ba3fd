//! Field rules for request bodies.
//!
//! The request types derive [`Validate`] and point their `custom` rules at
//! the functions here. Each field reports at most its first violated rule.
//! Messages are rendered as `Field <Label> <rule text>` and joined in field
//! declaration order, which is why the request types list their fields in
//! [`RequestFields::FIELDS`].

use std::borrow::Cow;
use std::collections::HashSet;

use validator::{ValidationError, ValidationErrors};

use crate::api::{
    ChatAddRequest, ChatDeleteRequest, ChatGetRequest, MessageAddRequest, MessageDeleteRequest,
    MessageGetRequest, MessageUpdateRequest, SignInRequest, SignUpRequest,
};

/// Characters a username or chat name may not contain.
pub const FORBIDDEN_NAME_SYMBOLS: &str = "!@#$&*()?";
/// A password must contain at least one of these.
pub const REQUIRED_PASSWORD_SYMBOLS: &str = "@#$&*()";

pub const PASSWORD_MIN: usize = 6;
pub const CHAT_NAME_MIN: usize = 6;

const REQUIRED: &str = "is a required field";

/// JSON field names paired with the label used in error messages, in
/// declaration order.
pub trait RequestFields {
    const FIELDS: &'static [(&'static str, &'static str)];
}

/// Renders validation errors as one human-readable line.
pub fn describe<T: RequestFields>(errors: &ValidationErrors) -> String {
    let by_field = errors.field_errors();

    T::FIELDS
        .iter()
        .filter_map(|(key, label)| {
            let first = by_field
                .get(*key)?
                .iter()
                .min_by_key(|error| precedence(&error.code))?;
            Some(format!("Field {label} {}", rule_text(first)))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Presence is checked before size, and size before content.
fn precedence(code: &str) -> u8 {
    match code {
        "required" => 0,
        "length" | "range" | "min" | "max" => 1,
        _ => 2,
    }
}

fn rule_text(error: &ValidationError) -> &str {
    if let Some(message) = error.message.as_deref() {
        return message;
    }
    if error.code == "required" {
        return REQUIRED;
    }
    "is not valid"
}

// -- Rules --

fn violation(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

pub fn required_text(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(violation("required", REQUIRED.into()));
    }
    Ok(())
}

fn min_chars(value: &str, min: usize) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        return Err(violation("min", format!("must contain at least {min} characters")));
    }
    Ok(())
}

fn excludes_all(value: &str, symbols: &str) -> Result<(), ValidationError> {
    if value.chars().any(|c| symbols.contains(c)) {
        return Err(violation("excludesall", format!("must not contain symbols {symbols}")));
    }
    Ok(())
}

fn contains_any(value: &str, symbols: &str) -> Result<(), ValidationError> {
    if !value.chars().any(|c| symbols.contains(c)) {
        return Err(violation(
            "containsany",
            format!("must contain Latin letters and Arabic numerals, as well as the symbols {symbols}"),
        ));
    }
    Ok(())
}

/// Zero is what an absent id decodes to.
pub fn required_id(value: i64) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(violation("required", REQUIRED.into()));
    }
    if value < 0 {
        return Err(violation("gt", "must be greater than 0".into()));
    }
    Ok(())
}

pub fn positive_ids(ids: &[i64]) -> Result<(), ValidationError> {
    if ids.iter().any(|id| *id <= 0) {
        return Err(violation("gt", "must contain only ids greater than 0".into()));
    }
    Ok(())
}

pub fn member_ids(ids: &[i64]) -> Result<(), ValidationError> {
    positive_ids(ids)?;
    let unique: HashSet<i64> = ids.iter().copied().collect();
    if unique.len() != ids.len() {
        return Err(violation("unique", "must contain distinct values".into()));
    }
    Ok(())
}

// The length ceilings live on the fields. These cover presence, the floor
// and the symbol sets.

pub fn username_rules(value: &str) -> Result<(), ValidationError> {
    required_text(value)?;
    excludes_all(value, FORBIDDEN_NAME_SYMBOLS)
}

pub fn password_rules(value: &str) -> Result<(), ValidationError> {
    required_text(value)?;
    min_chars(value, PASSWORD_MIN)?;
    contains_any(value, REQUIRED_PASSWORD_SYMBOLS)
}

pub fn chat_name_rules(value: &str) -> Result<(), ValidationError> {
    required_text(value)?;
    min_chars(value, CHAT_NAME_MIN)?;
    excludes_all(value, FORBIDDEN_NAME_SYMBOLS)
}

// -- Field order --

impl RequestFields for SignUpRequest {
    const FIELDS: &'static [(&'static str, &'static str)] =
        &[("username", "Username"), ("password", "Password")];
}

impl RequestFields for SignInRequest {
    const FIELDS: &'static [(&'static str, &'static str)] =
        &[("username", "Username"), ("password", "Password")];
}

impl RequestFields for ChatAddRequest {
    const FIELDS: &'static [(&'static str, &'static str)] =
        &[("chat_name", "ChatName"), ("users", "Users")];
}

impl RequestFields for ChatGetRequest {
    const FIELDS: &'static [(&'static str, &'static str)] = &[("user_id", "UserID")];
}

impl RequestFields for ChatDeleteRequest {
    const FIELDS: &'static [(&'static str, &'static str)] = &[("chat_ids", "ChatIds")];
}

impl RequestFields for MessageAddRequest {
    const FIELDS: &'static [(&'static str, &'static str)] =
        &[("chat_id", "ChatID"), ("user_id", "UserID"), ("text", "Text")];
}

impl RequestFields for MessageGetRequest {
    const FIELDS: &'static [(&'static str, &'static str)] =
        &[("chat_id", "ChatID"), ("limit", "Limit"), ("offset", "Offset")];
}

impl RequestFields for MessageUpdateRequest {
    const FIELDS: &'static [(&'static str, &'static str)] =
        &[("message_id", "MessageID"), ("user_id", "UserID"), ("new_text", "NewText")];
}

impl RequestFields for MessageDeleteRequest {
    const FIELDS: &'static [(&'static str, &'static str)] = &[("message_ids", "MessageIds")];
}
