use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, warn};

use crate::Database;
use crate::error::{StoreError, sanitize};
use crate::models::{ChatRow, DeletionOutcome, DeletionResult, MessageRow, UserRow};
use crate::store::{ChatStore, MessageStore, UserStore};

const OP_CREATE_USER: &str = "db.CreateUser";
const OP_GET_USER: &str = "db.GetUser";
const OP_CREATE_CHAT: &str = "db.CreateChat";
const OP_GET_CHAT: &str = "db.GetChat";
const OP_DELETE_CHAT: &str = "db.DeleteChat";
const OP_ADD_MESSAGE: &str = "db.AddMessage";
const OP_GET_MESSAGE: &str = "db.GetMessage";
const OP_UPDATE_MESSAGE: &str = "db.UpdateMessage";
const OP_DELETE_MESSAGE: &str = "db.DeleteMessage";

// -- Users --

impl UserStore for Database {
    fn create_user(&self, username: &str, encrypted_password: &str) -> Result<i64, StoreError> {
        if username.is_empty() || encrypted_password.is_empty() {
            return Err(StoreError::Invalid {
                op: OP_CREATE_USER,
                message: "username or password is empty".to_string(),
            });
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                params![username, encrypted_password],
            )
            .map_err(StoreError::sqlite(OP_CREATE_USER))?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn find_user_by_username(&self, username: &str) -> Result<UserRow, StoreError> {
        if username.is_empty() {
            return Err(StoreError::Invalid {
                op: OP_GET_USER,
                message: "username is empty".to_string(),
            });
        }

        self.with_conn(|conn| query_user_by_username(conn, username))?
            .ok_or_else(|| StoreError::NotFound {
                op: OP_GET_USER,
                message: "User not found".to_string(),
            })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, username, password_hash, created_at, is_deleted
             FROM users WHERE username = ?1",
        )
        .map_err(StoreError::sqlite(OP_GET_USER))?;

    stmt.query_row([username], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            created_at: timestamp(row, 3)?,
            is_deleted: row.get(4)?,
        })
    })
    .optional()
    .map_err(StoreError::sqlite(OP_GET_USER))
}

// -- Chats --

impl ChatStore for Database {
    fn create_chat(&self, name: &str, members: &[i64]) -> Result<i64, StoreError> {
        self.with_conn_mut(|conn| {
            // Dropping `tx` on any early return rolls back the chat row too
            let tx = conn.transaction().map_err(StoreError::sqlite(OP_CREATE_CHAT))?;

            tx.execute("INSERT INTO chats (name) VALUES (?1)", [name])
                .map_err(StoreError::sqlite(OP_CREATE_CHAT))?;
            let chat_id = tx.last_insert_rowid();

            {
                let mut stmt = tx
                    .prepare("INSERT INTO memberships (user_id, chat_id) VALUES (?1, ?2)")
                    .map_err(StoreError::sqlite(OP_CREATE_CHAT))?;

                for &member in members {
                    stmt.execute(params![member, chat_id])
                        .map_err(|e| membership_error(member, StoreError::sqlite(OP_CREATE_CHAT)(e)))?;
                }
            }

            tx.commit().map_err(StoreError::sqlite(OP_CREATE_CHAT))?;
            debug!(chat_id, members = members.len(), "chat created");
            Ok(chat_id)
        })
    }

    fn get_chats(&self, user_id: i64) -> Result<Vec<ChatRow>, StoreError> {
        self.with_conn(|conn| query_chats(conn, user_id))
    }

    fn delete_chats(
        &self,
        chat_ids: &[i64],
        user_id: i64,
    ) -> Result<Vec<DeletionOutcome>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "UPDATE chats SET is_deleted = 1
                     WHERE id = ?1
                       AND is_deleted = 0
                       AND EXISTS (SELECT 1 FROM memberships WHERE chat_id = ?1 AND user_id = ?2)",
                )
                .map_err(StoreError::sqlite(OP_DELETE_CHAT))?;

            Ok(chat_ids
                .iter()
                .map(|&id| outcome(OP_DELETE_CHAT, id, stmt.execute(params![id, user_id])))
                .collect())
        })
    }
}

/// Failures while linking members are about the member, not the chat.
fn membership_error(member: i64, err: StoreError) -> StoreError {
    match err {
        StoreError::NotFound { op, .. } => StoreError::NotFound {
            op,
            message: format!("User with userID {member} does not exist"),
        },
        StoreError::UniqueViolation { op } => StoreError::Invalid {
            op,
            message: format!("User with userID {member} is listed more than once"),
        },
        other => other,
    }
}

fn query_chats(conn: &Connection, user_id: i64) -> Result<Vec<ChatRow>, StoreError> {
    // Chats with messages come first, newest activity first; chats without
    // messages follow, newest first.
    let mut stmt = conn
        .prepare(
            "WITH activity AS (
                 SELECT DISTINCT mb.chat_id,
                        MAX(msg.created_at) OVER (PARTITION BY mb.chat_id) AS last_message_at,
                        MAX(msg.id) OVER (PARTITION BY mb.chat_id) AS last_message_id
                 FROM placements p
                 JOIN memberships mb ON mb.id = p.membership_id
                 JOIN messages msg ON msg.id = p.message_id
                 WHERE msg.is_deleted = 0
             )
             SELECT c.id, c.name, c.created_at, c.is_deleted
             FROM memberships m
             JOIN chats c ON c.id = m.chat_id
             LEFT JOIN activity a ON a.chat_id = c.id
             WHERE m.user_id = ?1 AND c.is_deleted = 0
             ORDER BY a.last_message_at DESC NULLS LAST,
                      a.last_message_id DESC NULLS LAST,
                      c.created_at DESC,
                      c.id DESC",
        )
        .map_err(StoreError::sqlite(OP_GET_CHAT))?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(ChatRow {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: timestamp(row, 2)?,
                is_deleted: row.get(3)?,
            })
        })
        .map_err(StoreError::sqlite(OP_GET_CHAT))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::sqlite(OP_GET_CHAT))?;

    Ok(rows)
}

// -- Messages --

impl MessageStore for Database {
    fn add_message(&self, chat_id: i64, user_id: i64, text: &str) -> Result<i64, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction().map_err(StoreError::sqlite(OP_ADD_MESSAGE))?;

            tx.execute(
                "INSERT INTO messages (text, user_id) VALUES (?1, ?2)",
                params![text, user_id],
            )
            .map_err(StoreError::sqlite(OP_ADD_MESSAGE))?;
            let message_id = tx.last_insert_rowid();

            let placed = tx
                .execute(
                    "INSERT INTO placements (membership_id, message_id)
                     SELECT m.id, ?3
                     FROM memberships m
                     JOIN chats c ON c.id = m.chat_id
                     WHERE m.user_id = ?1 AND m.chat_id = ?2 AND c.is_deleted = 0",
                    params![user_id, chat_id, message_id],
                )
                .map_err(StoreError::sqlite(OP_ADD_MESSAGE))?;

            // No membership row for (user, chat): the sender is not in this chat
            if placed == 0 {
                return Err(StoreError::Forbidden {
                    op: OP_ADD_MESSAGE,
                    message: "Invalid chat_id".to_string(),
                });
            }

            tx.commit().map_err(StoreError::sqlite(OP_ADD_MESSAGE))?;
            Ok(message_id)
        })
    }

    fn get_messages(
        &self,
        chat_id: i64,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MessageRow>, StoreError> {
        self.with_conn(|conn| {
            let members = query_chat_members(conn, chat_id)?;
            if !members.contains(&user_id) {
                return Err(StoreError::Forbidden {
                    op: OP_GET_MESSAGE,
                    message: format!("User with userID {user_id} does not exist in chatID {chat_id}"),
                });
            }

            query_messages(conn, chat_id, limit, offset)
        })
    }

    fn update_message(
        &self,
        message_id: i64,
        user_id: i64,
        new_text: &str,
    ) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE messages SET text = ?1
                     WHERE id = ?2 AND user_id = ?3 AND is_deleted = 0",
                    params![new_text, message_id, user_id],
                )
                .map_err(StoreError::sqlite(OP_UPDATE_MESSAGE))?;

            if updated == 0 {
                return Err(StoreError::Forbidden {
                    op: OP_UPDATE_MESSAGE,
                    message: "Invalid message_id OR user_id".to_string(),
                });
            }
            Ok(message_id)
        })
    }

    fn delete_messages(
        &self,
        message_ids: &[i64],
        user_id: i64,
    ) -> Result<Vec<DeletionOutcome>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "UPDATE messages SET is_deleted = 1
                     WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0",
                )
                .map_err(StoreError::sqlite(OP_DELETE_MESSAGE))?;

            Ok(message_ids
                .iter()
                .map(|&id| outcome(OP_DELETE_MESSAGE, id, stmt.execute(params![id, user_id])))
                .collect())
        })
    }
}

fn query_chat_members(conn: &Connection, chat_id: i64) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT m.user_id
             FROM memberships m
             JOIN chats c ON c.id = m.chat_id
             WHERE m.chat_id = ?1 AND c.is_deleted = 0",
        )
        .map_err(StoreError::sqlite(OP_GET_MESSAGE))?;

    let members = stmt
        .query_map([chat_id], |row| row.get(0))
        .map_err(StoreError::sqlite(OP_GET_MESSAGE))?
        .collect::<Result<Vec<i64>, _>>()
        .map_err(StoreError::sqlite(OP_GET_MESSAGE))?;

    Ok(members)
}

fn query_messages(
    conn: &Connection,
    chat_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<MessageRow>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT msg.id, msg.text, msg.user_id, msg.created_at, msg.is_deleted
             FROM placements p
             JOIN memberships m ON m.id = p.membership_id
             JOIN messages msg ON msg.id = p.message_id
             WHERE m.chat_id = ?1 AND msg.is_deleted = 0
             ORDER BY msg.created_at ASC, msg.id ASC
             LIMIT ?2 OFFSET ?3",
        )
        .map_err(StoreError::sqlite(OP_GET_MESSAGE))?;

    let rows = stmt
        .query_map(params![chat_id, limit, offset], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                text: row.get(1)?,
                user_id: row.get(2)?,
                created_at: timestamp(row, 3)?,
                is_deleted: row.get(4)?,
            })
        })
        .map_err(StoreError::sqlite(OP_GET_MESSAGE))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::sqlite(OP_GET_MESSAGE))?;

    Ok(rows)
}

/// Columns are written by `strftime('%Y-%m-%dT%H:%M:%fZ')`, which is RFC 3339.
fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// One soft-delete statement's result. A failing id is reported in place so
/// the rest of the batch still runs.
fn outcome(op: &'static str, id: i64, executed: rusqlite::Result<usize>) -> DeletionOutcome {
    let result = match executed {
        Ok(0) => DeletionResult::Missing,
        Ok(_) => DeletionResult::Deleted,
        Err(e) => {
            warn!("{}: soft delete of {} failed: {}", op, id, e);
            DeletionResult::Failed(sanitize(&e.to_string()))
        }
    };
    DeletionOutcome { id, result }
}
