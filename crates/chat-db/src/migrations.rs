use rusqlite::Connection;
use tracing::info;

use crate::StoreError;

const OP: &str = "db.Migrate";

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")
        .map_err(StoreError::sqlite(OP))?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
        .map_err(StoreError::sqlite(OP))?;

    if version < 1 {
        info!("Running migration v1 (users, chats, memberships, messages, placements)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                is_deleted      INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE chats (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                is_deleted  INTEGER NOT NULL DEFAULT 0
            );

            -- Who belongs to which chat
            CREATE TABLE memberships (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                chat_id     INTEGER NOT NULL REFERENCES chats(id),
                UNIQUE(user_id, chat_id)
            );

            CREATE INDEX idx_memberships_chat ON memberships(chat_id);

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                text        TEXT NOT NULL,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                is_deleted  INTEGER NOT NULL DEFAULT 0
            );

            -- A message reaches a chat through its sender's membership row
            CREATE TABLE placements (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                membership_id   INTEGER NOT NULL REFERENCES memberships(id),
                message_id      INTEGER NOT NULL UNIQUE REFERENCES messages(id)
            );

            CREATE INDEX idx_placements_membership ON placements(membership_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )
        .map_err(StoreError::sqlite(OP))?;
    }

    info!("Database migrations complete");
    Ok(())
}
