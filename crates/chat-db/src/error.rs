use rusqlite::ffi;
use thiserror::Error;

/// What went wrong, independent of which operation hit it. Callers branch on
/// this instead of matching error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A unique constraint rejected the write (duplicate username, chat name).
    UniqueViolation,
    /// A referenced row does not exist.
    NotFound,
    /// The row exists but the requester may not read or change it.
    Forbidden,
    /// Input rejected before any statement ran.
    Invalid,
    Other,
}

/// Storage error tagged with the operation that produced it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{op}: unique_violation")]
    UniqueViolation { op: &'static str },

    #[error("{op}: {message}")]
    NotFound { op: &'static str, message: String },

    #[error("{op}: {message}")]
    Forbidden { op: &'static str, message: String },

    #[error("{op}: {message}")]
    Invalid { op: &'static str, message: String },

    #[error("{op}: {source}")]
    Sqlite {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database lock poisoned")]
    LockPoisoned,
}

/// Prefixes driver errors carry that mean nothing to an API client.
const DRIVER_PREFIXES: &[&str] = &["rusqlite: ", "sqlite: ", "sql: ", "driver: "];

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::UniqueViolation { .. } => ErrorKind::UniqueViolation,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Forbidden { .. } => ErrorKind::Forbidden,
            StoreError::Invalid { .. } => ErrorKind::Invalid,
            StoreError::Sqlite { .. } | StoreError::LockPoisoned => ErrorKind::Other,
        }
    }

    pub fn op(&self) -> Option<&'static str> {
        match self {
            StoreError::UniqueViolation { op }
            | StoreError::NotFound { op, .. }
            | StoreError::Forbidden { op, .. }
            | StoreError::Invalid { op, .. }
            | StoreError::Sqlite { op, .. } => Some(*op),
            StoreError::LockPoisoned => None,
        }
    }

    /// Message without the operation tag or driver prefixes.
    pub fn public_message(&self) -> String {
        match self {
            StoreError::UniqueViolation { .. } => "unique_violation".to_string(),
            StoreError::NotFound { message, .. }
            | StoreError::Forbidden { message, .. }
            | StoreError::Invalid { message, .. } => message.clone(),
            StoreError::Sqlite { source, .. } => sanitize(&source.to_string()),
            StoreError::LockPoisoned => "storage unavailable".to_string(),
        }
    }

    /// Maps a driver error for `op`, recognising constraint failures.
    pub fn sqlite(op: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
        move |source| classify(op, source)
    }
}

fn classify(op: &'static str, source: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &source {
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return StoreError::UniqueViolation { op };
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return StoreError::NotFound {
                    op,
                    message: "referenced row does not exist".to_string(),
                };
            }
            _ => {}
        }
    }
    StoreError::Sqlite { op, source }
}

pub(crate) fn sanitize(text: &str) -> String {
    DRIVER_PREFIXES
        .iter()
        .fold(text.to_string(), |acc, prefix| acc.replace(prefix, ""))
}
