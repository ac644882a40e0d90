//! Core error taxonomy.
//!
//! Three caller-distinguishable kinds surface from every operation:
//! - NotFound: a todo/subtask id that doesn't exist (or doesn't belong to
//!   the stated parent)
//! - Validation: a contract violation in the request itself
//! - Constraint: a storage-level uniqueness/FK failure
//!
//! The core never retries; the boundary layer owns user-visible messaging.

use serde::Serialize;
use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error(transparent)]
    Db(DbError),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CoreError::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Constraint(_) => ErrorKind::Constraint,
            CoreError::Db(_) => ErrorKind::Internal,
        }
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            // Surface SQLite uniqueness/FK failures as their own kind so the
            // boundary layer can tell them apart from plain storage trouble.
            DbError::Sqlite(rusqlite::Error::SqliteFailure(code, message))
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                CoreError::Constraint(message.unwrap_or_else(|| code.to_string()))
            }
            other => CoreError::Db(other),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::from(DbError::Sqlite(err))
    }
}

/// Serializable error representation for the boundary layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Constraint,
    Internal,
}

impl From<&CoreError> for ErrorPayload {
    fn from(err: &CoreError) -> Self {
        ErrorPayload {
            message: err.to_string(),
            kind: err.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_failures_get_their_own_kind() {
        let db = crate::db::test_utils::test_db();

        // Second insert violates the streaks date UNIQUE index
        db.conn_ref()
            .execute("INSERT INTO streaks (date, completed_count) VALUES ('2025-01-01', 1)", [])
            .expect("first insert");
        let raw = db
            .conn_ref()
            .execute("INSERT INTO streaks (date, completed_count) VALUES ('2025-01-01', 1)", [])
            .expect_err("duplicate date must fail");

        let err = CoreError::from(raw);
        assert_eq!(err.kind(), ErrorKind::Constraint);
    }

    #[test]
    fn test_payload_serialization() {
        let err = CoreError::not_found("todo", 42);
        let payload = ErrorPayload::from(&err);
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["kind"], "notfound");
        assert_eq!(json["message"], "todo 42 not found");
    }
}
