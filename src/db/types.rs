//! Shared type definitions for the database layer.

use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Database is not open")]
    NotOpen,
}

/// A row from the `todos` table.
///
/// `labels` is the raw JSON text column; the API layer parses it into a list.
#[derive(Debug, Clone)]
pub struct DbTodo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub is_global: bool,
    pub is_completed: bool,
    pub is_archived: bool,
    pub completed_at: Option<String>,
    pub priority: String,
    pub labels: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `subtasks` table.
#[derive(Debug, Clone)]
pub struct DbSubtask {
    pub id: i64,
    pub todo_id: i64,
    pub title: String,
    pub is_completed: bool,
    pub sort_order: i64,
    pub completed_at: Option<String>,
    pub created_at: String,
}

/// The singleton row from the `statistics` table (id = 1).
#[derive(Debug, Clone)]
pub struct DbStatistics {
    pub total_completed: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_activity_date: Option<String>,
}

/// A row from the `streaks` table: one per calendar date with completions.
#[derive(Debug, Clone)]
pub struct DbStreak {
    pub id: i64,
    pub date: String,
    pub completed_count: i64,
    pub created_at: String,
}
