//! API-facing types exchanged with the boundary layer.
//!
//! Everything serializes camelCase for the UI. Row types from `db` convert
//! into these; request structs are partial (every field optional unless the
//! operation requires it) so updates merge over existing rows.

use serde::{Deserialize, Serialize};

use crate::db::{DbStatistics, DbStreak, DbSubtask, DbTodo};

/// Todo priority. Reads pass the stored string through untouched (older
/// databases can hold values outside this set, which the queries order last);
/// writes go through this enum so new rows always carry a recognized value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::None => "none",
        }
    }
}

/// A subtask of one todo.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: i64,
    pub todo_id: i64,
    pub title: String,
    pub is_completed: bool,
    pub sort_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub created_at: String,
}

impl From<DbSubtask> for Subtask {
    fn from(row: DbSubtask) -> Self {
        Subtask {
            id: row.id,
            todo_id: row.todo_id,
            title: row.title,
            is_completed: row.is_completed,
            sort_order: row.sort_order,
            completed_at: row.completed_at,
            created_at: row.created_at,
        }
    }
}

/// A todo item with its subtasks attached, the shape every query returns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub is_global: bool,
    pub is_completed: bool,
    pub is_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub priority: String,
    pub labels: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub subtasks: Vec<Subtask>,
}

impl Todo {
    pub fn from_row(row: DbTodo, subtasks: Vec<DbSubtask>) -> Self {
        Todo {
            id: row.id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            is_global: row.is_global,
            is_completed: row.is_completed,
            is_archived: row.is_archived,
            completed_at: row.completed_at,
            priority: row.priority,
            labels: parse_labels(&row.labels),
            created_at: row.created_at,
            updated_at: row.updated_at,
            subtasks: subtasks.into_iter().map(Subtask::from).collect(),
        }
    }
}

/// Labels are persisted as a JSON text column. Unparseable content (hand-
/// edited databases) reads as no labels rather than failing the whole query.
fn parse_labels(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Completion totals and streak counters (the statistics singleton).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_completed: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<String>,
}

impl From<DbStatistics> for Statistics {
    fn from(row: DbStatistics) -> Self {
        Statistics {
            total_completed: row.total_completed,
            current_streak: row.current_streak,
            longest_streak: row.longest_streak,
            last_activity_date: row.last_activity_date,
        }
    }
}

/// One calendar date's completion count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakDay {
    pub date: String,
    pub completed_count: i64,
}

impl From<DbStreak> for StreakDay {
    fn from(row: DbStreak) -> Self {
        StreakDay {
            date: row.date,
            completed_count: row.completed_count,
        }
    }
}

/// Subtask completion progress for one todo.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskProgress {
    pub total: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub is_global: bool,
    pub priority: Option<Priority>,
    pub labels: Option<Vec<String>>,
}

/// Partial todo update: absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub is_global: Option<bool>,
    pub is_completed: Option<bool>,
    pub priority: Option<Priority>,
    pub labels: Option<Vec<String>>,
}

/// Partial subtask update: absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSubtaskRequest {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
}

/// Partial statistics update: absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStatisticsRequest {
    pub total_completed: Option<i64>,
    pub current_streak: Option<i64>,
    pub longest_streak: Option<i64>,
    pub last_activity_date: Option<String>,
}
