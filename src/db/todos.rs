//! Prepared statements for the `todos` table.

use rusqlite::{params, OptionalExtension};

use super::{DbError, DbTodo, TodoDb};
use crate::util::now_timestamp;

const TODO_COLUMNS: &str = "id, title, description, due_date, is_global, is_completed, \
     is_archived, completed_at, priority, labels, created_at, updated_at";

/// Priority sort rank used by the day and backlog views. Unrecognized values
/// (from older schema versions) sort after 'none'.
const PRIORITY_RANK: &str = "CASE priority
         WHEN 'urgent' THEN 0
         WHEN 'high' THEN 1
         WHEN 'medium' THEN 2
         WHEN 'low' THEN 3
         WHEN 'none' THEN 4
         ELSE 5
       END";

impl TodoDb {
    /// All todos, newest first.
    pub fn get_all_todos(&self) -> Result<Vec<DbTodo>, DbError> {
        let sql = format!("SELECT {TODO_COLUMNS} FROM todos ORDER BY created_at DESC, id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_todo_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Get a single todo by its ID.
    pub fn get_todo(&self, id: i64) -> Result<Option<DbTodo>, DbError> {
        let sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::map_todo_row)
            .optional()?)
    }

    /// Active (non-archived) daily todos for one due date, by priority rank
    /// then creation order.
    pub fn get_todos_by_date(&self, date: &str) -> Result<Vec<DbTodo>, DbError> {
        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todos
             WHERE due_date = ?1 AND is_global = 0 AND is_archived = 0
             ORDER BY {PRIORITY_RANK}, created_at ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![date], Self::map_todo_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Active global (backlog) todos, by priority rank then creation order.
    pub fn get_global_todos(&self) -> Result<Vec<DbTodo>, DbError> {
        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todos
             WHERE is_global = 1 AND is_archived = 0
             ORDER BY {PRIORITY_RANK}, created_at ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_todo_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Archived todos, most recently completed first.
    pub fn get_archived_todos(&self) -> Result<Vec<DbTodo>, DbError> {
        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todos
             WHERE is_archived = 1
             ORDER BY completed_at DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_todo_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Insert a new todo and return the stored row.
    pub fn insert_todo(
        &self,
        title: &str,
        description: Option<&str>,
        due_date: Option<&str>,
        is_global: bool,
        priority: &str,
        labels: &str,
    ) -> Result<DbTodo, DbError> {
        let now = now_timestamp();
        self.conn.execute(
            "INSERT INTO todos (title, description, due_date, is_global, priority, labels,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![title, description, due_date, is_global, priority, labels, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_todo(id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Write back a full todo row (the caller merges fields beforehand).
    /// `updated_at` is refreshed; `created_at` is never touched.
    pub fn update_todo_row(&self, todo: &DbTodo) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE todos
             SET title = ?1,
                 description = ?2,
                 due_date = ?3,
                 is_global = ?4,
                 is_completed = ?5,
                 completed_at = ?6,
                 priority = ?7,
                 labels = ?8,
                 updated_at = ?9
             WHERE id = ?10",
            params![
                todo.title,
                todo.description,
                todo.due_date,
                todo.is_global,
                todo.is_completed,
                todo.completed_at,
                todo.priority,
                todo.labels,
                now_timestamp(),
                todo.id,
            ],
        )?;
        Ok(())
    }

    /// Delete a todo. Subtasks go with it via the FK cascade.
    /// Returns the number of rows removed.
    pub fn delete_todo_row(&self, id: i64) -> Result<usize, DbError> {
        Ok(self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1", params![id])?)
    }

    /// Archive a single active todo, marking it completed. The existing
    /// completion timestamp is preserved when present. Returns the number of
    /// rows changed — 0 means the todo was already archived (or absent).
    pub fn archive_todo_row(&self, id: i64) -> Result<usize, DbError> {
        let now = now_timestamp();
        Ok(self.conn.execute(
            "UPDATE todos
             SET is_archived = 1,
                 is_completed = 1,
                 completed_at = COALESCE(completed_at, ?1),
                 updated_at = ?1
             WHERE id = ?2 AND is_archived = 0",
            params![now, id],
        )?)
    }

    /// End-of-day rollover: archive every active daily todo due on `date`.
    /// Completion flags are left as the day ended. Returns the count affected.
    pub fn archive_todos_for_date(&self, date: &str) -> Result<usize, DbError> {
        let now = now_timestamp();
        Ok(self.conn.execute(
            "UPDATE todos
             SET is_archived = 1,
                 completed_at = COALESCE(completed_at, ?1),
                 updated_at = ?1
             WHERE due_date = ?2 AND is_global = 0 AND is_archived = 0",
            params![now, date],
        )?)
    }

    /// Helper: map a row to `DbTodo`. Reduces repetition across queries.
    pub(crate) fn map_todo_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbTodo> {
        Ok(DbTodo {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            due_date: row.get(3)?,
            is_global: row.get(4)?,
            is_completed: row.get(5)?,
            is_archived: row.get(6)?,
            completed_at: row.get(7)?,
            priority: row.get(8)?,
            labels: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}
