//! Prepared statements for the `subtasks` table.
//!
//! Sibling ordering is a dense 0..n-1 `sort_order` sequence per todo. The
//! statements here keep that shape mechanical (append at max+1, renumber
//! after delete); the cascade rules live in `services::subtasks`.

use rusqlite::{params, OptionalExtension};

use super::{DbError, DbSubtask, TodoDb};

const SUBTASK_COLUMNS: &str =
    "id, todo_id, title, is_completed, sort_order, completed_at, created_at";

impl TodoDb {
    /// Subtasks of one todo in display order.
    pub fn get_subtasks_for_todo(&self, todo_id: i64) -> Result<Vec<DbSubtask>, DbError> {
        let sql = format!(
            "SELECT {SUBTASK_COLUMNS} FROM subtasks
             WHERE todo_id = ?1
             ORDER BY sort_order ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![todo_id], Self::map_subtask_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Get a single subtask by its ID.
    pub fn get_subtask(&self, id: i64) -> Result<Option<DbSubtask>, DbError> {
        let sql = format!("SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::map_subtask_row)
            .optional()?)
    }

    /// Insert a subtask at the end of its todo's ordering.
    pub fn insert_subtask(&self, todo_id: i64, title: &str) -> Result<DbSubtask, DbError> {
        let next_order: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM subtasks WHERE todo_id = ?1",
            params![todo_id],
            |row| row.get(0),
        )?;

        self.conn.execute(
            "INSERT INTO subtasks (todo_id, title, sort_order, created_at)
             VALUES (?1, ?2, ?3, datetime('now'))",
            params![todo_id, title, next_order],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_subtask(id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Write back a subtask's mutable fields (the caller merges beforehand).
    pub fn update_subtask_row(&self, subtask: &DbSubtask) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE subtasks
             SET title = ?1,
                 is_completed = ?2,
                 completed_at = ?3
             WHERE id = ?4",
            params![
                subtask.title,
                subtask.is_completed,
                subtask.completed_at,
                subtask.id,
            ],
        )?;
        Ok(())
    }

    /// Delete a subtask. Returns the number of rows removed.
    pub fn delete_subtask_row(&self, id: i64) -> Result<usize, DbError> {
        Ok(self
            .conn
            .execute("DELETE FROM subtasks WHERE id = ?1", params![id])?)
    }

    /// Assign an explicit sort position to one subtask.
    pub fn set_subtask_order(&self, id: i64, sort_order: i64) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE subtasks SET sort_order = ?1 WHERE id = ?2",
            params![sort_order, id],
        )?;
        Ok(())
    }

    /// Renumber a todo's subtasks to a dense 0..n-1 sequence, preserving the
    /// current relative order. Only rows whose position changed are written.
    pub fn renumber_subtasks(&self, todo_id: i64) -> Result<(), DbError> {
        let subtasks = self.get_subtasks_for_todo(todo_id)?;
        for (index, subtask) in subtasks.iter().enumerate() {
            if subtask.sort_order != index as i64 {
                self.set_subtask_order(subtask.id, index as i64)?;
            }
        }
        Ok(())
    }

    /// Count a todo's subtasks: (total, completed).
    pub fn count_subtask_progress(&self, todo_id: i64) -> Result<(i64, i64), DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN is_completed = 1 THEN 1 ELSE 0 END), 0)
             FROM subtasks WHERE todo_id = ?1",
            params![todo_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
    }

    pub(crate) fn map_subtask_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbSubtask> {
        Ok(DbSubtask {
            id: row.get(0)?,
            todo_id: row.get(1)?,
            title: row.get(2)?,
            is_completed: row.get(3)?,
            sort_order: row.get(4)?,
            completed_at: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
