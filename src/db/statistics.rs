//! Prepared statements for the `statistics` singleton and the `streaks` table.

use rusqlite::{params, OptionalExtension};

use super::{DbError, DbStatistics, DbStreak, TodoDb};

impl TodoDb {
    /// Read the statistics singleton (seeded by the baseline migration).
    pub fn get_statistics(&self) -> Result<DbStatistics, DbError> {
        Ok(self.conn.query_row(
            "SELECT total_completed, current_streak, longest_streak, last_activity_date
             FROM statistics WHERE id = 1",
            [],
            |row| {
                Ok(DbStatistics {
                    total_completed: row.get(0)?,
                    current_streak: row.get(1)?,
                    longest_streak: row.get(2)?,
                    last_activity_date: row.get(3)?,
                })
            },
        )?)
    }

    /// Write back the statistics singleton.
    pub fn update_statistics_row(&self, stats: &DbStatistics) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE statistics
             SET total_completed = ?1,
                 current_streak = ?2,
                 longest_streak = ?3,
                 last_activity_date = ?4
             WHERE id = 1",
            params![
                stats.total_completed,
                stats.current_streak,
                stats.longest_streak,
                stats.last_activity_date,
            ],
        )?;
        Ok(())
    }

    /// Bump the per-date completion counter, creating the row at count 1.
    pub fn increment_streak_count(&self, date: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO streaks (date, completed_count, created_at)
             VALUES (?1, 1, datetime('now'))
             ON CONFLICT(date) DO UPDATE SET completed_count = completed_count + 1",
            params![date],
        )?;
        Ok(())
    }

    /// The streak row for one calendar date, if any completions were recorded.
    pub fn get_streak(&self, date: &str) -> Result<Option<DbStreak>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, date, completed_count, created_at FROM streaks WHERE date = ?1",
                params![date],
                Self::map_streak_row,
            )
            .optional()?)
    }

    /// The most recent streak rows, newest date first.
    pub fn get_recent_streaks(&self, limit: usize) -> Result<Vec<DbStreak>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, completed_count, created_at FROM streaks
             ORDER BY date DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], Self::map_streak_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_streak_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbStreak> {
        Ok(DbStreak {
            id: row.get(0)?,
            date: row.get(1)?,
            completed_count: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}
