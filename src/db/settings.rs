//! Prepared statements for the `settings` key/value table.
//!
//! Values are stored as raw TEXT. The JSON-or-string interpretation lives in
//! `services::settings`; this layer moves strings in and out.

use rusqlite::{params, OptionalExtension};

use super::{DbError, TodoDb};

impl TodoDb {
    /// Raw value for a key, if present.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Insert or replace a key's value.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key. Returns the number of rows removed.
    pub fn delete_setting(&self, key: &str) -> Result<usize, DbError> {
        Ok(self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?)
    }

    /// All stored (key, value) pairs.
    pub fn get_all_settings(&self) -> Result<Vec<(String, String)>, DbError> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
