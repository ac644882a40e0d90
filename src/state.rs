//! Application state owned by the boundary layer.
//!
//! The store lives behind a `Mutex<Option<TodoDb>>`: boundary handlers run on
//! arbitrary threads, and a failed open leaves the app usable with DB
//! features disabled rather than crashing at startup.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::db::{DbError, TodoDb};
use crate::error::CoreError;

pub struct AppState {
    pub db: Mutex<Option<TodoDb>>,
}

impl AppState {
    /// Open the default database and wrap it for handler access.
    pub fn new() -> Self {
        let db = match TodoDb::open() {
            Ok(db) => Some(db),
            Err(e) => {
                log::warn!("Failed to open todo database: {e}. DB features disabled.");
                None
            }
        };
        Self { db: Mutex::new(db) }
    }

    /// Like `new`, against an explicit path. Useful for testing and for
    /// hosts that relocate their data directory.
    pub fn new_at(path: PathBuf) -> Result<Self, DbError> {
        let db = TodoDb::open_at(path)?;
        Ok(Self {
            db: Mutex::new(Some(db)),
        })
    }

    /// Run an operation against the store, surfacing `DbError::NotOpen` when
    /// the startup open failed.
    pub fn with_db<T>(
        &self,
        f: impl FnOnce(&TodoDb) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let guard = self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let db = guard.as_ref().ok_or(DbError::NotOpen)?;
        f(db)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
