//! daybook — data-consistency core for a personal task-management app.
//!
//! Todos with optional subtasks, a completion cascade (a todo with subtasks
//! is done exactly when all of them are), daily completion streaks, archive
//! rollover, and a key/value settings store, persisted in SQLite. The
//! boundary layer (IPC transport, windowing, file browsing) lives in the
//! hosting application and calls into `services::*` with a `state::AppState`.

pub mod db;
pub mod error;
mod migrations;
pub mod services;
pub mod state;
pub mod types;
mod util;

/// Initialize logging for the hosting process. Defaults to `info` unless
/// `RUST_LOG` overrides it; safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
