//! Streak & statistics engine.
//!
//! `record_completion` is the only transition into the streak state machine:
//! it bumps the per-date counter and total, then applies the calendar-
//! adjacency rules to (current_streak, longest_streak, last_activity_date).
//! One call = one completion event; duplicate same-day calls keep counting
//! completions but never advance the streak.

use chrono::NaiveDate;

use crate::db::{DbStatistics, TodoDb};
use crate::error::CoreError;
use crate::types::{Statistics, StreakDay, UpdateStatisticsRequest};

/// Default window for the streak history view.
pub const RECENT_STREAK_WINDOW: usize = 30;

/// Record one completion event for `date` (YYYY-MM-DD) and return the updated
/// statistics snapshot.
pub fn record_completion(db: &TodoDb, date: &str) -> Result<Statistics, CoreError> {
    db.with_transaction(|db| apply_completion(db, date))
}

/// Transaction body of `record_completion`, split out so operations that are
/// already inside a transaction (todo update/archive) can fire the event
/// atomically with their own writes.
pub(crate) fn apply_completion(db: &TodoDb, date: &str) -> Result<Statistics, CoreError> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| CoreError::validation(format!("invalid completion date: {date:?}")))?;

    db.increment_streak_count(date)?;

    let stats = db.get_statistics()?;
    let yesterday = day.pred_opt().map(|d| d.to_string());

    let current_streak = match stats.last_activity_date.as_deref() {
        // First completion ever
        None => 1,
        // Same day: streak already counts today
        Some(last) if last == date => stats.current_streak,
        // Consecutive day
        Some(last) if Some(last) == yesterday.as_deref() => stats.current_streak + 1,
        // Gap (or out-of-order date): streak restarts at this completion
        Some(_) => 1,
    };

    let updated = DbStatistics {
        total_completed: stats.total_completed + 1,
        current_streak,
        longest_streak: stats.longest_streak.max(current_streak),
        last_activity_date: Some(date.to_string()),
    };
    db.update_statistics_row(&updated)?;

    log::debug!(
        "Completion recorded for {}: streak {} (longest {})",
        date,
        updated.current_streak,
        updated.longest_streak
    );
    Ok(Statistics::from(updated))
}

/// Current statistics snapshot.
pub fn get_statistics(db: &TodoDb) -> Result<Statistics, CoreError> {
    Ok(Statistics::from(db.get_statistics()?))
}

/// Partial statistics update; absent fields keep their stored values.
pub fn update_statistics(
    db: &TodoDb,
    req: &UpdateStatisticsRequest,
) -> Result<Statistics, CoreError> {
    db.with_transaction(|db| {
        let existing = db.get_statistics()?;
        let merged = DbStatistics {
            total_completed: req.total_completed.unwrap_or(existing.total_completed),
            current_streak: req.current_streak.unwrap_or(existing.current_streak),
            longest_streak: req.longest_streak.unwrap_or(existing.longest_streak),
            last_activity_date: req
                .last_activity_date
                .clone()
                .or(existing.last_activity_date),
        };
        db.update_statistics_row(&merged)?;
        Ok(Statistics::from(merged))
    })
}

/// Most recent streak days, newest first.
pub fn get_recent_streaks(db: &TodoDb, limit: usize) -> Result<Vec<StreakDay>, CoreError> {
    let rows = db.get_recent_streaks(limit)?;
    Ok(rows.into_iter().map(StreakDay::from).collect())
}

/// The streak entry for one calendar date, if any.
pub fn get_streak_for_date(db: &TodoDb, date: &str) -> Result<Option<StreakDay>, CoreError> {
    Ok(db.get_streak(date)?.map(StreakDay::from))
}
