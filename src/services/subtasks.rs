//! Subtask cascade engine.
//!
//! A todo with subtasks does not own its completion flag: it is derived.
//! Every mutation here (add, update, delete, reorder) runs in one transaction
//! that also recomputes the parent, so the invariant
//! `is_completed == all(subtask.is_completed)` holds at every commit point.

use std::collections::HashSet;

use crate::db::{DbSubtask, TodoDb};
use crate::error::CoreError;
use crate::types::{Subtask, SubtaskProgress, UpdateSubtaskRequest};
use crate::util::now_timestamp;

/// Append a new (incomplete) subtask to a todo.
pub fn add_subtask(db: &TodoDb, todo_id: i64, title: &str) -> Result<Subtask, CoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::validation("subtask title must not be empty"));
    }

    db.with_transaction(|db| {
        db.get_todo(todo_id)?
            .ok_or(CoreError::not_found("todo", todo_id))?;

        let row = db.insert_subtask(todo_id, title)?;
        // An incomplete subtask added to a fully-complete todo reopens it
        recompute_completion(db, todo_id)?;
        Ok(Subtask::from(row))
    })
}

/// Update a subtask's title and/or completion, then recompute the parent.
pub fn update_subtask(
    db: &TodoDb,
    todo_id: i64,
    subtask_id: i64,
    req: &UpdateSubtaskRequest,
) -> Result<Subtask, CoreError> {
    db.with_transaction(|db| {
        let existing = owned_subtask(db, todo_id, subtask_id)?;
        let mut row = existing.clone();

        if let Some(title) = &req.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(CoreError::validation("subtask title must not be empty"));
            }
            row.title = title.to_string();
        }

        if let Some(is_completed) = req.is_completed {
            if is_completed && !existing.is_completed {
                row.completed_at = Some(now_timestamp());
            } else if !is_completed {
                row.completed_at = None;
            }
            row.is_completed = is_completed;
        }

        db.update_subtask_row(&row)?;
        recompute_completion(db, todo_id)?;
        Ok(Subtask::from(row))
    })
}

/// Delete a subtask, renumber the remaining siblings densely, and recompute
/// the parent. Returns whether a row was removed.
pub fn delete_subtask(db: &TodoDb, todo_id: i64, subtask_id: i64) -> Result<bool, CoreError> {
    db.with_transaction(|db| {
        owned_subtask(db, todo_id, subtask_id)?;

        let changes = db.delete_subtask_row(subtask_id)?;
        db.renumber_subtasks(todo_id)?;
        recompute_completion(db, todo_id)?;
        Ok(changes > 0)
    })
}

/// Reassign a todo's subtask ordering from an explicit id sequence.
///
/// The sequence must be exactly the todo's current subtask id set — an
/// omitted id, a foreign id, or a duplicate is a validation error and the
/// stored order is left untouched.
pub fn reorder_subtasks(
    db: &TodoDb,
    todo_id: i64,
    ordered_ids: &[i64],
) -> Result<Vec<Subtask>, CoreError> {
    db.with_transaction(|db| {
        db.get_todo(todo_id)?
            .ok_or(CoreError::not_found("todo", todo_id))?;

        let current = db.get_subtasks_for_todo(todo_id)?;
        let expected: HashSet<i64> = current.iter().map(|s| s.id).collect();
        let supplied: HashSet<i64> = ordered_ids.iter().copied().collect();

        if ordered_ids.len() != current.len() || supplied != expected {
            return Err(CoreError::validation(format!(
                "reorder list must contain exactly the {} subtask ids of todo {}",
                current.len(),
                todo_id
            )));
        }

        for (index, id) in ordered_ids.iter().enumerate() {
            db.set_subtask_order(*id, index as i64)?;
        }

        recompute_completion(db, todo_id)?;
        let rows = db.get_subtasks_for_todo(todo_id)?;
        Ok(rows.into_iter().map(Subtask::from).collect())
    })
}

/// Subtasks of one todo in display order.
pub fn get_subtasks(db: &TodoDb, todo_id: i64) -> Result<Vec<Subtask>, CoreError> {
    db.get_todo(todo_id)?
        .ok_or(CoreError::not_found("todo", todo_id))?;
    let rows = db.get_subtasks_for_todo(todo_id)?;
    Ok(rows.into_iter().map(Subtask::from).collect())
}

/// Completion progress for one todo's subtasks.
pub fn get_progress(db: &TodoDb, todo_id: i64) -> Result<SubtaskProgress, CoreError> {
    db.get_todo(todo_id)?
        .ok_or(CoreError::not_found("todo", todo_id))?;
    let (total, completed) = db.count_subtask_progress(todo_id)?;
    Ok(SubtaskProgress { total, completed })
}

/// Fetch a subtask, requiring that it belongs to the stated todo.
fn owned_subtask(db: &TodoDb, todo_id: i64, subtask_id: i64) -> Result<DbSubtask, CoreError> {
    db.get_subtask(subtask_id)?
        .filter(|s| s.todo_id == todo_id)
        .ok_or(CoreError::not_found("subtask", subtask_id))
}

/// Re-derive a todo's completion state from its subtasks.
///
/// No-op for archived todos (terminal state) and for todos with zero
/// subtasks (the explicit flag is authoritative there). On the derived
/// false→true transition an existing completion timestamp is preserved;
/// true→false clears it. Never fires a statistics completion event — the
/// calling layer decides when direct completions count.
fn recompute_completion(db: &TodoDb, todo_id: i64) -> Result<(), CoreError> {
    let todo = db
        .get_todo(todo_id)?
        .ok_or(CoreError::not_found("todo", todo_id))?;
    if todo.is_archived {
        return Ok(());
    }

    let (total, completed) = db.count_subtask_progress(todo_id)?;
    if total == 0 {
        return Ok(());
    }

    let all_done = completed == total;
    let completed_at = if all_done {
        todo.completed_at.clone().or_else(|| Some(now_timestamp()))
    } else {
        None
    };

    if all_done != todo.is_completed || completed_at != todo.completed_at {
        let mut row = todo;
        row.is_completed = all_done;
        row.completed_at = completed_at;
        db.update_todo_row(&row)?;
    }
    Ok(())
}
