//! Todo aggregate manager: lifecycle and query surface for todos.
//!
//! Completion events flow into the statistics engine from exactly two places,
//! both here: a direct `is_completed` update and the first archive of a
//! not-yet-completed todo. The subtask cascade never fires one.

use crate::db::{DbTodo, TodoDb};
use crate::error::CoreError;
use crate::services::statistics;
use crate::types::{CreateTodoRequest, Todo, UpdateTodoRequest};
use crate::util::{now_timestamp, today_string};

/// Create a new todo. Title must be non-empty; a due date is required unless
/// the todo is global (backlog).
pub fn create_todo(db: &TodoDb, req: &CreateTodoRequest) -> Result<Todo, CoreError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(CoreError::validation("todo title must not be empty"));
    }
    if !req.is_global && req.due_date.is_none() {
        return Err(CoreError::validation("a non-global todo requires a due date"));
    }

    let labels = encode_labels(req.labels.as_deref().unwrap_or(&[]))?;
    let row = db.insert_todo(
        title,
        req.description.as_deref(),
        req.due_date.as_deref(),
        req.is_global,
        req.priority.unwrap_or_default().as_str(),
        &labels,
    )?;
    log::debug!("Created todo {} ({:?})", row.id, row.due_date);
    Ok(Todo::from_row(row, Vec::new()))
}

/// Merge a partial update over an existing todo. Absent fields keep their
/// stored values; the merged row is re-validated so an update can never
/// produce a todo that `create_todo` would have rejected.
pub fn update_todo(db: &TodoDb, id: i64, req: &UpdateTodoRequest) -> Result<Todo, CoreError> {
    db.with_transaction(|db| {
        let existing = db.get_todo(id)?.ok_or(CoreError::not_found("todo", id))?;

        if req.is_completed.is_some() {
            let (total, _) = db.count_subtask_progress(id)?;
            if total > 0 {
                return Err(CoreError::validation(
                    "completion is derived from subtasks and cannot be set directly",
                ));
            }
        }

        let mut row = existing.clone();
        if let Some(title) = &req.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(CoreError::validation("todo title must not be empty"));
            }
            row.title = title.to_string();
        }
        if let Some(description) = &req.description {
            row.description = Some(description.clone());
        }
        if let Some(due_date) = &req.due_date {
            row.due_date = Some(due_date.clone());
        }
        if let Some(is_global) = req.is_global {
            row.is_global = is_global;
        }
        if let Some(priority) = req.priority {
            row.priority = priority.as_str().to_string();
        }
        if let Some(labels) = &req.labels {
            row.labels = encode_labels(labels)?;
        }
        if !row.is_global && row.due_date.is_none() {
            return Err(CoreError::validation("a non-global todo requires a due date"));
        }

        let completed_now = match req.is_completed {
            Some(is_completed) => {
                row.is_completed = is_completed;
                if is_completed && !existing.is_completed {
                    if row.completed_at.is_none() {
                        row.completed_at = Some(now_timestamp());
                    }
                    true
                } else {
                    if !is_completed {
                        row.completed_at = None;
                    }
                    false
                }
            }
            None => false,
        };

        db.update_todo_row(&row)?;

        if completed_now {
            let date = row.due_date.clone().unwrap_or_else(today_string);
            statistics::apply_completion(db, &date)?;
        }

        load_todo(db, id)
    })
}

/// Delete a todo (subtasks cascade with it). Returns whether a row was removed.
pub fn delete_todo(db: &TodoDb, id: i64) -> Result<bool, CoreError> {
    let removed = db.delete_todo_row(id)? > 0;
    if removed {
        log::debug!("Deleted todo {}", id);
    }
    Ok(removed)
}

/// Archive a todo, marking it completed. Archival is terminal and idempotent:
/// re-archiving returns the stored row untouched. The completion event fires
/// only when this call actually transitions `is_completed` to true.
pub fn archive_todo(db: &TodoDb, id: i64) -> Result<Todo, CoreError> {
    db.with_transaction(|db| {
        let existing = db.get_todo(id)?.ok_or(CoreError::not_found("todo", id))?;
        if existing.is_archived {
            return load_todo(db, id);
        }

        db.archive_todo_row(id)?;

        if !existing.is_completed {
            let date = existing.due_date.clone().unwrap_or_else(today_string);
            statistics::apply_completion(db, &date)?;
        }

        load_todo(db, id)
    })
}

/// End-of-day rollover: archive every active daily todo due on `date`.
/// Returns the count affected; safe to call redundantly.
pub fn archive_todos_for_date(db: &TodoDb, date: &str) -> Result<usize, CoreError> {
    let affected = db.archive_todos_for_date(date)?;
    if affected > 0 {
        log::info!("Rolled over {} todos for {}", affected, date);
    }
    Ok(affected)
}

/// All todos, newest first, subtasks attached.
pub fn get_all_todos(db: &TodoDb) -> Result<Vec<Todo>, CoreError> {
    attach_subtasks(db, db.get_all_todos()?)
}

/// Active daily todos for one date, priority rank then creation order.
pub fn get_todos_by_date(db: &TodoDb, date: &str) -> Result<Vec<Todo>, CoreError> {
    attach_subtasks(db, db.get_todos_by_date(date)?)
}

/// Active global (backlog) todos.
pub fn get_global_todos(db: &TodoDb) -> Result<Vec<Todo>, CoreError> {
    attach_subtasks(db, db.get_global_todos()?)
}

/// Archived todos, most recently completed first.
pub fn get_archived_todos(db: &TodoDb) -> Result<Vec<Todo>, CoreError> {
    attach_subtasks(db, db.get_archived_todos()?)
}

/// One todo with its subtasks.
pub fn get_todo(db: &TodoDb, id: i64) -> Result<Todo, CoreError> {
    load_todo(db, id)
}

fn load_todo(db: &TodoDb, id: i64) -> Result<Todo, CoreError> {
    let row = db.get_todo(id)?.ok_or(CoreError::not_found("todo", id))?;
    let subtasks = db.get_subtasks_for_todo(id)?;
    Ok(Todo::from_row(row, subtasks))
}

fn attach_subtasks(db: &TodoDb, rows: Vec<DbTodo>) -> Result<Vec<Todo>, CoreError> {
    rows.into_iter()
        .map(|row| {
            let subtasks = db.get_subtasks_for_todo(row.id)?;
            Ok(Todo::from_row(row, subtasks))
        })
        .collect()
}

fn encode_labels(labels: &[String]) -> Result<String, CoreError> {
    serde_json::to_string(labels)
        .map_err(|e| CoreError::validation(format!("labels are not serializable: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;
    use crate::error::ErrorKind;
    use crate::services::subtasks;
    use crate::types::Priority;

    fn daily_request(title: &str, date: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.to_string(),
            due_date: Some(date.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_validates_title_and_due_date() {
        let db = test_db();

        let err = create_todo(&db, &daily_request("  ", "2025-03-10")).expect_err("blank title");
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = create_todo(
            &db,
            &CreateTodoRequest {
                title: "No date".to_string(),
                is_global: false,
                ..Default::default()
            },
        )
        .expect_err("non-global without due date");
        assert_eq!(err.kind(), ErrorKind::Validation);

        // Global todos need no due date
        let todo = create_todo(
            &db,
            &CreateTodoRequest {
                title: "Backlog item".to_string(),
                is_global: true,
                priority: Some(Priority::Low),
                labels: Some(vec!["someday".to_string()]),
                ..Default::default()
            },
        )
        .expect("global create");
        assert!(todo.due_date.is_none());
        assert_eq!(todo.priority, "low");
        assert_eq!(todo.labels, vec!["someday"]);
        assert!(!todo.is_completed);
        assert!(!todo.is_archived);
    }

    #[test]
    fn test_update_merges_only_provided_fields() {
        let db = test_db();
        let todo = create_todo(
            &db,
            &CreateTodoRequest {
                title: "Original".to_string(),
                description: Some("keep me".to_string()),
                due_date: Some("2025-03-10".to_string()),
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .expect("create");

        let updated = update_todo(
            &db,
            todo.id,
            &UpdateTodoRequest {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .expect("update");

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description.as_deref(), Some("keep me"));
        assert_eq!(updated.due_date.as_deref(), Some("2025-03-10"));
        assert_eq!(updated.priority, "high", "unspecified fields keep prior values");
    }

    #[test]
    fn test_update_missing_todo_is_not_found() {
        let db = test_db();
        let err = update_todo(&db, 9999, &UpdateTodoRequest::default()).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_update_cannot_strand_daily_todo_without_date() {
        let db = test_db();
        let todo = create_todo(
            &db,
            &CreateTodoRequest {
                title: "Backlog".to_string(),
                is_global: true,
                ..Default::default()
            },
        )
        .expect("create");

        let err = update_todo(
            &db,
            todo.id,
            &UpdateTodoRequest {
                is_global: Some(false),
                ..Default::default()
            },
        )
        .expect_err("demoting to daily without a due date");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_direct_completion_fires_event_once_per_transition() {
        let db = test_db();
        let todo = create_todo(&db, &daily_request("Task", "2024-01-01")).expect("create");

        let done = UpdateTodoRequest {
            is_completed: Some(true),
            ..Default::default()
        };
        let updated = update_todo(&db, todo.id, &done).expect("complete");
        assert!(updated.is_completed);
        let completed_at = updated.completed_at.expect("timestamp set");

        let stats = statistics::get_statistics(&db).expect("stats");
        assert_eq!(stats.total_completed, 1);
        assert_eq!(stats.last_activity_date.as_deref(), Some("2024-01-01"));

        // Completing an already-complete todo is not a transition
        let again = update_todo(&db, todo.id, &done).expect("no-op complete");
        assert_eq!(again.completed_at.as_deref(), Some(completed_at.as_str()));
        let stats = statistics::get_statistics(&db).expect("stats");
        assert_eq!(stats.total_completed, 1);

        // Un-completing clears the timestamp and fires nothing
        let reopened = update_todo(
            &db,
            todo.id,
            &UpdateTodoRequest {
                is_completed: Some(false),
                ..Default::default()
            },
        )
        .expect("reopen");
        assert_eq!(reopened.completed_at, None);
        let stats = statistics::get_statistics(&db).expect("stats");
        assert_eq!(stats.total_completed, 1);
    }

    #[test]
    fn test_completion_event_uses_today_when_undated() {
        let db = test_db();
        let todo = create_todo(
            &db,
            &CreateTodoRequest {
                title: "Backlog".to_string(),
                is_global: true,
                ..Default::default()
            },
        )
        .expect("create");

        update_todo(
            &db,
            todo.id,
            &UpdateTodoRequest {
                is_completed: Some(true),
                ..Default::default()
            },
        )
        .expect("complete");

        let stats = statistics::get_statistics(&db).expect("stats");
        assert_eq!(stats.last_activity_date, Some(crate::util::today_string()));
    }

    #[test]
    fn test_update_rejects_direct_completion_with_subtasks() {
        let db = test_db();
        let todo = create_todo(&db, &daily_request("Task", "2025-03-10")).expect("create");
        subtasks::add_subtask(&db, todo.id, "step").expect("subtask");

        let err = update_todo(
            &db,
            todo.id,
            &UpdateTodoRequest {
                is_completed: Some(true),
                ..Default::default()
            },
        )
        .expect_err("cascade is authoritative");
        assert_eq!(err.kind(), ErrorKind::Validation);

        // Other fields remain updatable
        let updated = update_todo(
            &db,
            todo.id,
            &UpdateTodoRequest {
                priority: Some(Priority::Urgent),
                ..Default::default()
            },
        )
        .expect("non-completion update");
        assert_eq!(updated.priority, "urgent");
    }

    #[test]
    fn test_archive_is_idempotent_and_fires_once() {
        let db = test_db();
        let todo = create_todo(&db, &daily_request("Task", "2024-01-01")).expect("create");

        let archived = archive_todo(&db, todo.id).expect("archive");
        assert!(archived.is_archived);
        assert!(archived.is_completed);
        let completed_at = archived.completed_at.expect("timestamp");
        let updated_at = archived.updated_at.clone();

        let stats = statistics::get_statistics(&db).expect("stats");
        assert_eq!(stats.total_completed, 1);

        let again = archive_todo(&db, todo.id).expect("re-archive");
        assert!(again.is_archived);
        assert_eq!(again.completed_at.as_deref(), Some(completed_at.as_str()));
        assert_eq!(again.updated_at, updated_at, "second archive touches nothing");

        let stats = statistics::get_statistics(&db).expect("stats");
        assert_eq!(stats.total_completed, 1, "no second completion event");
    }

    #[test]
    fn test_archive_of_completed_todo_fires_no_event() {
        let db = test_db();
        let todo = create_todo(&db, &daily_request("Task", "2024-01-01")).expect("create");
        update_todo(
            &db,
            todo.id,
            &UpdateTodoRequest {
                is_completed: Some(true),
                ..Default::default()
            },
        )
        .expect("complete");

        archive_todo(&db, todo.id).expect("archive");
        let stats = statistics::get_statistics(&db).expect("stats");
        assert_eq!(stats.total_completed, 1, "completion already counted");
    }

    #[test]
    fn test_archive_missing_todo_is_not_found() {
        let db = test_db();
        let err = archive_todo(&db, 41).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_rollover_counts_and_fires_no_events() {
        let db = test_db();
        for title in ["a", "b", "c"] {
            create_todo(&db, &daily_request(title, "2024-01-01")).expect("create");
        }
        let pre = create_todo(&db, &daily_request("d", "2024-01-01")).expect("create");
        archive_todo(&db, pre.id).expect("archive ahead of rollover");

        let affected = archive_todos_for_date(&db, "2024-01-01").expect("rollover");
        assert_eq!(affected, 3);

        let stats = statistics::get_statistics(&db).expect("stats");
        assert_eq!(stats.total_completed, 1, "only the explicit archive counted");

        let archived = get_archived_todos(&db).expect("archived view");
        assert_eq!(archived.len(), 4);
    }

    #[test]
    fn test_delete_reports_removal() {
        let db = test_db();
        let todo = create_todo(&db, &daily_request("Task", "2025-03-10")).expect("create");
        subtasks::add_subtask(&db, todo.id, "step").expect("subtask");

        assert!(delete_todo(&db, todo.id).expect("delete"));
        assert!(!delete_todo(&db, todo.id).expect("delete again"));

        let err = get_todo(&db, todo.id).expect_err("gone");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_queries_attach_ordered_subtasks() {
        let db = test_db();
        let todo = create_todo(&db, &daily_request("Task", "2025-03-10")).expect("create");
        let a = subtasks::add_subtask(&db, todo.id, "first").expect("a").id;
        let b = subtasks::add_subtask(&db, todo.id, "second").expect("b").id;
        subtasks::reorder_subtasks(&db, todo.id, &[b, a]).expect("reorder");

        let todos = get_todos_by_date(&db, "2025-03-10").expect("query");
        assert_eq!(todos.len(), 1);
        let titles: Vec<&str> = todos[0].subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }
}
