//! Schema migration framework.
//!
//! Named SQL migrations are embedded at compile time via `include_str!` and
//! tracked in the `migrations` table, keyed by migration name. Each migration
//! runs exactly once, in declaration order, so schema evolution stays
//! idempotent across app restarts and version upgrades.

use std::collections::HashSet;

use rusqlite::Connection;

struct Migration {
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_create_todos",
        sql: include_str!("migrations/001_create_todos.sql"),
    },
    Migration {
        name: "002_create_subtasks",
        sql: include_str!("migrations/002_create_subtasks.sql"),
    },
    Migration {
        name: "003_create_streaks",
        sql: include_str!("migrations/003_create_streaks.sql"),
    },
    Migration {
        name: "004_create_statistics",
        sql: include_str!("migrations/004_create_statistics.sql"),
    },
    Migration {
        name: "005_create_settings",
        sql: include_str!("migrations/005_create_settings.sql"),
    },
    Migration {
        name: "006_add_todo_priority",
        sql: include_str!("migrations/006_add_todo_priority.sql"),
    },
    Migration {
        name: "007_add_todo_labels",
        sql: include_str!("migrations/007_add_todo_labels.sql"),
    },
];

/// Create the `migrations` ledger table if it doesn't exist.
fn ensure_migrations_table(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            executed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("Failed to create migrations table: {}", e))
}

/// Return the set of migration names already applied.
fn applied_migrations(conn: &Connection) -> Result<HashSet<String>, String> {
    let mut stmt = conn
        .prepare("SELECT name FROM migrations")
        .map_err(|e| format!("Failed to read migrations ledger: {}", e))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| format!("Failed to read migrations ledger: {}", e))?;

    let mut applied = HashSet::new();
    for row in rows {
        applied.insert(row.map_err(|e| format!("Failed to read migrations ledger: {}", e))?);
    }
    Ok(applied)
}

/// Back up the database before applying migrations.
///
/// Uses SQLite's online backup API to create a hot copy at
/// `<db_path>.pre-migration.bak`. Only called when there are pending migrations.
fn backup_before_migration(conn: &Connection) -> Result<(), String> {
    let db_path: String = conn
        .query_row("PRAGMA database_list", [], |row| row.get(2))
        .map_err(|e| format!("Failed to get database path: {}", e))?;

    if db_path.is_empty() || db_path == ":memory:" {
        // In-memory or temp database — skip backup
        return Ok(());
    }

    let backup_path = format!("{}.pre-migration.bak", db_path);
    let mut backup_conn = rusqlite::Connection::open(&backup_path)
        .map_err(|e| format!("Failed to open backup file: {}", e))?;

    let backup = rusqlite::backup::Backup::new(conn, &mut backup_conn)
        .map_err(|e| format!("Failed to initialize pre-migration backup: {}", e))?;

    backup
        .step(-1)
        .map_err(|e| format!("Pre-migration backup failed: {}", e))?;

    log::info!("Pre-migration backup created at {}", backup_path);
    Ok(())
}

/// Run all pending migrations.
///
/// Returns the number of migrations applied (0 if already up-to-date).
pub fn run_migrations(conn: &Connection) -> Result<usize, String> {
    ensure_migrations_table(conn)?;

    let applied = applied_migrations(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(m.name))
        .collect();

    if pending.is_empty() {
        return Ok(0);
    }

    // Backup before applying anything — a fresh database skips this inside
    // backup_before_migration only when it has no file path.
    backup_before_migration(conn)?;

    for migration in &pending {
        conn.execute_batch(migration.sql)
            .map_err(|e| format!("Migration {} failed: {}", migration.name, e))?;

        conn.execute(
            "INSERT INTO migrations (name) VALUES (?1)",
            [migration.name],
        )
        .map_err(|e| format!("Failed to record migration {}: {}", migration.name, e))?;

        log::info!("Applied migration {}", migration.name);
    }

    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn mem_db() -> Connection {
        Connection::open_in_memory().expect("in-memory db")
    }

    #[test]
    fn test_fresh_db_applies_all_migrations() {
        let conn = mem_db();
        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, MIGRATIONS.len());

        // Verify key tables exist with the migrated columns
        conn.execute(
            "INSERT INTO todos (title, due_date, priority, labels)
             VALUES ('Test', '2025-01-01', 'high', '[\"work\"]')",
            [],
        )
        .expect("todos should have priority and labels columns");

        conn.execute(
            "INSERT INTO subtasks (todo_id, title, sort_order) VALUES (1, 'Step one', 0)",
            [],
        )
        .expect("subtasks table should exist");

        conn.execute(
            "INSERT INTO streaks (date, completed_count) VALUES ('2025-01-01', 1)",
            [],
        )
        .expect("streaks table should exist");

        conn.execute("INSERT INTO settings (key, value) VALUES ('theme', 'dark')", [])
            .expect("settings table should exist");
    }

    #[test]
    fn test_statistics_singleton_seeded() {
        let conn = mem_db();
        run_migrations(&conn).expect("migrations should succeed");

        let (total, current, longest): (i64, i64, i64) = conn
            .query_row(
                "SELECT total_completed, current_streak, longest_streak FROM statistics WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .expect("statistics row should be seeded");
        assert_eq!((total, current, longest), (0, 0, 0));

        // The CHECK constraint keeps the table a singleton
        let result = conn.execute(
            "INSERT INTO statistics (id, total_completed, current_streak, longest_streak)
             VALUES (2, 0, 0, 0)",
            [],
        );
        assert!(result.is_err(), "statistics must reject a second row");
    }

    #[test]
    fn test_idempotency() {
        let conn = mem_db();

        let first = run_migrations(&conn).expect("first run");
        assert_eq!(first, MIGRATIONS.len());

        let second = run_migrations(&conn).expect("second run");
        assert_eq!(second, 0, "second run should apply no migrations");
    }

    #[test]
    fn test_ledger_records_names_in_order() {
        let conn = mem_db();
        run_migrations(&conn).expect("migrations should succeed");

        let mut stmt = conn
            .prepare("SELECT name FROM migrations ORDER BY id")
            .expect("ledger query");
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("ledger rows")
            .collect::<Result<_, _>>()
            .expect("ledger rows");

        let expected: Vec<String> = MIGRATIONS.iter().map(|m| m.name.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_partial_ledger_applies_only_missing() {
        let conn = mem_db();

        // Simulate a database that stopped after the first two migrations
        ensure_migrations_table(&conn).expect("ledger table");
        conn.execute_batch(MIGRATIONS[0].sql).expect("001");
        conn.execute_batch(MIGRATIONS[1].sql).expect("002");
        conn.execute(
            "INSERT INTO migrations (name) VALUES ('001_create_todos'), ('002_create_subtasks')",
            [],
        )
        .expect("seed ledger");

        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, MIGRATIONS.len() - 2);
    }

    #[test]
    fn test_pre_migration_backup_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("test_backup.db");

        let conn = Connection::open(&db_path).expect("open db");
        conn.execute_batch("PRAGMA journal_mode=WAL;").unwrap();

        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, MIGRATIONS.len());

        let backup_path = dir.path().join("test_backup.db.pre-migration.bak");
        assert!(
            backup_path.exists(),
            "pre-migration backup should be created at {}",
            backup_path.display()
        );
    }
}
