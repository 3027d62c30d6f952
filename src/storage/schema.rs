//! Database schema definitions and migration logic.
//!
//! Timestamps are stored as INTEGER Unix milliseconds, dates as ISO
//! `YYYY-MM-DD` text so they sort and range-compare lexically.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The base SQL schema for the daytrace database.
///
/// Columns and tables added later live in `migrations/` and are applied by
/// [`apply_schema`] on top of this.
pub const SCHEMA_SQL: &str = r#"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Daily Engagement
-- ====================

-- One bundle of tasks per user per date
CREATE TABLE IF NOT EXISTS daily_task_sets (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    refresh_count INTEGER NOT NULL DEFAULT 0 CHECK (refresh_count >= 0),
    source TEXT NOT NULL DEFAULT 'auto' CHECK (source IN ('auto', 'refreshed')),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (user_id, date)
);

-- Every task ever assigned, including replaced ones
CREATE TABLE IF NOT EXISTS daily_tasks (
    id TEXT PRIMARY KEY,
    set_id TEXT NOT NULL REFERENCES daily_task_sets(id) ON DELETE CASCADE,
    template_id TEXT NOT NULL,
    position INTEGER NOT NULL CHECK (position >= 1),
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'done', 'skipped')),
    skip_reason TEXT,
    created_at INTEGER NOT NULL,
    done_at INTEGER,
    skipped_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_daily_tasks_set ON daily_tasks(set_id, position);
CREATE INDEX IF NOT EXISTS idx_daily_tasks_status ON daily_tasks(status, done_at);

-- Current task per slot
CREATE TABLE IF NOT EXISTS daily_task_slots (
    set_id TEXT NOT NULL REFERENCES daily_task_sets(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    task_id TEXT NOT NULL REFERENCES daily_tasks(id) ON DELETE CASCADE,
    PRIMARY KEY (set_id, position)
);

-- ====================
-- Night Sessions
-- ====================

CREATE TABLE IF NOT EXISTS night_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    program_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'started' CHECK (status IN ('started', 'finished')),
    started_at INTEGER NOT NULL,
    finished_at INTEGER,
    answers TEXT NOT NULL DEFAULT '[]',
    UNIQUE (user_id, date)
);

-- ====================
-- Year
-- ====================

CREATE TABLE IF NOT EXISTS year_plans (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    theme_id TEXT NOT NULL,
    theme_title TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'archived')),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (user_id, year)
);

-- Append-only signal log
CREATE TABLE IF NOT EXISTS trace_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    plan_id TEXT NOT NULL,
    event_type TEXT NOT NULL CHECK (event_type IN ('task_done', 'night_done', 'note_added')),
    trace_tag TEXT NOT NULL,
    direction_id TEXT,
    source_id TEXT NOT NULL,
    occurred_at INTEGER NOT NULL,
    date TEXT NOT NULL,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12)
);

CREATE INDEX IF NOT EXISTS idx_trace_events_year ON trace_events(user_id, year);
CREATE INDEX IF NOT EXISTS idx_trace_events_direction ON trace_events(user_id, year, direction_id);
CREATE INDEX IF NOT EXISTS idx_trace_events_source ON trace_events(source_id);

CREATE TABLE IF NOT EXISTS review_snapshots (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    plan_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_review_snapshots_user ON review_snapshots(user_id, year);

-- ====================
-- Notes
-- ====================

CREATE TABLE IF NOT EXISTS micro_notes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    related_type TEXT NOT NULL CHECK (related_type IN ('daily_task', 'night_session')),
    related_id TEXT NOT NULL,
    date TEXT NOT NULL,
    mood TEXT,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_micro_notes_related ON micro_notes(user_id, related_type, related_id);
"#;

/// Apply the schema to a connection.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    super::migrations::run_migrations(conn)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "daily_task_sets",
            "daily_tasks",
            "daily_task_slots",
            "night_sessions",
            "year_plans",
            "trace_events",
            "review_snapshots",
            "micro_notes",
            "year_directions",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }

    #[test]
    fn test_one_set_per_user_and_date() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let insert = "INSERT INTO daily_task_sets (id, user_id, date, created_at, updated_at)
                      VALUES (?1, 'u1', '2024-03-01', 0, 0)";
        conn.execute(insert, ["set_a"]).unwrap();
        let err = conn.execute(insert, ["set_b"]).unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[test]
    fn test_status_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO daily_task_sets (id, user_id, date, created_at, updated_at)
             VALUES ('set_a', 'u1', '2024-03-01', 0, 0)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO daily_tasks (id, set_id, template_id, position, status, created_at)
             VALUES ('t1', 'set_a', 'tpl', 1, 'abandoned', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_migrated_columns_exist() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let columns = |table: &str| -> Vec<String> {
            conn.prepare(&format!("PRAGMA table_info({table})"))
                .unwrap()
                .query_map([], |row| row.get(1))
                .unwrap()
                .collect::<Result<Vec<_>, _>>()
                .unwrap()
        };
        assert!(columns("daily_tasks").contains(&"replaced_from_task_id".to_string()));
        assert!(columns("review_snapshots").contains(&"poster_url".to_string()));
    }
}
