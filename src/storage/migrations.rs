//! Database migrations embedded at compile time.
//!
//! Migrations are sourced from `/migrations/` at the crate root and
//! embedded into the binary using `include_str!`, so the binary carries
//! no runtime file dependencies.

use rusqlite::{Connection, Result};
use tracing::{info, warn};

/// A single migration with version identifier and SQL content.
struct Migration {
    version: &'static str,
    sql: &'static str,
}

/// All migrations in order. Version names match the SQL filenames.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001_add_task_replacement_lineage",
        sql: include_str!("../../migrations/001_add_task_replacement_lineage.sql"),
    },
    Migration {
        version: "002_add_review_poster",
        sql: include_str!("../../migrations/002_add_review_poster.sql"),
    },
    Migration {
        version: "003_add_task_slots",
        sql: include_str!("../../migrations/003_add_task_slots.sql"),
    },
    Migration {
        version: "004_add_year_directions",
        sql: include_str!("../../migrations/004_add_year_directions.sql"),
    },
];

/// Run all pending migrations on the database.
///
/// Already-applied migrations (tracked in `schema_migrations`) are skipped,
/// so this is safe to call on every open.
///
/// # Errors
///
/// Returns an error if a migration fails to apply. `ALTER TABLE` errors for
/// duplicate columns are tolerated: two processes opening a fresh database
/// can both try to add the same column.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied: std::collections::HashSet<String> = conn
        .prepare("SELECT version FROM schema_migrations")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for migration in MIGRATIONS {
        if applied.contains(migration.version) {
            continue;
        }

        info!(version = migration.version, "Applying migration");

        if let Err(e) = conn.execute_batch(migration.sql) {
            if e.to_string().contains("duplicate column name") {
                warn!(
                    version = migration.version,
                    "Migration partially applied (columns exist), marking complete"
                );
            } else {
                return Err(e);
            }
        }

        // Another connection may have recorded it between our read and now.
        conn.execute(
            "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, chrono::Utc::now().timestamp_millis()],
        )?;

        info!(version = migration.version, "Migration complete");
    }

    Ok(())
}
