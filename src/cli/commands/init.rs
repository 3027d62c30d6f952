//! Create the daytrace database.
//!
//! The database lives at `~/.daytrace/data/daytrace.db` unless `--db`,
//! `DT_TEST_DB` or `DAYTRACE_DB` say otherwise. The schema is applied here
//! and again, idempotently, on every open.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    recreated: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the file cannot be created.
pub fn execute(db: Option<&Path>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db)
        .ok_or_else(|| Error::Config("Could not determine the database location".to_string()))?;

    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if existed {
        fs::remove_file(&db_path)?;
    }

    SqliteStorage::open(&db_path)?;
    tracing::info!(path = %db_path.display(), "Initialized database");

    if json {
        let output = InitOutput {
            database: db_path,
            recreated: existed,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized daytrace database");
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: pick a theme with 'dt year themes' and 'dt year plan create <year> <theme>'.");
    }

    Ok(())
}
