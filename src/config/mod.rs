//! Configuration management.
//!
//! This module resolves the database location, the acting user and the
//! on-disk settings and catalog files.
//!
//! # Layout
//!
//! Everything lives under `~/.daytrace/`:
//! - `data/daytrace.db`: the database
//! - `test/daytrace.db`: the isolated database used in test mode
//! - `config.json`: optional [`TrackerSettings`] overrides
//! - `catalog.json`: optional replacement for the built-in catalog

mod settings;

pub use settings::{Direction, Theme, TrackerSettings};

use crate::catalog::{Catalog, StaticCatalog};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Get the global daytrace directory (`~/.daytrace`).
#[must_use]
pub fn global_daytrace_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".daytrace"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `DT_TEST_DB=1` (or any non-empty value
/// other than `0`/`false`).
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("DT_TEST_DB").is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(v: &str) -> bool {
    !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false")
}

/// Get the test database path (`~/.daytrace/test/daytrace.db`).
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_daytrace_dir().map(|dir| dir.join("test").join("daytrace.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path` (the `--db` flag or `DT_DB`)
/// 2. `DT_TEST_DB` → test database
/// 3. `DAYTRACE_DB` environment variable
/// 4. `~/.daytrace/data/daytrace.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Ok(db_path) = std::env::var("DAYTRACE_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_daytrace_dir().map(|dir| dir.join("data").join("daytrace.db"))
}

/// Resolve the trusted user id.
///
/// Priority:
/// 1. `explicit` (the `--user` flag or `DT_USER`)
/// 2. System username
/// 3. `"local"`
#[must_use]
pub fn resolve_user_id(explicit: Option<&str>) -> String {
    if let Some(user) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        return user.to_string();
    }

    if let Ok(user) = std::env::var("USER") {
        if !user.is_empty() {
            return user;
        }
    }

    "local".to_string()
}

/// Load tracker settings from `~/.daytrace/config.json`.
///
/// # Errors
///
/// Returns `Config` if the file exists but is malformed.
pub fn load_settings() -> Result<TrackerSettings> {
    match global_daytrace_dir() {
        Some(dir) => TrackerSettings::load(&dir.join("config.json")),
        None => {
            tracing::warn!("Could not determine home directory, using default settings");
            Ok(TrackerSettings::default())
        }
    }
}

/// Load the catalog: `explicit` file, else `~/.daytrace/catalog.json` if it
/// exists, else the built-in content.
///
/// # Errors
///
/// Returns `Config` if a catalog file is given or present but unreadable.
pub fn load_catalog(explicit: Option<&Path>) -> Result<Arc<dyn Catalog>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Catalog file not found: {}",
                path.display()
            )));
        }
        return Ok(Arc::new(StaticCatalog::from_file(path)?));
    }

    let default_file = global_daytrace_dir()
        .map(|dir| dir.join("catalog.json"))
        .filter(|p| p.exists());

    Ok(match default_file {
        Some(path) => Arc::new(StaticCatalog::from_file(&path)?),
        None => Arc::new(StaticCatalog::builtin()),
    })
}
