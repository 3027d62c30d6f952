//! Command implementations.

pub mod completions;
pub mod init;
pub mod night;
pub mod note;
pub mod task;
pub mod today;
pub mod version;
pub mod wipe;
pub mod year;

use crate::config::{load_catalog, load_settings, resolve_db_path, resolve_user_id};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use crate::tracker::Tracker;
use crate::validate::{parse_date, parse_timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

/// Global options every tracker command needs.
#[derive(Debug, Clone, Copy)]
pub struct Globals<'a> {
    pub db: Option<&'a Path>,
    pub user: Option<&'a str>,
    pub catalog: Option<&'a Path>,
    pub json: bool,
}

impl Globals<'_> {
    /// The acting user.
    #[must_use]
    pub fn user_id(&self) -> String {
        resolve_user_id(self.user)
    }

    /// Open the database and build a tracker over it.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if the database file does not exist, or a
    /// config error if settings or catalog cannot be loaded.
    pub fn open_tracker(&self) -> Result<Tracker> {
        let db_path = resolve_db_path(self.db).ok_or(Error::NotInitialized)?;
        if !db_path.exists() {
            return Err(Error::NotInitialized);
        }

        let storage = SqliteStorage::open(&db_path)?;
        Ok(Tracker::new(storage, load_catalog(self.catalog)?, load_settings()?))
    }
}

/// `--date` or the local calendar date.
fn date_or_today(date: Option<&str>) -> Result<NaiveDate> {
    date.map_or_else(|| Ok(chrono::Local::now().date_naive()), parse_date)
}

fn optional_timestamp(at: Option<&str>) -> Result<Option<i64>> {
    at.map(parse_timestamp).transpose()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
