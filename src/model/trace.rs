//! Trace event model.
//!
//! Trace events are the append-only signal log that the year aggregator
//! reads. A row is never updated; only an account wipe deletes it.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Which completion action produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventType {
    TaskDone,
    NightDone,
    NoteAdded,
}

impl TraceEventType {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TaskDone => "task_done",
            Self::NightDone => "night_done",
            Self::NoteAdded => "note_added",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s {
            "night_done" => Self::NightDone,
            "note_added" => Self::NoteAdded,
            _ => Self::TaskDone,
        }
    }
}

/// An immutable trace record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Row id, assigned by the database (0 before insert).
    pub id: i64,
    pub user_id: String,
    pub plan_id: String,
    pub event_type: TraceEventType,
    pub trace_tag: String,
    pub direction_id: Option<String>,
    /// The task, night session or note target that produced the event.
    pub source_id: String,
    pub occurred_at: i64,
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
}

/// Calendar year and month of a date.
#[must_use]
pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}
