//! Daily task models.
//!
//! A `DailyTaskSet` is a user's bundle of tasks for one calendar date. Each
//! slot (`position`) holds exactly one current `DailyTask`; refreshes add new
//! rows at the same position and keep the replaced ones as history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a task set reached its current shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetSource {
    Auto,
    Refreshed,
}

impl SetSource {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Refreshed => "refreshed",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s {
            "refreshed" => Self::Refreshed,
            _ => Self::Auto,
        }
    }
}

/// Daily task status values.
///
/// `Done` and `Skipped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Done,
    Skipped,
}

impl TaskStatus {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Skipped => "skipped",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s {
            "done" => Self::Done,
            "skipped" => Self::Skipped,
            _ => Self::Pending,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped)
    }
}

/// A user's task bundle for one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTaskSet {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub refresh_count: u32,
    pub source: SetSource,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DailyTaskSet {
    /// Create an unrefreshed set.
    pub fn new(user_id: &str, date: NaiveDate) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: format!("set_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            user_id: user_id.to_string(),
            date,
            refresh_count: 0,
            source: SetSource::Auto,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One task row. Superseded rows stay in place as replacement history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: String,
    pub set_id: String,
    pub template_id: String,
    pub position: u8,
    pub status: TaskStatus,
    /// The task this one replaced during a refresh.
    pub replaced_from_task_id: Option<String>,
    pub skip_reason: Option<String>,
    pub created_at: i64,
    pub done_at: Option<i64>,
    pub skipped_at: Option<i64>,
}

impl DailyTask {
    /// Create a pending task for a slot.
    pub fn new(set_id: &str, template_id: &str, position: u8) -> Self {
        Self {
            id: format!("task_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            set_id: set_id.to_string(),
            template_id: template_id.to_string(),
            position,
            status: TaskStatus::Pending,
            replaced_from_task_id: None,
            skip_reason: None,
            created_at: chrono::Utc::now().timestamp_millis(),
            done_at: None,
            skipped_at: None,
        }
    }

    /// Link this task to the one it replaces.
    #[must_use]
    pub fn replacing(mut self, task_id: &str) -> Self {
        self.replaced_from_task_id = Some(task_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_pending() {
        let task = DailyTask::new("set_1", "tpl_breath", 2);
        assert!(task.id.starts_with("task_"));
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.position, 2);
        assert!(task.replaced_from_task_id.is_none());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(TaskStatus::from_str("done"), TaskStatus::Done);
        assert_eq!(TaskStatus::from_str("skipped"), TaskStatus::Skipped);
        assert_eq!(TaskStatus::from_str("pending"), TaskStatus::Pending);
        assert!(TaskStatus::Done.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert_eq!(SetSource::from_str("refreshed"), SetSource::Refreshed);
    }
}
