//! Micro note model.
//!
//! A short note attached to a completed task or a night session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What a note is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedType {
    DailyTask,
    NightSession,
}

impl RelatedType {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DailyTask => "daily_task",
            Self::NightSession => "night_session",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroNote {
    pub id: String,
    pub user_id: String,
    pub related_type: RelatedType,
    pub related_id: String,
    pub date: NaiveDate,
    pub mood: Option<String>,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl MicroNote {
    pub fn new(
        user_id: &str,
        related_type: RelatedType,
        related_id: &str,
        date: NaiveDate,
        content: &str,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: format!("note_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            user_id: user_id.to_string(),
            related_type,
            related_id: related_id.to_string(),
            date,
            mood: None,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_mood(mut self, mood: Option<&str>) -> Self {
        self.mood = mood.map(str::to_string);
        self
    }
}
