//! Review snapshot model.

use serde::{Deserialize, Serialize};

/// Generated narrative for a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewContent {
    pub title: String,
    pub highlights: Vec<String>,
    pub identity: String,
    pub closing: String,
}

/// A stored review. Every generation creates a new row; only `poster_url`
/// is written afterwards, once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub year: i32,
    pub content: ReviewContent,
    pub poster_url: Option<String>,
    pub created_at: i64,
}

impl ReviewSnapshot {
    pub fn new(user_id: &str, plan_id: &str, year: i32, content: ReviewContent) -> Self {
        Self {
            id: format!("review_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            user_id: user_id.to_string(),
            plan_id: plan_id.to_string(),
            year,
            content,
            poster_url: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
