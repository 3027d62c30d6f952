//! Year plan model.
//!
//! A year plan anchors a user's year: trace events are only recorded while an
//! active plan exists for the event's year, and reviews require a plan.

use serde::{Deserialize, Serialize};

/// Plan status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Active,
    Archived,
}

impl PlanStatus {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "archived" => Self::Archived,
            _ => Self::Active,
        }
    }
}

impl Default for PlanStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// A user's plan for one calendar year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearPlan {
    /// Unique identifier (`plan_` + UUID fragment)
    pub id: String,

    pub user_id: String,

    pub year: i32,

    /// Theme chosen for the year
    pub theme_id: String,

    /// Theme title captured at creation time
    pub theme_title: String,

    pub status: PlanStatus,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl YearPlan {
    /// Create a new active plan.
    pub fn new(user_id: &str, year: i32, theme_id: &str, theme_title: &str) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let id = format!("plan_{}", &uuid::Uuid::new_v4().to_string()[..12]);

        Self {
            id,
            user_id: user_id.to_string(),
            year,
            theme_id: theme_id.to_string(),
            theme_title: theme_title.to_string(),
            status: PlanStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PlanStatus::Active
    }
}

/// One direction as the user arranged it for a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDirection {
    pub direction_id: String,
    pub title: String,
    pub is_enabled: bool,
    /// Display position, ascending.
    pub sort_order: u32,
}

/// A change to one direction of a plan. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionUpdate {
    pub direction_id: String,
    pub is_enabled: Option<bool>,
    pub sort_order: Option<u32>,
}
