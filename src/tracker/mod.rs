//! The tracker service.
//!
//! [`Tracker`] owns a storage handle and the injected catalog, template
//! picker and settings. Each public method is one user-facing operation;
//! every write runs through [`SqliteStorage::mutate`] so state changes and
//! their trace events commit together.
//!
//! # Submodules
//!
//! - [`today`] - Daily task sets and bounded refresh
//! - [`tasks`] - Completing and skipping tasks
//! - [`night`] - Night session lifecycle
//! - [`plans`] - Year plans and themes
//! - [`notes`] - Micro notes
//! - [`year`] - Year aggregation, review and poster

pub mod night;
pub mod notes;
pub mod plans;
pub mod tasks;
pub mod today;
pub mod year;

pub use night::{NightFinish, NightStart};
pub use plans::PlanView;
pub use tasks::Completion;
pub use today::{RefreshOutcome, TaskView, TodayView};
pub use year::{
    DirectionCount, DirectionDetail, MonthRecord, PosterResult, RecordDetail, SoftIdentity,
    TraceCount, YearSummary,
};

use crate::catalog::{Catalog, RandomPicker, TaskTemplate, TemplatePicker};
use crate::config::TrackerSettings;
use crate::error::Result;
use crate::storage::{SqliteStorage, WipeStats};
use std::sync::Arc;

/// Daily engagement and year aggregation over one database.
pub struct Tracker {
    storage: SqliteStorage,
    catalog: Arc<dyn Catalog>,
    picker: Box<dyn TemplatePicker>,
    settings: TrackerSettings,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("storage", &self.storage)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    /// Create a tracker that picks templates at random.
    #[must_use]
    pub fn new(storage: SqliteStorage, catalog: Arc<dyn Catalog>, settings: TrackerSettings) -> Self {
        Self {
            storage,
            catalog,
            picker: Box::new(RandomPicker),
            settings,
        }
    }

    /// Replace the template selection strategy.
    #[must_use]
    pub fn with_picker(mut self, picker: impl TemplatePicker + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    #[must_use]
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    #[must_use]
    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Delete everything stored for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails; nothing is removed in that case.
    pub fn wipe_account(&mut self, user_id: &str) -> Result<WipeStats> {
        let stats = self.storage.wipe_user(user_id)?;
        tracing::info!(user_id, rows = stats.total(), "Wiped account");
        Ok(stats)
    }

    /// A template by id, tolerating ids the catalog no longer knows.
    fn lookup_template(&self, template_id: &str) -> Result<Option<TaskTemplate>> {
        self.catalog.template(template_id)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::catalog::{SequentialPicker, StaticCatalog};
    use crate::model::YearPlan;
    use chrono::NaiveDate;

    pub const USER: &str = "u1";

    pub fn tracker() -> Tracker {
        tracker_with(StaticCatalog::builtin(), TrackerSettings::default())
    }

    pub fn tracker_with(catalog: StaticCatalog, settings: TrackerSettings) -> Tracker {
        Tracker::new(
            SqliteStorage::open_memory().unwrap(),
            Arc::new(catalog),
            settings,
        )
        .with_picker(SequentialPicker::new())
    }

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn with_plan(tracker: &mut Tracker, year: i32) -> YearPlan {
        tracker.create_plan(USER, year, "steady").unwrap()
    }

    /// A catalog with exactly the given templates, each carrying the listed tags.
    pub fn catalog_of(templates: &[(&str, &[&str], &[&str])]) -> StaticCatalog {
        let builtin = StaticCatalog::builtin();
        let base = builtin.templates[0].clone();
        StaticCatalog::new(
            templates
                .iter()
                .map(|(id, tags, directions)| TaskTemplate {
                    id: (*id).to_string(),
                    title: format!("Template {id}"),
                    trace_tags: tags.iter().map(ToString::to_string).collect(),
                    direction_tags: directions.iter().map(ToString::to_string).collect(),
                    moods: Vec::new(),
                    ..base.clone()
                })
                .collect(),
            builtin.programs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;

    #[test]
    fn test_wipe_account_removes_everything() {
        let mut tracker = tracker();
        with_plan(&mut tracker, 2024);
        let today = tracker.today(USER, day(2024, 3, 1)).unwrap();
        tracker
            .complete_task(USER, &today.tasks[0].task_id, None)
            .unwrap();

        let stats = tracker.wipe_account(USER).unwrap();
        assert_eq!(stats.task_sets, 1);
        assert_eq!(stats.year_plans, 1);
        assert!(stats.trace_events >= 1);

        let summary = tracker.summary(USER, 2024).unwrap();
        assert!(summary.plan.is_none());

        let directions: i64 = tracker
            .storage()
            .conn()
            .query_row("SELECT COUNT(*) FROM year_directions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(directions, 0);
    }
}
