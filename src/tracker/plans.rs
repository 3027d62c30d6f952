//! Year plans and themes.

use super::Tracker;
use crate::config::Theme;
use crate::error::{Error, Result};
use crate::model::{DirectionUpdate, PlanDirection, PlanStatus, YearPlan};
use crate::storage::{directions, plans};
use crate::validate::validate_year;
use serde::Serialize;

/// A user's plan for one year together with its directions.
#[derive(Debug, Clone, Serialize)]
pub struct PlanView {
    pub year: i32,
    pub plan: Option<YearPlan>,
    /// Empty without a plan.
    pub directions: Vec<PlanDirection>,
}

impl Tracker {
    #[must_use]
    pub fn themes(&self) -> &[Theme] {
        &self.settings.themes
    }

    /// Create or replace the user's plan for `year`.
    ///
    /// An existing plan keeps its id and is re-activated with the new theme.
    /// The configured directions are added to the plan; directions the user
    /// already arranged are left alone.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an out-of-range year
    /// - `InvalidTheme` if the theme is not configured
    pub fn create_plan(&mut self, user_id: &str, year: i32, theme_id: &str) -> Result<YearPlan> {
        let year = validate_year(year)?;
        let theme = self
            .settings
            .theme(theme_id)
            .ok_or_else(|| Error::InvalidTheme {
                id: theme_id.to_string(),
            })?;
        let plan = YearPlan::new(user_id, year, &theme.theme_id, &theme.title);
        let defaults = self.configured_directions();

        let stored = self.storage.mutate("create_plan", user_id, |tx, _ctx| {
            let stored = plans::upsert_plan(tx, &plan)?;
            directions::seed_directions(tx, &stored.id, &defaults)?;
            Ok(stored)
        })?;
        tracing::info!(user_id, year, theme_id, plan_id = %stored.id, "Saved year plan");
        Ok(stored)
    }

    /// # Errors
    ///
    /// Returns an error if the year is out of range or the query fails.
    pub fn get_plan(&self, user_id: &str, year: i32) -> Result<PlanView> {
        let year = validate_year(year)?;
        let conn = self.storage.conn();
        let plan = plans::find_plan(conn, user_id, year)?;
        let directions = match &plan {
            None => Vec::new(),
            Some(plan) => {
                let stored = directions::plan_directions(conn, &plan.id)?;
                if stored.is_empty() {
                    self.configured_directions()
                } else {
                    stored
                }
            }
        };
        Ok(PlanView {
            year,
            plan,
            directions,
        })
    }

    /// Enable, disable or reorder directions of a plan.
    ///
    /// All updates apply in one transaction; the first bad one rolls back the
    /// rest. Returns the plan's directions after the change.
    ///
    /// # Errors
    ///
    /// - `PlanIdNotFound` if the plan is absent or someone else's
    /// - `InvalidArgument` for a direction the plan does not have
    pub fn update_directions(
        &mut self,
        user_id: &str,
        plan_id: &str,
        updates: &[DirectionUpdate],
    ) -> Result<Vec<PlanDirection>> {
        let defaults = self.configured_directions();

        let updated = self.storage.mutate("update_directions", user_id, |tx, _ctx| {
            if plans::find_plan_by_id(tx, user_id, plan_id)?.is_none() {
                return Err(Error::PlanIdNotFound {
                    id: plan_id.to_string(),
                });
            }
            // Plans stored before directions were tracked have no rows yet.
            directions::seed_directions(tx, plan_id, &defaults)?;
            for update in updates {
                if !directions::update_direction(tx, plan_id, update)? {
                    return Err(Error::InvalidArgument(format!(
                        "unknown direction: '{}'",
                        update.direction_id
                    )));
                }
            }
            directions::plan_directions(tx, plan_id)
        })?;
        tracing::info!(user_id, plan_id, updates = updates.len(), "Updated plan directions");
        Ok(updated)
    }

    /// Archive the plan so no further trace events are recorded for the year.
    ///
    /// Archiving an already archived plan is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `PlanNotFound` if the user has no plan for `year`.
    pub fn archive_plan(&mut self, user_id: &str, year: i32) -> Result<YearPlan> {
        let plan = self.storage.mutate("archive_plan", user_id, |tx, _ctx| {
            if !plans::set_plan_status(tx, user_id, year, PlanStatus::Archived)? {
                return Err(Error::PlanNotFound { year });
            }
            plans::find_plan(tx, user_id, year)?.ok_or(Error::PlanNotFound { year })
        })?;
        tracing::info!(user_id, year, "Archived year plan");
        Ok(plan)
    }

    fn configured_directions(&self) -> Vec<PlanDirection> {
        self.settings
            .directions
            .iter()
            .zip(1..)
            .map(|(d, sort_order)| PlanDirection {
                direction_id: d.id.clone(),
                title: d.title.clone(),
                is_enabled: true,
                sort_order,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::testing::*;

    #[test]
    fn test_create_plan_upserts() {
        let mut tracker = tracker();
        let first = tracker.create_plan(USER, 2024, "self_care").unwrap();
        assert_eq!(first.theme_title, "Take care of myself");
        assert!(first.is_active());

        let second = tracker.create_plan(USER, 2024, "slow_down").unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.theme_id, "slow_down");

        let view = tracker.get_plan(USER, 2024).unwrap();
        assert_eq!(view.plan.unwrap().theme_id, "slow_down");
        let ids: Vec<_> = view.directions.iter().map(|d| d.direction_id.as_str()).collect();
        assert_eq!(ids, vec!["emotion", "body", "order", "mind", "connection"]);
        assert!(view.directions.iter().all(|d| d.is_enabled));
    }

    #[test]
    fn test_no_plan_has_no_directions() {
        let tracker = tracker();
        assert!(tracker.get_plan(USER, 2024).unwrap().directions.is_empty());
    }

    fn update(id: &str, is_enabled: Option<bool>, sort_order: Option<u32>) -> DirectionUpdate {
        DirectionUpdate {
            direction_id: id.to_string(),
            is_enabled,
            sort_order,
        }
    }

    #[test]
    fn test_update_directions_reorders_and_disables() {
        let mut tracker = tracker();
        let plan = with_plan(&mut tracker, 2024);

        let updated = tracker
            .update_directions(
                USER,
                &plan.id,
                &[update("connection", None, Some(0)), update("body", Some(false), None)],
            )
            .unwrap();
        assert_eq!(updated[0].direction_id, "connection");
        let body = updated.iter().find(|d| d.direction_id == "body").unwrap();
        assert!(!body.is_enabled);

        // Re-creating the plan keeps the arrangement.
        tracker.create_plan(USER, 2024, "slow_down").unwrap();
        let view = tracker.get_plan(USER, 2024).unwrap();
        assert_eq!(view.directions, updated);
    }

    #[test]
    fn test_update_directions_of_foreign_plan() {
        let mut tracker = tracker();
        let plan = with_plan(&mut tracker, 2024);

        let err = tracker
            .update_directions("intruder", &plan.id, &[update("body", Some(false), None)])
            .unwrap_err();
        assert!(matches!(err, Error::PlanIdNotFound { .. }));
        let err = tracker.update_directions(USER, "plan_missing", &[]).unwrap_err();
        assert!(matches!(err, Error::PlanIdNotFound { .. }));
    }

    #[test]
    fn test_update_unknown_direction_rolls_back() {
        let mut tracker = tracker();
        let plan = with_plan(&mut tracker, 2024);

        let err = tracker
            .update_directions(
                USER,
                &plan.id,
                &[update("body", Some(false), None), update("wealth", Some(true), None)],
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let view = tracker.get_plan(USER, 2024).unwrap();
        assert!(view.directions.iter().all(|d| d.is_enabled));
    }

    #[test]
    fn test_update_directions_of_plan_without_rows() {
        let mut tracker = tracker();
        let plan = with_plan(&mut tracker, 2024);
        tracker
            .storage()
            .conn()
            .execute("DELETE FROM year_directions WHERE plan_id = ?1", [&plan.id])
            .unwrap();
        assert_eq!(tracker.get_plan(USER, 2024).unwrap().directions.len(), 5);

        let updated = tracker
            .update_directions(USER, &plan.id, &[update("mind", Some(false), None)])
            .unwrap();
        assert_eq!(updated.len(), 5);
        assert_eq!(updated.iter().filter(|d| !d.is_enabled).count(), 1);
    }

    #[test]
    fn test_create_plan_rejects_unknown_theme() {
        let mut tracker = tracker();
        let err = tracker.create_plan(USER, 2024, "conquer").unwrap_err();
        assert!(matches!(err, Error::InvalidTheme { .. }));
        assert!(tracker.get_plan(USER, 2024).unwrap().plan.is_none());
    }

    #[test]
    fn test_archive_stops_trace_events() {
        let mut tracker = tracker();
        with_plan(&mut tracker, 2024);
        let archived = tracker.archive_plan(USER, 2024).unwrap();
        assert_eq!(archived.status, PlanStatus::Archived);

        let today = tracker.today(USER, day(2024, 5, 2)).unwrap();
        let done = tracker
            .complete_task(USER, &today.tasks[0].task_id, None)
            .unwrap();
        assert!(done.trace_events.is_empty());

        // Re-creating re-activates.
        let plan = tracker.create_plan(USER, 2024, "steady").unwrap();
        assert!(plan.is_active());
    }

    #[test]
    fn test_archive_missing_plan() {
        let mut tracker = tracker();
        let err = tracker.archive_plan(USER, 2030).unwrap_err();
        assert!(matches!(err, Error::PlanNotFound { year: 2030 }));
    }

    #[test]
    fn test_themes_are_configured() {
        let tracker = tracker();
        let ids: Vec<_> = tracker.themes().iter().map(|t| t.theme_id.as_str()).collect();
        assert_eq!(ids, vec!["self_care", "slow_down", "steady"]);
    }
}
