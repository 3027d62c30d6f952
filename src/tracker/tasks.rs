//! Completing and skipping tasks.

use super::Tracker;
use crate::error::{Error, Result};
use crate::model::{DailyTask, TaskStatus, TraceEvent, TraceEventType};
use crate::storage::{TraceSource, tasks, trace};
use serde::Serialize;

/// Result of completing a task.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub task_id: String,
    pub status: TaskStatus,
    pub feedback: String,
    pub trace_events: Vec<TraceEvent>,
}

impl Tracker {
    /// Mark a pending task done and record its trace events.
    ///
    /// One event is recorded per template trace tag, or a single event with
    /// the default tag when the template declares none. Events need an
    /// active plan for the year of the task's date.
    ///
    /// # Errors
    ///
    /// - `TaskNotFound` if the task does not exist or belongs to someone else
    /// - `InvalidTaskStatus` if the task is already done or skipped
    pub fn complete_task(
        &mut self,
        user_id: &str,
        task_id: &str,
        completed_at: Option<i64>,
    ) -> Result<Completion> {
        let at = completed_at.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let catalog = &self.catalog;
        let settings = &self.settings;

        let (feedback, trace_events) =
            self.storage
                .mutate_traced("complete_task", user_id, |tx, ctx| {
                    let (task, date) = owned_task(tx, user_id, task_id)?;
                    if !tasks::mark_done(tx, &task.id, at)? {
                        return Err(not_pending(&task));
                    }

                    let template = catalog.template(&task.template_id)?;
                    let declared: &[String] = template
                        .as_ref()
                        .map_or(&[][..], |t| t.trace_tags.as_slice());
                    let tags = if declared.is_empty() {
                        vec![settings.default_trace_tag.clone()]
                    } else {
                        declared.to_vec()
                    };
                    let direction = template
                        .as_ref()
                        .and_then(|t| t.direction_tags.first())
                        .map(String::as_str);

                    trace::emit(
                        tx,
                        ctx,
                        &TraceSource {
                            event_type: TraceEventType::TaskDone,
                            user_id,
                            source_id: &task.id,
                            date,
                            occurred_at: at,
                            direction_id: direction,
                        },
                        &tags,
                    )?;

                    Ok(settings.feedback_for(declared.first().map(String::as_str)))
                })?;

        tracing::debug!(user_id, task_id, traces = trace_events.len(), "Completed task");
        Ok(Completion {
            task_id: task_id.to_string(),
            status: TaskStatus::Done,
            feedback,
            trace_events,
        })
    }

    /// Mark a pending task skipped. No trace events are recorded.
    ///
    /// # Errors
    ///
    /// - `TaskNotFound` if the task does not exist or belongs to someone else
    /// - `InvalidTaskStatus` if the task is already done or skipped
    pub fn skip_task(
        &mut self,
        user_id: &str,
        task_id: &str,
        reason: Option<&str>,
    ) -> Result<DailyTask> {
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());

        let task = self.storage.mutate("skip_task", user_id, |tx, _ctx| {
            let (task, _) = owned_task(tx, user_id, task_id)?;
            let now = chrono::Utc::now().timestamp_millis();
            if !tasks::mark_skipped(tx, &task.id, reason, now)? {
                return Err(not_pending(&task));
            }
            let (task, _) = owned_task(tx, user_id, task_id)?;
            Ok(task)
        })?;

        tracing::debug!(user_id, task_id, "Skipped task");
        Ok(task)
    }
}

fn owned_task(
    conn: &rusqlite::Connection,
    user_id: &str,
    task_id: &str,
) -> Result<(DailyTask, chrono::NaiveDate)> {
    tasks::find_task_for_user(conn, user_id, task_id)?.ok_or_else(|| Error::TaskNotFound {
        id: task_id.to_string(),
    })
}

fn not_pending(task: &DailyTask) -> Error {
    Error::InvalidTaskStatus {
        expected: TaskStatus::Pending.as_str().to_string(),
        actual: task.status.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerSettings;
    use crate::tracker::testing::*;

    /// The sequential picker always places the first built-in template at
    /// position 1.
    fn first_template_tag_count() -> usize {
        crate::catalog::StaticCatalog::builtin().templates[0].trace_tags.len()
    }

    fn first_task(tracker: &mut Tracker) -> String {
        tracker.today(USER, day(2024, 3, 1)).unwrap().tasks[0].task_id.clone()
    }

    #[test]
    fn test_complete_emits_one_event_per_tag() {
        let mut tracker = tracker_with(
            catalog_of(&[
                ("a", &["self_care", "observe"], &["body", "mind"]),
                ("b", &[], &[]),
                ("c", &["reset"], &[]),
            ]),
            TrackerSettings::default(),
        );
        with_plan(&mut tracker, 2024);
        let task_id = first_task(&mut tracker);

        let done = tracker.complete_task(USER, &task_id, Some(42)).unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert_eq!(done.trace_events.len(), 2);
        let tags: Vec<_> = done.trace_events.iter().map(|e| e.trace_tag.as_str()).collect();
        assert_eq!(tags, vec!["self_care", "observe"]);
        assert!(done.trace_events.iter().all(|e| {
            e.occurred_at == 42
                && e.source_id == task_id
                && e.direction_id.as_deref() == Some("body")
                && e.event_type == TraceEventType::TaskDone
        }));
        assert_eq!(done.feedback, "You made a little room for yourself.");
    }

    #[test]
    fn test_complete_without_tags_uses_default() {
        let mut tracker = tracker_with(
            catalog_of(&[("a", &[], &[]), ("b", &[], &[]), ("c", &[], &[])]),
            TrackerSettings::default(),
        );
        with_plan(&mut tracker, 2024);
        let task_id = first_task(&mut tracker);

        let done = tracker.complete_task(USER, &task_id, None).unwrap();
        assert_eq!(done.trace_events.len(), 1);
        assert_eq!(done.trace_events[0].trace_tag, "self_care");
        assert!(done.trace_events[0].direction_id.is_none());
        assert_eq!(done.feedback, "Done. That counts.");
    }

    #[test]
    fn test_complete_without_plan_records_nothing() {
        let mut tracker = tracker();
        let task_id = first_task(&mut tracker);

        let done = tracker.complete_task(USER, &task_id, None).unwrap();
        assert!(done.trace_events.is_empty());
        assert!(!done.feedback.is_empty());

        let conn = tracker.storage().conn();
        assert!(trace::events_for_year(conn, USER, 2024).unwrap().is_empty());
    }

    #[test]
    fn test_complete_twice_is_rejected() {
        let mut tracker = tracker();
        with_plan(&mut tracker, 2024);
        let task_id = first_task(&mut tracker);

        tracker.complete_task(USER, &task_id, None).unwrap();
        let err = tracker.complete_task(USER, &task_id, None).unwrap_err();
        assert!(matches!(err, Error::InvalidTaskStatus { ref actual, .. } if actual == "done"));

        // The failed attempt recorded nothing.
        let conn = tracker.storage().conn();
        let events = trace::events_for_source(conn, USER, &task_id).unwrap();
        assert_eq!(events.len(), first_template_tag_count());
    }

    #[test]
    fn test_foreign_or_missing_task() {
        let mut tracker = tracker();
        let task_id = first_task(&mut tracker);

        assert!(matches!(
            tracker.complete_task("intruder", &task_id, None).unwrap_err(),
            Error::TaskNotFound { .. }
        ));
        assert!(matches!(
            tracker.skip_task(USER, "task_missing", None).unwrap_err(),
            Error::TaskNotFound { .. }
        ));
    }

    #[test]
    fn test_skip_then_complete() {
        let mut tracker = tracker();
        with_plan(&mut tracker, 2024);
        let task_id = first_task(&mut tracker);

        let skipped = tracker.skip_task(USER, &task_id, Some("not today")).unwrap();
        assert_eq!(skipped.status, TaskStatus::Skipped);
        assert_eq!(skipped.skip_reason.as_deref(), Some("not today"));
        assert!(skipped.skipped_at.is_some());

        assert!(matches!(
            tracker.complete_task(USER, &task_id, None).unwrap_err(),
            Error::InvalidTaskStatus { .. }
        ));
        assert!(matches!(
            tracker.skip_task(USER, &task_id, None).unwrap_err(),
            Error::InvalidTaskStatus { .. }
        ));
        let conn = tracker.storage().conn();
        assert!(trace::events_for_source(conn, USER, &task_id).unwrap().is_empty());
    }
}
