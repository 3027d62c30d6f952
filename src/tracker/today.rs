//! Daily task sets and bounded refresh.

use super::Tracker;
use crate::catalog::TaskTemplate;
use crate::error::{Error, Result};
use crate::model::{DailyTask, DailyTaskSet, SetSource, TaskStatus};
use crate::storage::tasks;
use crate::validate::{normalize_mood, validate_position};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

/// A current task resolved against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub task_id: String,
    pub position: u8,
    pub status: TaskStatus,
    pub template_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub template_type: String,
    pub duration_sec: Option<u32>,
    pub steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_from_task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_at: Option<i64>,
}

impl TaskView {
    /// Templates missing from the catalog still render, titled by their id.
    fn resolve(task: &DailyTask, template: Option<&TaskTemplate>) -> Self {
        Self {
            task_id: task.id.clone(),
            position: task.position,
            status: task.status,
            template_id: task.template_id.clone(),
            title: template.map_or_else(|| task.template_id.clone(), |t| t.title.clone()),
            description: template.map(|t| t.description.clone()).unwrap_or_default(),
            template_type: template.map(|t| t.template_type.clone()).unwrap_or_default(),
            duration_sec: template.and_then(|t| t.default_duration_sec),
            steps: template.map(|t| t.steps.clone()).unwrap_or_default(),
            replaced_from_task_id: task.replaced_from_task_id.clone(),
            done_at: task.done_at,
        }
    }
}

/// A user's day: current tasks plus the remaining refresh budget.
#[derive(Debug, Clone, Serialize)]
pub struct TodayView {
    pub set_id: String,
    pub date: NaiveDate,
    pub source: SetSource,
    pub refresh_count: u32,
    pub refresh_limit: u32,
    pub tasks: Vec<TaskView>,
}

impl TodayView {
    #[must_use]
    pub fn refreshes_left(&self) -> u32 {
        self.refresh_limit.saturating_sub(self.refresh_count)
    }
}

/// Result of a successful refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub refresh_count: u32,
    pub refresh_limit: u32,
    pub replaced_task_id: String,
    pub task: TaskView,
}

impl Tracker {
    /// Return the user's set for `date`, creating it on first access.
    ///
    /// Exactly one set exists per user and date. A creator that loses an
    /// insert race to a concurrent caller reads the winner's set instead.
    ///
    /// # Errors
    ///
    /// Returns `NoTemplateAvailable` if the catalog cannot fill a new set.
    pub fn ensure_task_set(
        &mut self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<(DailyTaskSet, Vec<DailyTask>)> {
        if let Some(found) = self.load_task_set(user_id, date)? {
            return Ok(found);
        }

        match self.create_task_set(user_id, date) {
            Ok(created) => Ok(created),
            Err(e) if e.is_unique_violation() => {
                tracing::warn!(user_id, %date, "Task set created concurrently, reading the stored one");
                self.load_task_set(user_id, date)?.ok_or_else(|| {
                    Error::Other(format!("task set for {date} missing after insert conflict"))
                })
            }
            Err(e) => Err(e),
        }
    }

    fn load_task_set(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<(DailyTaskSet, Vec<DailyTask>)>> {
        let conn = self.storage.conn();
        let Some(set) = tasks::find_set(conn, user_id, date)? else {
            return Ok(None);
        };
        let current = tasks::current_tasks(conn, &set.id)?;
        Ok(Some((set, current)))
    }

    fn create_task_set(
        &mut self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<(DailyTaskSet, Vec<DailyTask>)> {
        let candidates = self.catalog.active_templates()?;
        let picked = self
            .picker
            .pick_distinct(&candidates, usize::from(self.settings.tasks_per_day))
            .ok_or(Error::NoTemplateAvailable)?;

        let set = DailyTaskSet::new(user_id, date);
        let created: Vec<DailyTask> = picked
            .iter()
            .zip(1u8..)
            .map(|(template, position)| DailyTask::new(&set.id, &template.id, position))
            .collect();

        self.storage.mutate("ensure_task_set", user_id, |tx, _ctx| {
            tasks::insert_set(tx, &set)?;
            for task in &created {
                tasks::insert_current_task(tx, task)?;
            }
            Ok(())
        })?;

        tracing::info!(user_id, %date, set_id = %set.id, "Created daily task set");
        Ok((set, created))
    }

    /// The user's tasks for `date` with catalog details and refresh budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the set cannot be loaded or created.
    pub fn today(&mut self, user_id: &str, date: NaiveDate) -> Result<TodayView> {
        let (set, current) = self.ensure_task_set(user_id, date)?;
        let tasks = current
            .iter()
            .map(|task| {
                let template = self.lookup_template(&task.template_id)?;
                Ok(TaskView::resolve(task, template.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TodayView {
            set_id: set.id,
            date: set.date,
            source: set.source,
            refresh_count: set.refresh_count,
            refresh_limit: self.settings.refresh_limit,
            tasks,
        })
    }

    /// Replace the current task at `position` with a new template.
    ///
    /// The refresh counter, the old task's skip and the new task's insert
    /// happen in one transaction: any failure leaves the counter untouched.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a position outside the set
    /// - `RefreshLimitExceeded` once the day's budget is spent
    /// - `TaskNotFound` if the slot is empty
    /// - `InvalidTaskStatus` if the current task is no longer pending
    /// - `NoTemplateAvailable` if every eligible template is already assigned
    pub fn refresh(
        &mut self,
        user_id: &str,
        date: NaiveDate,
        position: u8,
        mood: Option<&str>,
        reason: Option<&str>,
    ) -> Result<RefreshOutcome> {
        validate_position(position, usize::from(self.settings.tasks_per_day))?;
        let (set, _) = self.ensure_task_set(user_id, date)?;

        let candidates = self.catalog.active_templates()?;
        let mood = mood.map(normalize_mood);
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or("refreshed");
        let limit = self.settings.refresh_limit;
        let picker = &self.picker;

        let (refresh_count, replaced, task, template) =
            self.storage.mutate("refresh", user_id, |tx, _ctx| {
                let count = tasks::try_increment_refresh(tx, &set.id, limit)?
                    .ok_or(Error::RefreshLimitExceeded { limit })?;

                let old = tasks::current_task_at(tx, &set.id, position)?.ok_or_else(|| {
                    Error::TaskNotFound {
                        id: format!("{}#{position}", set.id),
                    }
                })?;
                if old.status != TaskStatus::Pending {
                    return Err(Error::InvalidTaskStatus {
                        expected: TaskStatus::Pending.as_str().to_string(),
                        actual: old.status.as_str().to_string(),
                    });
                }

                let excluded: HashSet<String> = tasks::current_tasks(tx, &set.id)?
                    .into_iter()
                    .map(|t| t.template_id)
                    .collect();
                let template = picker
                    .pick(&candidates, &excluded, mood.as_deref())
                    .ok_or(Error::NoTemplateAvailable)?;

                let now = chrono::Utc::now().timestamp_millis();
                tasks::mark_skipped(tx, &old.id, Some(reason), now)?;

                let task = DailyTask::new(&set.id, &template.id, position).replacing(&old.id);
                tasks::insert_current_task(tx, &task)?;

                Ok((count, old.id, task, template))
            })?;

        tracing::debug!(user_id, %date, position, refresh_count, "Refreshed task");
        Ok(RefreshOutcome {
            refresh_count,
            refresh_limit: limit,
            replaced_task_id: replaced,
            task: TaskView::resolve(&task, Some(&template)),
        })
    }
}
