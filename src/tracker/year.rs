//! Year aggregation, records, review and poster.
//!
//! Everything here reads the trace log of one `(user, year)`. Rankings are
//! count descending, then tag ascending, so the same data always produces
//! the same order. Empty data yields empty results, never an error.

use super::Tracker;
use crate::catalog::TaskTemplate;
use crate::error::{Error, Result};
use crate::model::{
    DailyTask, MicroNote, NightAnswer, NightSession, RelatedType, ReviewContent, ReviewSnapshot,
    YearPlan,
};
use crate::storage::{night, notes, plans, reviews, tasks, trace};
use crate::validate::{validate_month, validate_year};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::cmp::Reverse;

const HIGHLIGHT_COUNT: usize = 2;
const IDENTITY_TAGS: usize = 2;
const DIRECTION_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceCount {
    pub trace_tag: String,
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectionCount {
    pub direction_id: String,
    pub title: String,
    pub count: u64,
}

/// A gentle "who you have been" line derived from the top tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftIdentity {
    pub title: String,
    pub reason_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub plan: Option<YearPlan>,
    pub trace_counts: Vec<TraceCount>,
    pub direction_counts: Vec<DirectionCount>,
    pub soft_identity: Option<SoftIdentity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectionDetail {
    pub year: i32,
    pub direction_id: String,
    pub title: String,
    pub trace_counts: Vec<TraceCount>,
    /// Active templates that lead in this direction.
    pub suggestions: Vec<TaskTemplate>,
}

/// One completed task or finished night session in a month feed.
#[derive(Debug, Clone, Serialize)]
pub struct MonthRecord {
    pub record_type: RelatedType,
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub completed_at: i64,
    pub note: Option<String>,
}

/// Full view of a single task or night session.
#[derive(Debug, Clone, Serialize)]
pub struct RecordDetail {
    pub record_type: RelatedType,
    pub id: String,
    pub date: NaiveDate,
    pub status: String,
    pub title: String,
    pub description: String,
    /// Template type for tasks, program type for sessions.
    pub kind: String,
    pub duration_sec: Option<u32>,
    pub completed_at: Option<i64>,
    pub trace_tags: Vec<String>,
    pub answers: Vec<NightAnswer>,
    pub note: Option<MicroNote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PosterResult {
    pub review_id: String,
    pub poster_url: String,
}

impl Tracker {
    /// Trace and direction counts for a year.
    ///
    /// Without a plan for the year everything is empty. An archived plan
    /// still reports the events recorded while it was active.
    ///
    /// # Errors
    ///
    /// Returns an error if the year is out of range or a query fails.
    pub fn summary(&self, user_id: &str, year: i32) -> Result<YearSummary> {
        let year = validate_year(year)?;
        let conn = self.storage.conn();
        let Some(plan) = plans::find_plan(conn, user_id, year)? else {
            return Ok(YearSummary {
                year,
                plan: None,
                trace_counts: Vec::new(),
                direction_counts: Vec::new(),
                soft_identity: None,
            });
        };

        let trace_counts = self.label_counts(trace::tag_counts(conn, user_id, year, None)?);
        let direction_counts = trace::direction_counts(conn, user_id, year)?
            .into_iter()
            .map(|(direction_id, count)| DirectionCount {
                title: self.settings.direction_title(&direction_id).to_string(),
                direction_id,
                count,
            })
            .collect();
        let soft_identity = trace_counts.first().map(|top| SoftIdentity {
            title: self.settings.identity_label(&top.trace_tag).to_string(),
            reason_tags: trace_counts
                .iter()
                .take(IDENTITY_TAGS)
                .map(|c| c.trace_tag.clone())
                .collect(),
        });

        Ok(YearSummary {
            year,
            plan: Some(plan),
            trace_counts,
            direction_counts,
            soft_identity,
        })
    }

    /// Trace counts within one direction plus a few templates to try next.
    ///
    /// # Errors
    ///
    /// Returns an error if the year is out of range or a query fails.
    pub fn direction_detail(&self, user_id: &str, year: i32, direction_id: &str) -> Result<DirectionDetail> {
        let year = validate_year(year)?;
        let counts = trace::tag_counts(self.storage.conn(), user_id, year, Some(direction_id))?;
        let suggestions = self
            .catalog
            .active_templates()?
            .into_iter()
            .filter(|t| t.direction_tags.iter().any(|d| d == direction_id))
            .take(DIRECTION_SUGGESTIONS)
            .collect();

        Ok(DirectionDetail {
            year,
            direction_id: direction_id.to_string(),
            title: self.settings.direction_title(direction_id).to_string(),
            trace_counts: self.label_counts(counts),
            suggestions,
        })
    }

    /// Completed tasks and finished sessions dated in a month, newest first.
    ///
    /// Ordered by date, then completion time, both descending, then id.
    ///
    /// # Errors
    ///
    /// Returns an error if the year or month is out of range or a query fails.
    pub fn month_records(&self, user_id: &str, year: i32, month: u32) -> Result<Vec<MonthRecord>> {
        let (from, to) = month_bounds(validate_year(year)?, validate_month(month)?)?;
        let conn = self.storage.conn();
        let mut records = Vec::new();

        for (task, date) in tasks::done_tasks_between(conn, user_id, from, to)? {
            let title = self
                .lookup_template(&task.template_id)?
                .map_or_else(|| task.template_id.clone(), |t| t.title);
            let note = notes::note_for(conn, user_id, RelatedType::DailyTask, &task.id)?;
            records.push(MonthRecord {
                record_type: RelatedType::DailyTask,
                completed_at: task.done_at.unwrap_or(task.created_at),
                id: task.id,
                date,
                title,
                note: note.map(|n| n.content),
            });
        }

        for session in night::finished_sessions_between(conn, user_id, from, to)? {
            let title = self
                .catalog
                .night_program(&session.program_id)?
                .map_or_else(|| session.program_id.clone(), |p| p.title);
            let note = notes::note_for(conn, user_id, RelatedType::NightSession, &session.id)?;
            records.push(MonthRecord {
                record_type: RelatedType::NightSession,
                completed_at: session.finished_at.unwrap_or(session.started_at),
                id: session.id,
                date: session.date,
                title,
                note: note.map(|n| n.content),
            });
        }

        records.sort_by(|a, b| {
            (Reverse(a.date), Reverse(a.completed_at), &a.id).cmp(&(
                Reverse(b.date),
                Reverse(b.completed_at),
                &b.id,
            ))
        });
        Ok(records)
    }

    /// A single task or night session with its catalog entry and note.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` / `NightSessionNotFound` for unknown or
    /// foreign ids.
    pub fn record_detail(&self, user_id: &str, record_type: RelatedType, id: &str) -> Result<RecordDetail> {
        let conn = self.storage.conn();
        let note = notes::note_for(conn, user_id, record_type, id)?;
        match record_type {
            RelatedType::DailyTask => {
                let (task, date) =
                    tasks::find_task_for_user(conn, user_id, id)?.ok_or_else(|| Error::TaskNotFound {
                        id: id.to_string(),
                    })?;
                let template = self.lookup_template(&task.template_id)?;
                Ok(self.task_detail(task, date, template.as_ref(), note))
            }
            RelatedType::NightSession => {
                let session = night::find_session(conn, user_id, id)?.ok_or_else(|| {
                    Error::NightSessionNotFound { id: id.to_string() }
                })?;
                self.session_detail(session, note)
            }
        }
    }

    fn task_detail(
        &self,
        task: DailyTask,
        date: NaiveDate,
        template: Option<&TaskTemplate>,
        note: Option<MicroNote>,
    ) -> RecordDetail {
        let trace_tags = match template {
            Some(t) if !t.trace_tags.is_empty() => t.trace_tags.clone(),
            _ => vec![self.settings.default_trace_tag.clone()],
        };
        RecordDetail {
            record_type: RelatedType::DailyTask,
            date,
            status: task.status.as_str().to_string(),
            title: template.map_or_else(|| task.template_id.clone(), |t| t.title.clone()),
            description: template.map(|t| t.description.clone()).unwrap_or_default(),
            kind: template.map(|t| t.template_type.clone()).unwrap_or_default(),
            duration_sec: template.and_then(|t| t.default_duration_sec),
            completed_at: task.done_at,
            trace_tags,
            answers: Vec::new(),
            note,
            id: task.id,
        }
    }

    fn session_detail(&self, session: NightSession, note: Option<MicroNote>) -> Result<RecordDetail> {
        let program = self.catalog.night_program(&session.program_id)?;
        Ok(RecordDetail {
            record_type: RelatedType::NightSession,
            date: session.date,
            status: session.status.as_str().to_string(),
            title: program
                .as_ref()
                .map_or_else(|| session.program_id.clone(), |p| p.title.clone()),
            description: String::new(),
            kind: program.as_ref().map(|p| p.program_type.clone()).unwrap_or_default(),
            duration_sec: program.as_ref().and_then(|p| p.duration_sec),
            completed_at: session.finished_at,
            trace_tags: program.map(|p| p.trace_tags).unwrap_or_default(),
            answers: session.answers,
            note,
            id: session.id,
        })
    }

    /// Build and store a new review snapshot for the year.
    ///
    /// Each call stores a new row, even when nothing changed since the last.
    ///
    /// # Errors
    ///
    /// Returns `PlanNotFound` if the user has no plan for the year.
    pub fn generate_review(&mut self, user_id: &str, year: i32) -> Result<ReviewSnapshot> {
        let year = validate_year(year)?;
        let settings = &self.settings;

        let review = self.storage.mutate("generate_review", user_id, |tx, _ctx| {
            let plan = plans::find_plan(tx, user_id, year)?.ok_or(Error::PlanNotFound { year })?;
            let counts = trace::tag_counts(tx, user_id, year, None)?;

            let core = settings
                .theme(&plan.theme_id)
                .map_or(plan.theme_title.as_str(), |t| t.core.as_str());
            let highlights = counts
                .iter()
                .take(HIGHLIGHT_COUNT)
                .map(|(tag, count)| format!("You {} {count} times", settings.trace_label(tag)))
                .collect();
            let identity = counts.first().map_or_else(
                || settings.default_identity.clone(),
                |(tag, _)| settings.identity_label(tag).to_string(),
            );

            let content = ReviewContent {
                title: format!("{year}, a year of {core}"),
                highlights,
                identity,
                closing: settings.closing.clone(),
            };
            let review = ReviewSnapshot::new(user_id, &plan.id, year, content);
            reviews::insert_review(tx, &review)?;
            Ok(review)
        })?;

        tracing::info!(user_id, year, review_id = %review.id, "Generated review");
        Ok(review)
    }

    /// Attach a poster URL to a review. The first call decides the URL;
    /// later calls return it whatever template they ask for.
    ///
    /// # Errors
    ///
    /// - `ReviewNotFound` for unknown or foreign reviews
    /// - `InvalidArgument` for a template name outside `[A-Za-z0-9_-]` when
    ///   no poster is stored yet
    pub fn generate_poster(&mut self, user_id: &str, review_id: &str, template: &str) -> Result<PosterResult> {
        let prefix = self.settings.poster_prefix.trim_end_matches('/');

        let poster_url = self.storage.mutate("generate_poster", user_id, |tx, _ctx| {
            let not_found = || Error::ReviewNotFound {
                id: review_id.to_string(),
            };
            let review = reviews::find_review(tx, user_id, review_id)?.ok_or_else(not_found)?;
            if let Some(existing) = review.poster_url {
                return Ok(existing);
            }

            // The template only matters for the call that decides the URL.
            if template.is_empty()
                || !template
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(Error::InvalidArgument(format!(
                    "invalid poster template: '{template}'"
                )));
            }
            let url = format!("{prefix}/{review_id}-{template}.png");
            reviews::set_poster_once(tx, review_id, &url)?;
            reviews::find_review(tx, user_id, review_id)?
                .and_then(|r| r.poster_url)
                .ok_or_else(not_found)
        })?;

        Ok(PosterResult {
            review_id: review_id.to_string(),
            poster_url,
        })
    }

    fn label_counts(&self, counts: Vec<(String, u64)>) -> Vec<TraceCount> {
        counts
            .into_iter()
            .map(|(trace_tag, count)| TraceCount {
                label: self.settings.trace_label(&trace_tag).to_string(),
                trace_tag,
                count,
            })
            .collect()
    }
}

/// First and last day of a month.
fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || Error::InvalidArgument(format!("invalid month: {year}-{month:02}"));
    let from = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let to = next.and_then(|d| d.pred_opt()).ok_or_else(invalid)?;
    debug_assert_eq!(to.month(), month);
    Ok((from, to))
}
