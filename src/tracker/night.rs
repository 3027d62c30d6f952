//! Night session lifecycle.

use super::Tracker;
use crate::catalog::NightProgram;
use crate::error::{Error, Result};
use crate::model::{NightAnswer, NightSession, NightStatus, TraceEvent, TraceEventType};
use crate::storage::{TraceSource, night, trace};
use chrono::NaiveDate;
use serde::Serialize;

/// Result of starting a night session.
#[derive(Debug, Clone, Serialize)]
pub struct NightStart {
    pub session: NightSession,
    /// False when an earlier session for the same date was returned.
    pub created: bool,
}

/// Result of finishing a night session.
#[derive(Debug, Clone, Serialize)]
pub struct NightFinish {
    pub session_id: String,
    pub status: NightStatus,
    pub feedback: String,
    pub trace_events: Vec<TraceEvent>,
}

impl Tracker {
    /// All night programs in catalog order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    pub fn programs(&self) -> Result<Vec<NightProgram>> {
        self.catalog.night_programs()
    }

    /// Start the user's night session for `date`.
    ///
    /// A user has at most one session per date. If one exists it is returned
    /// unchanged, even when `program_id` differs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProgram` if no session exists yet and the program is unknown.
    pub fn start_night(&mut self, user_id: &str, date: NaiveDate, program_id: &str) -> Result<NightStart> {
        if let Some(session) = night::find_session_on(self.storage.conn(), user_id, date)? {
            return Ok(NightStart {
                session,
                created: false,
            });
        }

        let program = self
            .catalog
            .night_program(program_id)?
            .ok_or_else(|| Error::InvalidProgram {
                id: program_id.to_string(),
            })?;

        let session = NightSession::new(user_id, date, &program.program_id);
        match self
            .storage
            .mutate("start_night", user_id, |tx, _ctx| night::insert_session(tx, &session))
        {
            Ok(()) => {
                tracing::info!(user_id, %date, program_id, "Started night session");
                Ok(NightStart {
                    session,
                    created: true,
                })
            }
            Err(e) if e.is_unique_violation() => {
                tracing::warn!(user_id, %date, "Night session created concurrently, reading the stored one");
                let session = night::find_session_on(self.storage.conn(), user_id, date)?
                    .ok_or_else(|| {
                        Error::Other(format!("night session for {date} missing after insert conflict"))
                    })?;
                Ok(NightStart {
                    session,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Finish a started session, storing answers and recording trace events.
    ///
    /// One event is recorded per program trace tag; a program without tags
    /// records none.
    ///
    /// # Errors
    ///
    /// - `NightSessionNotFound` if the session is absent or someone else's
    /// - `InvalidSessionStatus` if it is already finished
    pub fn finish_night(
        &mut self,
        user_id: &str,
        session_id: &str,
        answers: &[NightAnswer],
        finished_at: Option<i64>,
    ) -> Result<NightFinish> {
        let at = finished_at.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let catalog = &self.catalog;

        let ((), trace_events) = self.storage.mutate_traced("finish_night", user_id, |tx, ctx| {
            let session = night::find_session(tx, user_id, session_id)?.ok_or_else(|| {
                Error::NightSessionNotFound {
                    id: session_id.to_string(),
                }
            })?;
            if !night::mark_finished(tx, &session.id, answers, at)? {
                return Err(Error::InvalidSessionStatus {
                    expected: NightStatus::Started.as_str().to_string(),
                    actual: session.status.as_str().to_string(),
                });
            }

            let program = catalog.night_program(&session.program_id)?;
            let tags = program.as_ref().map(|p| p.trace_tags.clone()).unwrap_or_default();
            let direction = program
                .as_ref()
                .and_then(|p| p.direction_tags.first())
                .map(String::as_str);

            trace::emit(
                tx,
                ctx,
                &TraceSource {
                    event_type: TraceEventType::NightDone,
                    user_id,
                    source_id: &session.id,
                    date: session.date,
                    occurred_at: at,
                    direction_id: direction,
                },
                &tags,
            )?;
            Ok(())
        })?;

        tracing::debug!(user_id, session_id, traces = trace_events.len(), "Finished night session");
        Ok(NightFinish {
            session_id: session_id.to_string(),
            status: NightStatus::Finished,
            feedback: self.settings.night_feedback.clone(),
            trace_events,
        })
    }
}
