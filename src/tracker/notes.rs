//! Micro notes attached to tasks and night sessions.

use super::Tracker;
use crate::error::{Error, Result};
use crate::model::{MicroNote, RelatedType, TraceEventType};
use crate::storage::{TraceSource, night, notes, tasks, trace};
use crate::validate::normalize_mood;
use chrono::NaiveDate;
use rusqlite::Connection;

const NOTE_TRACE_TAG: &str = "observe";
const MAX_NOTE_LEN: usize = 500;

impl Tracker {
    /// Attach a note to one of the user's tasks or night sessions.
    ///
    /// `date` defaults to the date of the related record. With an active plan
    /// for that year one `note_added` event tagged `observe` is recorded.
    ///
    /// # Errors
    ///
    /// - `TaskNotFound` / `NightSessionNotFound` if the related record is
    ///   absent or someone else's
    /// - `InvalidArgument` for empty or oversized content
    pub fn create_note(
        &mut self,
        user_id: &str,
        related_type: RelatedType,
        related_id: &str,
        date: Option<NaiveDate>,
        mood: Option<&str>,
        content: &str,
    ) -> Result<MicroNote> {
        let content = check_content(content)?;
        let mood = mood.map(normalize_mood).filter(|m| !m.is_empty());

        let (note, _) = self.storage.mutate_traced("create_note", user_id, |tx, ctx| {
            let related_date = related_date(tx, user_id, related_type, related_id)?;
            let note = MicroNote::new(
                user_id,
                related_type,
                related_id,
                date.unwrap_or(related_date),
                content,
            )
            .with_mood(mood.as_deref());
            notes::insert_note(tx, &note)?;

            trace::emit(
                tx,
                ctx,
                &TraceSource {
                    event_type: TraceEventType::NoteAdded,
                    user_id,
                    source_id: related_id,
                    date: note.date,
                    occurred_at: note.created_at,
                    direction_id: None,
                },
                &[NOTE_TRACE_TAG.to_string()],
            )?;
            Ok(note)
        })?;

        tracing::debug!(user_id, note_id = %note.id, related_id, "Added note");
        Ok(note)
    }

    /// Replace a note's content, and its mood when one is given.
    ///
    /// # Errors
    ///
    /// Returns `NoteNotFound` for absent or foreign notes.
    pub fn update_note(
        &mut self,
        user_id: &str,
        note_id: &str,
        content: &str,
        mood: Option<&str>,
    ) -> Result<MicroNote> {
        let content = check_content(content)?;
        let mood = mood.map(normalize_mood).filter(|m| !m.is_empty());

        self.storage.mutate("update_note", user_id, |tx, _ctx| {
            if !notes::update_note(tx, user_id, note_id, content, mood.as_deref())? {
                return Err(note_not_found(note_id));
            }
            notes::find_note(tx, user_id, note_id)?.ok_or_else(|| note_not_found(note_id))
        })
    }

    /// # Errors
    ///
    /// Returns `NoteNotFound` for absent or foreign notes.
    pub fn delete_note(&mut self, user_id: &str, note_id: &str) -> Result<()> {
        self.storage.mutate("delete_note", user_id, |tx, _ctx| {
            if notes::delete_note(tx, user_id, note_id)? {
                Ok(())
            } else {
                Err(note_not_found(note_id))
            }
        })?;
        tracing::debug!(user_id, note_id, "Deleted note");
        Ok(())
    }
}

fn check_content(content: &str) -> Result<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::InvalidArgument("note content is empty".to_string()));
    }
    if content.chars().count() > MAX_NOTE_LEN {
        return Err(Error::InvalidArgument(format!(
            "note content is longer than {MAX_NOTE_LEN} characters"
        )));
    }
    Ok(content)
}

fn note_not_found(note_id: &str) -> Error {
    Error::NoteNotFound {
        id: note_id.to_string(),
    }
}

/// Date of the related record, which must belong to `user_id`.
fn related_date(
    conn: &Connection,
    user_id: &str,
    related_type: RelatedType,
    related_id: &str,
) -> Result<NaiveDate> {
    match related_type {
        RelatedType::DailyTask => tasks::find_task_for_user(conn, user_id, related_id)?
            .map(|(_, date)| date)
            .ok_or_else(|| Error::TaskNotFound {
                id: related_id.to_string(),
            }),
        RelatedType::NightSession => night::find_session(conn, user_id, related_id)?
            .map(|s| s.date)
            .ok_or_else(|| Error::NightSessionNotFound {
                id: related_id.to_string(),
            }),
    }
}
