//! Micro note storage.

use crate::error::Result;
use crate::model::{MicroNote, RelatedType};
use rusqlite::{Connection, OptionalExtension};

const NOTE_COLUMNS: &str =
    "id, user_id, related_type, related_id, date, mood, content, created_at, updated_at";

fn map_note_row(row: &rusqlite::Row) -> rusqlite::Result<MicroNote> {
    let related_type: String = row.get(2)?;
    Ok(MicroNote {
        id: row.get(0)?,
        user_id: row.get(1)?,
        related_type: if related_type == "night_session" {
            RelatedType::NightSession
        } else {
            RelatedType::DailyTask
        },
        related_id: row.get(3)?,
        date: row.get(4)?,
        mood: row.get(5)?,
        content: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Insert a note.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_note(conn: &Connection, note: &MicroNote) -> Result<()> {
    conn.execute(
        "INSERT INTO micro_notes (id, user_id, related_type, related_id, date, mood, content, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            note.id,
            note.user_id,
            note.related_type.as_str(),
            note.related_id,
            note.date,
            note.mood,
            note.content,
            note.created_at,
            note.updated_at,
        ],
    )?;
    Ok(())
}

/// A note by id, only if it belongs to `user_id`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_note(conn: &Connection, user_id: &str, note_id: &str) -> Result<Option<MicroNote>> {
    let note = conn
        .query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM micro_notes WHERE id = ?1 AND user_id = ?2"),
            rusqlite::params![note_id, user_id],
            map_note_row,
        )
        .optional()?;
    Ok(note)
}

/// The latest note attached to a record.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn note_for(
    conn: &Connection,
    user_id: &str,
    related_type: RelatedType,
    related_id: &str,
) -> Result<Option<MicroNote>> {
    let note = conn
        .query_row(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM micro_notes
                 WHERE user_id = ?1 AND related_type = ?2 AND related_id = ?3
                 ORDER BY updated_at DESC, rowid DESC
                 LIMIT 1"
            ),
            rusqlite::params![user_id, related_type.as_str(), related_id],
            map_note_row,
        )
        .optional()?;
    Ok(note)
}

/// Replace a note's content and mood. Returns whether a row changed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_note(
    conn: &Connection,
    user_id: &str,
    note_id: &str,
    content: &str,
    mood: Option<&str>,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE micro_notes SET content = ?1, mood = COALESCE(?2, mood), updated_at = ?3
         WHERE id = ?4 AND user_id = ?5",
        rusqlite::params![
            content,
            mood,
            chrono::Utc::now().timestamp_millis(),
            note_id,
            user_id
        ],
    )?;
    Ok(changed > 0)
}

/// Delete a note. Returns whether a row was removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_note(conn: &Connection, user_id: &str, note_id: &str) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM micro_notes WHERE id = ?1 AND user_id = ?2",
        rusqlite::params![note_id, user_id],
    )?;
    Ok(changed > 0)
}
