//! Night session storage.

use crate::error::Result;
use crate::model::{NightAnswer, NightSession, NightStatus};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

const SESSION_COLUMNS: &str =
    "id, user_id, date, program_id, status, started_at, finished_at, answers";

fn map_session_row(row: &rusqlite::Row) -> rusqlite::Result<NightSession> {
    let status: String = row.get(4)?;
    let answers: String = row.get(7)?;
    let answers: Vec<NightAnswer> = serde_json::from_str(&answers).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(NightSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        program_id: row.get(3)?,
        status: NightStatus::from_str(&status),
        started_at: row.get(5)?,
        finished_at: row.get(6)?,
        answers,
    })
}

/// The user's session for a date.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_session_on(conn: &Connection, user_id: &str, date: NaiveDate) -> Result<Option<NightSession>> {
    let session = conn
        .query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM night_sessions WHERE user_id = ?1 AND date = ?2"),
            rusqlite::params![user_id, date],
            map_session_row,
        )
        .optional()?;
    Ok(session)
}

/// A session by id, only if it belongs to `user_id`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_session(conn: &Connection, user_id: &str, session_id: &str) -> Result<Option<NightSession>> {
    let session = conn
        .query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM night_sessions WHERE id = ?1 AND user_id = ?2"),
            rusqlite::params![session_id, user_id],
            map_session_row,
        )
        .optional()?;
    Ok(session)
}

/// Insert a new session.
///
/// # Errors
///
/// Fails with a unique violation when the user already has a session that date.
pub fn insert_session(conn: &Connection, session: &NightSession) -> Result<()> {
    conn.execute(
        "INSERT INTO night_sessions (id, user_id, date, program_id, status, started_at, finished_at, answers)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            session.id,
            session.user_id,
            session.date,
            session.program_id,
            session.status.as_str(),
            session.started_at,
            session.finished_at,
            serde_json::to_string(&session.answers)?,
        ],
    )?;
    Ok(())
}

/// Finish a started session. Returns whether it was still started.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_finished(
    conn: &Connection,
    session_id: &str,
    answers: &[NightAnswer],
    finished_at: i64,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE night_sessions SET status = 'finished', finished_at = ?1, answers = ?2
         WHERE id = ?3 AND status = 'started'",
        rusqlite::params![finished_at, serde_json::to_string(answers)?, session_id],
    )?;
    Ok(changed > 0)
}

/// Finished sessions of a user dated within `from..=to`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn finished_sessions_between(
    conn: &Connection,
    user_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<NightSession>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SESSION_COLUMNS} FROM night_sessions
         WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 AND status = 'finished'"
    ))?;
    let rows = stmt.query_map(rusqlite::params![user_id, from, to], map_session_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_session_lifecycle() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        let session = NightSession::new("u1", day(1), "np2");
        insert_session(conn, &session).unwrap();

        let answers = vec![NightAnswer {
            qid: "q1".to_string(),
            answer: "the tea".to_string(),
        }];
        assert!(mark_finished(conn, &session.id, &answers, 99).unwrap());
        assert!(!mark_finished(conn, &session.id, &[], 100).unwrap());

        let stored = find_session(conn, "u1", &session.id).unwrap().unwrap();
        assert_eq!(stored.status, NightStatus::Finished);
        assert_eq!(stored.finished_at, Some(99));
        assert_eq!(stored.answers, answers);

        assert!(find_session(conn, "u2", &session.id).unwrap().is_none());
    }

    #[test]
    fn test_one_session_per_day() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        insert_session(conn, &NightSession::new("u1", day(1), "np1")).unwrap();

        let err = insert_session(conn, &NightSession::new("u1", day(1), "np2")).unwrap_err();
        assert!(err.is_unique_violation());
        insert_session(conn, &NightSession::new("u1", day(2), "np2")).unwrap();
        assert_eq!(find_session_on(conn, "u1", day(1)).unwrap().unwrap().program_id, "np1");
    }

    #[test]
    fn test_finished_sessions_between() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        let done = NightSession::new("u1", day(3), "np1");
        insert_session(conn, &done).unwrap();
        mark_finished(conn, &done.id, &[], 1).unwrap();
        insert_session(conn, &NightSession::new("u1", day(4), "np1")).unwrap();

        let rows = finished_sessions_between(conn, "u1", day(1), day(31)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, done.id);
    }
}
