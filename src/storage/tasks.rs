//! Daily task set and task storage.
//!
//! `daily_task_slots` maps `(set_id, position)` to the current task. Every
//! insert of a current task moves the slot in the same statement sequence,
//! and reads of "current tasks" join through it.

use crate::error::Result;
use crate::model::{DailyTask, DailyTaskSet, SetSource, TaskStatus};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

const SET_COLUMNS: &str = "id, user_id, date, refresh_count, source, created_at, updated_at";

const TASK_COLUMNS: &str = "t.id, t.set_id, t.template_id, t.position, t.status, \
     t.replaced_from_task_id, t.skip_reason, t.created_at, t.done_at, t.skipped_at";

fn map_set_row(row: &rusqlite::Row) -> rusqlite::Result<DailyTaskSet> {
    let source: String = row.get(4)?;
    Ok(DailyTaskSet {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        refresh_count: row.get(3)?,
        source: SetSource::from_str(&source),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn map_task_row(row: &rusqlite::Row) -> rusqlite::Result<DailyTask> {
    let status: String = row.get(4)?;
    Ok(DailyTask {
        id: row.get(0)?,
        set_id: row.get(1)?,
        template_id: row.get(2)?,
        position: row.get(3)?,
        status: TaskStatus::from_str(&status),
        replaced_from_task_id: row.get(5)?,
        skip_reason: row.get(6)?,
        created_at: row.get(7)?,
        done_at: row.get(8)?,
        skipped_at: row.get(9)?,
    })
}

/// Look up a user's set for a date.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_set(conn: &Connection, user_id: &str, date: NaiveDate) -> Result<Option<DailyTaskSet>> {
    let set = conn
        .query_row(
            &format!("SELECT {SET_COLUMNS} FROM daily_task_sets WHERE user_id = ?1 AND date = ?2"),
            rusqlite::params![user_id, date],
            map_set_row,
        )
        .optional()?;
    Ok(set)
}

/// Insert a new set.
///
/// # Errors
///
/// Fails with a unique violation when the user already has a set that date.
pub fn insert_set(conn: &Connection, set: &DailyTaskSet) -> Result<()> {
    conn.execute(
        "INSERT INTO daily_task_sets (id, user_id, date, refresh_count, source, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            set.id,
            set.user_id,
            set.date,
            set.refresh_count,
            set.source.as_str(),
            set.created_at,
            set.updated_at,
        ],
    )?;
    Ok(())
}

/// Insert a task and make it the current task of its slot.
///
/// # Errors
///
/// Returns an error if either write fails.
pub fn insert_current_task(conn: &Connection, task: &DailyTask) -> Result<()> {
    conn.execute(
        "INSERT INTO daily_tasks (id, set_id, template_id, position, status, replaced_from_task_id, skip_reason, created_at, done_at, skipped_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            task.id,
            task.set_id,
            task.template_id,
            task.position,
            task.status.as_str(),
            task.replaced_from_task_id,
            task.skip_reason,
            task.created_at,
            task.done_at,
            task.skipped_at,
        ],
    )?;
    conn.execute(
        "INSERT INTO daily_task_slots (set_id, position, task_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(set_id, position) DO UPDATE SET task_id = excluded.task_id",
        rusqlite::params![task.set_id, task.position, task.id],
    )?;
    Ok(())
}

/// Current tasks of a set, ordered by position.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn current_tasks(conn: &Connection, set_id: &str) -> Result<Vec<DailyTask>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS}
         FROM daily_task_slots s
         JOIN daily_tasks t ON t.id = s.task_id
         WHERE s.set_id = ?1
         ORDER BY s.position"
    ))?;
    let rows = stmt.query_map([set_id], map_task_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// The current task at one position.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn current_task_at(conn: &Connection, set_id: &str, position: u8) -> Result<Option<DailyTask>> {
    let task = conn
        .query_row(
            &format!(
                "SELECT {TASK_COLUMNS}
                 FROM daily_task_slots s
                 JOIN daily_tasks t ON t.id = s.task_id
                 WHERE s.set_id = ?1 AND s.position = ?2"
            ),
            rusqlite::params![set_id, position],
            map_task_row,
        )
        .optional()?;
    Ok(task)
}

/// Every task of a set, replaced ones included, by position then age.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn task_history(conn: &Connection, set_id: &str) -> Result<Vec<DailyTask>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS}
         FROM daily_tasks t
         WHERE t.set_id = ?1
         ORDER BY t.position, t.created_at, t.rowid"
    ))?;
    let rows = stmt.query_map([set_id], map_task_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Increment the refresh counter if it is still below `limit`.
///
/// Returns the new count, or `None` when the limit was already reached. The
/// check and the increment are one statement, so concurrent refreshes cannot
/// both pass the check.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn try_increment_refresh(conn: &Connection, set_id: &str, limit: u32) -> Result<Option<u32>> {
    let changed = conn.execute(
        "UPDATE daily_task_sets
         SET refresh_count = refresh_count + 1, source = 'refreshed', updated_at = ?1
         WHERE id = ?2 AND refresh_count < ?3",
        rusqlite::params![chrono::Utc::now().timestamp_millis(), set_id, limit],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    let count = conn.query_row(
        "SELECT refresh_count FROM daily_task_sets WHERE id = ?1",
        [set_id],
        |row| row.get(0),
    )?;
    Ok(Some(count))
}

/// A task visible to `user_id`, with the date of its set.
///
/// Tasks in another user's set are reported as absent.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_task_for_user(
    conn: &Connection,
    user_id: &str,
    task_id: &str,
) -> Result<Option<(DailyTask, NaiveDate)>> {
    let found = conn
        .query_row(
            &format!(
                "SELECT {TASK_COLUMNS}, ds.date
                 FROM daily_tasks t
                 JOIN daily_task_sets ds ON ds.id = t.set_id
                 WHERE t.id = ?1 AND ds.user_id = ?2"
            ),
            rusqlite::params![task_id, user_id],
            |row| Ok((map_task_row(row)?, row.get(10)?)),
        )
        .optional()?;
    Ok(found)
}

/// Mark a pending task done. Returns whether it was pending.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_done(conn: &Connection, task_id: &str, done_at: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE daily_tasks SET status = 'done', done_at = ?1 WHERE id = ?2 AND status = 'pending'",
        rusqlite::params![done_at, task_id],
    )?;
    Ok(changed > 0)
}

/// Mark a pending task skipped. Returns whether it was pending.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_skipped(
    conn: &Connection,
    task_id: &str,
    reason: Option<&str>,
    skipped_at: i64,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE daily_tasks SET status = 'skipped', skip_reason = ?1, skipped_at = ?2
         WHERE id = ?3 AND status = 'pending'",
        rusqlite::params![reason, skipped_at, task_id],
    )?;
    Ok(changed > 0)
}

/// Done tasks of a user whose set date lies in `from..=to`, with that date.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn done_tasks_between(
    conn: &Connection,
    user_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(DailyTask, NaiveDate)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS}, ds.date
         FROM daily_tasks t
         JOIN daily_task_sets ds ON ds.id = t.set_id
         WHERE ds.user_id = ?1 AND ds.date BETWEEN ?2 AND ?3 AND t.status = 'done'"
    ))?;
    let rows = stmt.query_map(rusqlite::params![user_id, from, to], |row| {
        Ok((map_task_row(row)?, row.get(10)?))
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    fn new_set(user_id: &str, date: NaiveDate) -> DailyTaskSet {
        let now = chrono::Utc::now().timestamp_millis();
        DailyTaskSet {
            id: format!("set_{user_id}_{date}"),
            user_id: user_id.to_string(),
            date,
            refresh_count: 0,
            source: SetSource::Auto,
            created_at: now,
            updated_at: now,
        }
    }

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_slot_follows_latest_insert() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        let set = new_set("u1", march(1));
        insert_set(conn, &set).unwrap();

        let first = DailyTask::new(&set.id, "a", 1);
        insert_current_task(conn, &first).unwrap();
        let second = DailyTask::new(&set.id, "b", 1).replacing(&first.id);
        insert_current_task(conn, &second).unwrap();

        let current = current_task_at(conn, &set.id, 1).unwrap().unwrap();
        assert_eq!(current.id, second.id);
        assert_eq!(current.replaced_from_task_id.as_deref(), Some(first.id.as_str()));
        assert_eq!(current_tasks(conn, &set.id).unwrap().len(), 1);
        assert_eq!(task_history(conn, &set.id).unwrap().len(), 2);
    }

    #[test]
    fn test_refresh_counter_stops_at_limit() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        let set = new_set("u1", march(1));
        insert_set(conn, &set).unwrap();

        assert_eq!(try_increment_refresh(conn, &set.id, 2).unwrap(), Some(1));
        assert_eq!(try_increment_refresh(conn, &set.id, 2).unwrap(), Some(2));
        assert_eq!(try_increment_refresh(conn, &set.id, 2).unwrap(), None);

        let stored = find_set(conn, "u1", march(1)).unwrap().unwrap();
        assert_eq!(stored.refresh_count, 2);
        assert_eq!(stored.source, SetSource::Refreshed);
    }

    #[test]
    fn test_terminal_tasks_do_not_change() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        let set = new_set("u1", march(1));
        insert_set(conn, &set).unwrap();
        let task = DailyTask::new(&set.id, "a", 1);
        insert_current_task(conn, &task).unwrap();

        assert!(mark_done(conn, &task.id, 10).unwrap());
        assert!(!mark_done(conn, &task.id, 20).unwrap());
        assert!(!mark_skipped(conn, &task.id, Some("late"), 30).unwrap());

        let (stored, date) = find_task_for_user(conn, "u1", &task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Done);
        assert_eq!(stored.done_at, Some(10));
        assert_eq!(date, march(1));
    }

    #[test]
    fn test_foreign_task_is_invisible() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        let set = new_set("u1", march(1));
        insert_set(conn, &set).unwrap();
        let task = DailyTask::new(&set.id, "a", 1);
        insert_current_task(conn, &task).unwrap();

        assert!(find_task_for_user(conn, "u2", &task.id).unwrap().is_none());
    }

    #[test]
    fn test_done_tasks_between_filters_by_date() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        for day in [1, 31] {
            let set = new_set("u1", march(day));
            insert_set(conn, &set).unwrap();
            let task = DailyTask::new(&set.id, "a", 1);
            insert_current_task(conn, &task).unwrap();
            mark_done(conn, &task.id, i64::from(day)).unwrap();
        }
        let april = new_set("u1", NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        insert_set(conn, &april).unwrap();

        let rows = done_tasks_between(conn, "u1", march(1), march(31)).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(done_tasks_between(conn, "u2", march(1), march(31)).unwrap().is_empty());
    }
}
