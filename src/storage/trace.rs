//! Trace event emission and aggregation queries.
//!
//! Completion actions call [`emit`] inside their own transaction. Events are
//! only recorded while the user has an active plan for the year of the
//! event's date; without one, emission is a silent no-op.

use crate::error::Result;
use crate::model::{TraceEvent, TraceEventType, year_month};
use crate::storage::plans::find_active_plan;
use crate::storage::sqlite::MutationContext;
use chrono::NaiveDate;
use rusqlite::Connection;

/// The action a batch of trace events describes.
#[derive(Debug, Clone)]
pub struct TraceSource<'a> {
    pub event_type: TraceEventType,
    pub user_id: &'a str,
    /// Task, night session or related record id.
    pub source_id: &'a str,
    pub date: NaiveDate,
    pub occurred_at: i64,
    pub direction_id: Option<&'a str>,
}

/// Buffer one event per tag in `ctx`. Returns how many were buffered.
///
/// All events of a batch share `occurred_at`, `source_id` and `direction_id`.
///
/// # Errors
///
/// Returns an error if the plan lookup fails.
pub fn emit(
    conn: &Connection,
    ctx: &mut MutationContext,
    source: &TraceSource<'_>,
    tags: &[String],
) -> Result<usize> {
    if tags.is_empty() {
        return Ok(0);
    }

    let (year, month) = year_month(source.date);
    let Some(plan) = find_active_plan(conn, source.user_id, year)? else {
        tracing::debug!(
            user_id = source.user_id,
            year,
            "No active plan, skipping trace events"
        );
        return Ok(0);
    };

    for tag in tags {
        ctx.record_trace(TraceEvent {
            id: 0,
            user_id: source.user_id.to_string(),
            plan_id: plan.id.clone(),
            event_type: source.event_type,
            trace_tag: tag.clone(),
            direction_id: source.direction_id.map(str::to_string),
            source_id: source.source_id.to_string(),
            occurred_at: source.occurred_at,
            date: source.date,
            year,
            month,
        });
    }
    Ok(tags.len())
}

/// Insert a trace event and return its row id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_trace_event(conn: &Connection, event: &TraceEvent) -> Result<i64> {
    conn.execute(
        "INSERT INTO trace_events (user_id, plan_id, event_type, trace_tag, direction_id, source_id, occurred_at, date, year, month)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            event.user_id,
            event.plan_id,
            event.event_type.as_str(),
            event.trace_tag,
            event.direction_id,
            event.source_id,
            event.occurred_at,
            event.date,
            event.year,
            event.month,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn map_trace_row(row: &rusqlite::Row) -> rusqlite::Result<TraceEvent> {
    let event_type: String = row.get(3)?;
    Ok(TraceEvent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        plan_id: row.get(2)?,
        event_type: TraceEventType::from_str(&event_type),
        trace_tag: row.get(4)?,
        direction_id: row.get(5)?,
        source_id: row.get(6)?,
        occurred_at: row.get(7)?,
        date: row.get(8)?,
        year: row.get(9)?,
        month: row.get(10)?,
    })
}

/// All events of a user's year, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn events_for_year(conn: &Connection, user_id: &str, year: i32) -> Result<Vec<TraceEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, plan_id, event_type, trace_tag, direction_id, source_id, occurred_at, date, year, month
         FROM trace_events
         WHERE user_id = ?1 AND year = ?2
         ORDER BY occurred_at, id",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, year], map_trace_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Events produced by one source record.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn events_for_source(
    conn: &Connection,
    user_id: &str,
    source_id: &str,
) -> Result<Vec<TraceEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, plan_id, event_type, trace_tag, direction_id, source_id, occurred_at, date, year, month
         FROM trace_events
         WHERE user_id = ?1 AND source_id = ?2
         ORDER BY id",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, source_id], map_trace_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Event counts per trace tag, ranked by count descending then tag ascending.
///
/// With `direction_id`, only events in that direction are counted.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn tag_counts(
    conn: &Connection,
    user_id: &str,
    year: i32,
    direction_id: Option<&str>,
) -> Result<Vec<(String, u64)>> {
    let mut stmt = conn.prepare(
        "SELECT trace_tag, COUNT(*) AS n
         FROM trace_events
         WHERE user_id = ?1 AND year = ?2 AND (?3 IS NULL OR direction_id = ?3)
         GROUP BY trace_tag
         ORDER BY n DESC, trace_tag ASC",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, year, direction_id], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Event counts per direction, same ranking. Events without a direction are
/// not counted.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn direction_counts(conn: &Connection, user_id: &str, year: i32) -> Result<Vec<(String, u64)>> {
    let mut stmt = conn.prepare(
        "SELECT direction_id, COUNT(*) AS n
         FROM trace_events
         WHERE user_id = ?1 AND year = ?2 AND direction_id IS NOT NULL
         GROUP BY direction_id
         ORDER BY n DESC, direction_id ASC",
    )?;
    let rows = stmt.query_map(rusqlite::params![user_id, year], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::YearPlan;
    use crate::storage::{SqliteStorage, plans};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tags(xs: &[&str]) -> Vec<String> {
        xs.iter().map(ToString::to_string).collect()
    }

    fn source<'a>(source_id: &'a str, date: NaiveDate, direction: Option<&'a str>) -> TraceSource<'a> {
        TraceSource {
            event_type: TraceEventType::TaskDone,
            user_id: "u1",
            source_id,
            date,
            occurred_at: 1_000,
            direction_id: direction,
        }
    }

    #[test]
    fn test_emit_without_plan_is_noop() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let ((), written) = storage
            .mutate_traced("t", "u1", |tx, ctx| {
                let n = emit(tx, ctx, &source("task_1", date(2024, 3, 1), None), &tags(&["observe"]))?;
                assert_eq!(n, 0);
                Ok(())
            })
            .unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_emit_uses_plan_of_event_year() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let plan = YearPlan::new("u1", 2024, "steady", "Steady steps");
        plans::insert_plan(storage.conn(), &plan).unwrap();

        let ((), written) = storage
            .mutate_traced("t", "u1", |tx, ctx| {
                emit(tx, ctx, &source("a", date(2024, 12, 31), Some("body")), &tags(&["self_care", "observe"]))?;
                emit(tx, ctx, &source("b", date(2025, 1, 1), Some("body")), &tags(&["observe"]))?;
                Ok(())
            })
            .unwrap();

        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|e| e.plan_id == plan.id && e.year == 2024 && e.month == 12));
        assert!(written.iter().all(|e| e.source_id == "a" && e.occurred_at == 1_000));
        assert!(written.iter().all(|e| e.direction_id.as_deref() == Some("body")));
    }

    #[test]
    fn test_tag_counts_ranking_is_stable() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        plans::insert_plan(storage.conn(), &YearPlan::new("u1", 2024, "steady", "Steady steps")).unwrap();

        storage
            .mutate("t", "u1", |tx, ctx| {
                let d = date(2024, 5, 5);
                for _ in 0..5 {
                    emit(tx, ctx, &source("x", d, Some("mind")), &tags(&["self_care", "observe"]))?;
                }
                emit(tx, ctx, &source("y", d, None), &tags(&["reset"]))?;
                Ok(())
            })
            .unwrap();

        let conn = storage.conn();
        let counts = tag_counts(conn, "u1", 2024, None).unwrap();
        assert_eq!(
            counts,
            vec![
                ("observe".to_string(), 5),
                ("self_care".to_string(), 5),
                ("reset".to_string(), 1)
            ]
        );
        assert_eq!(counts, tag_counts(conn, "u1", 2024, None).unwrap());

        let in_mind = tag_counts(conn, "u1", 2024, Some("mind")).unwrap();
        assert_eq!(in_mind.len(), 2);

        let directions = direction_counts(conn, "u1", 2024).unwrap();
        assert_eq!(directions, vec![("mind".to_string(), 10)]);

        assert_eq!(events_for_source(conn, "u1", "y").unwrap().len(), 1);
    }
}
