//! Year plan storage.

use crate::error::Result;
use crate::model::{PlanStatus, YearPlan};
use rusqlite::{Connection, OptionalExtension};

const PLAN_COLUMNS: &str =
    "id, user_id, year, theme_id, theme_title, status, created_at, updated_at";

fn map_plan_row(row: &rusqlite::Row) -> rusqlite::Result<YearPlan> {
    let status: String = row.get(5)?;
    Ok(YearPlan {
        id: row.get(0)?,
        user_id: row.get(1)?,
        year: row.get(2)?,
        theme_id: row.get(3)?,
        theme_title: row.get(4)?,
        status: PlanStatus::from_str(&status),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Insert a new plan.
///
/// # Errors
///
/// Fails with a unique violation if the user already has a plan that year.
pub fn insert_plan(conn: &Connection, plan: &YearPlan) -> Result<()> {
    conn.execute(
        "INSERT INTO year_plans (id, user_id, year, theme_id, theme_title, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            plan.id,
            plan.user_id,
            plan.year,
            plan.theme_id,
            plan.theme_title,
            plan.status.as_str(),
            plan.created_at,
            plan.updated_at,
        ],
    )?;
    Ok(())
}

/// Insert or replace the theme of the user's plan for a year, reactivating it.
///
/// The plan id is kept when the row already exists.
///
/// # Errors
///
/// Returns an error if the upsert fails.
pub fn upsert_plan(conn: &Connection, plan: &YearPlan) -> Result<YearPlan> {
    conn.execute(
        "INSERT INTO year_plans (id, user_id, year, theme_id, theme_title, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'active', ?6, ?6)
         ON CONFLICT(user_id, year) DO UPDATE SET
             theme_id = excluded.theme_id,
             theme_title = excluded.theme_title,
             status = 'active',
             updated_at = excluded.updated_at",
        rusqlite::params![
            plan.id,
            plan.user_id,
            plan.year,
            plan.theme_id,
            plan.theme_title,
            plan.updated_at,
        ],
    )?;

    let stored = conn.query_row(
        &format!("SELECT {PLAN_COLUMNS} FROM year_plans WHERE user_id = ?1 AND year = ?2"),
        rusqlite::params![plan.user_id, plan.year],
        map_plan_row,
    )?;
    Ok(stored)
}

/// The user's plan for a year, in any status.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_plan(conn: &Connection, user_id: &str, year: i32) -> Result<Option<YearPlan>> {
    let plan = conn
        .query_row(
            &format!("SELECT {PLAN_COLUMNS} FROM year_plans WHERE user_id = ?1 AND year = ?2"),
            rusqlite::params![user_id, year],
            map_plan_row,
        )
        .optional()?;
    Ok(plan)
}

/// A plan by id, only if it belongs to the user.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_plan_by_id(conn: &Connection, user_id: &str, plan_id: &str) -> Result<Option<YearPlan>> {
    let plan = conn
        .query_row(
            &format!("SELECT {PLAN_COLUMNS} FROM year_plans WHERE id = ?1 AND user_id = ?2"),
            rusqlite::params![plan_id, user_id],
            map_plan_row,
        )
        .optional()?;
    Ok(plan)
}

/// The user's plan for a year, only if active.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_active_plan(conn: &Connection, user_id: &str, year: i32) -> Result<Option<YearPlan>> {
    Ok(find_plan(conn, user_id, year)?.filter(YearPlan::is_active))
}

/// Set a plan's status. Returns whether a row changed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_plan_status(
    conn: &Connection,
    user_id: &str,
    year: i32,
    status: PlanStatus,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE year_plans SET status = ?1, updated_at = ?2 WHERE user_id = ?3 AND year = ?4",
        rusqlite::params![
            status.as_str(),
            chrono::Utc::now().timestamp_millis(),
            user_id,
            year
        ],
    )?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    #[test]
    fn test_upsert_keeps_id_and_reactivates() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();

        let first = upsert_plan(conn, &YearPlan::new("u1", 2024, "steady", "Steady steps")).unwrap();
        assert!(set_plan_status(conn, "u1", 2024, PlanStatus::Archived).unwrap());
        assert!(find_active_plan(conn, "u1", 2024).unwrap().is_none());

        let second = upsert_plan(conn, &YearPlan::new("u1", 2024, "slow_down", "Slow down")).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.theme_id, "slow_down");
        assert!(second.is_active());
    }

    #[test]
    fn test_plans_are_per_user_and_year() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();

        insert_plan(conn, &YearPlan::new("u1", 2024, "steady", "Steady steps")).unwrap();
        assert!(find_plan(conn, "u1", 2025).unwrap().is_none());
        assert!(find_plan(conn, "u2", 2024).unwrap().is_none());
        assert!(!set_plan_status(conn, "u2", 2024, PlanStatus::Archived).unwrap());

        let plan = find_plan(conn, "u1", 2024).unwrap().unwrap();
        assert!(find_plan_by_id(conn, "u1", &plan.id).unwrap().is_some());
        assert!(find_plan_by_id(conn, "u2", &plan.id).unwrap().is_none());
    }
}
