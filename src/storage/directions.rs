//! Per-plan direction storage.

use crate::error::Result;
use crate::model::{DirectionUpdate, PlanDirection};
use rusqlite::Connection;

/// Insert the given directions for a plan, keeping rows that already exist.
///
/// # Errors
///
/// Returns an error if an insert fails.
pub fn seed_directions(conn: &Connection, plan_id: &str, directions: &[PlanDirection]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO year_directions (plan_id, direction_id, title, is_enabled, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for d in directions {
        stmt.execute(rusqlite::params![
            plan_id,
            d.direction_id,
            d.title,
            d.is_enabled,
            d.sort_order
        ])?;
    }
    Ok(())
}

/// Directions of a plan by sort order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn plan_directions(conn: &Connection, plan_id: &str) -> Result<Vec<PlanDirection>> {
    let mut stmt = conn.prepare(
        "SELECT direction_id, title, is_enabled, sort_order FROM year_directions
         WHERE plan_id = ?1
         ORDER BY sort_order, direction_id",
    )?;
    let rows = stmt
        .query_map([plan_id], |row| {
            Ok(PlanDirection {
                direction_id: row.get(0)?,
                title: row.get(1)?,
                is_enabled: row.get(2)?,
                sort_order: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Apply one update. Returns false when the plan has no such direction.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_direction(conn: &Connection, plan_id: &str, update: &DirectionUpdate) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE year_directions
         SET is_enabled = COALESCE(?1, is_enabled), sort_order = COALESCE(?2, sort_order)
         WHERE plan_id = ?3 AND direction_id = ?4",
        rusqlite::params![
            update.is_enabled,
            update.sort_order,
            plan_id,
            update.direction_id
        ],
    )?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::YearPlan;
    use crate::storage::{SqliteStorage, plans};

    fn direction(id: &str, sort_order: u32) -> PlanDirection {
        PlanDirection {
            direction_id: id.to_string(),
            title: id.to_uppercase(),
            is_enabled: true,
            sort_order,
        }
    }

    #[test]
    fn test_seed_keeps_existing_rows() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        let plan = plans::upsert_plan(conn, &YearPlan::new("u1", 2024, "steady", "Steady")).unwrap();

        seed_directions(conn, &plan.id, &[direction("body", 2), direction("mind", 1)]).unwrap();
        let update = DirectionUpdate {
            direction_id: "body".to_string(),
            is_enabled: Some(false),
            sort_order: None,
        };
        assert!(update_direction(conn, &plan.id, &update).unwrap());

        // Seeding again does not reset the user's choices.
        seed_directions(conn, &plan.id, &[direction("body", 2), direction("mind", 1)]).unwrap();
        let rows = plan_directions(conn, &plan.id).unwrap();
        let ids: Vec<_> = rows.iter().map(|d| d.direction_id.as_str()).collect();
        assert_eq!(ids, vec!["mind", "body"]);
        assert!(!rows[1].is_enabled);
        assert_eq!(rows[1].sort_order, 2);
    }

    #[test]
    fn test_update_unknown_direction() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        let plan = plans::upsert_plan(conn, &YearPlan::new("u1", 2024, "steady", "Steady")).unwrap();
        seed_directions(conn, &plan.id, &[direction("body", 1)]).unwrap();

        let update = DirectionUpdate {
            direction_id: "wealth".to_string(),
            is_enabled: Some(true),
            sort_order: None,
        };
        assert!(!update_direction(conn, &plan.id, &update).unwrap());
    }

    #[test]
    fn test_directions_follow_plan_deletion() {
        let storage = SqliteStorage::open_memory().unwrap();
        let conn = storage.conn();
        let plan = plans::upsert_plan(conn, &YearPlan::new("u1", 2024, "steady", "Steady")).unwrap();
        seed_directions(conn, &plan.id, &[direction("body", 1)]).unwrap();

        conn.execute("DELETE FROM year_plans WHERE id = ?1", [&plan.id]).unwrap();
        assert!(plan_directions(conn, &plan.id).unwrap().is_empty());
    }
}
