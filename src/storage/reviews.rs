//! Review snapshot storage.

use crate::error::Result;
use crate::model::{ReviewContent, ReviewSnapshot};
use rusqlite::{Connection, OptionalExtension};

fn map_review_row(row: &rusqlite::Row) -> rusqlite::Result<ReviewSnapshot> {
    let content: String = row.get(4)?;
    let content: ReviewContent = serde_json::from_str(&content).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ReviewSnapshot {
        id: row.get(0)?,
        user_id: row.get(1)?,
        plan_id: row.get(2)?,
        year: row.get(3)?,
        content,
        poster_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Insert a snapshot.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_review(conn: &Connection, review: &ReviewSnapshot) -> Result<()> {
    conn.execute(
        "INSERT INTO review_snapshots (id, user_id, plan_id, year, content, poster_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            review.id,
            review.user_id,
            review.plan_id,
            review.year,
            serde_json::to_string(&review.content)?,
            review.poster_url,
            review.created_at,
        ],
    )?;
    Ok(())
}

/// A snapshot by id, only if it belongs to `user_id`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_review(conn: &Connection, user_id: &str, review_id: &str) -> Result<Option<ReviewSnapshot>> {
    let review = conn
        .query_row(
            "SELECT id, user_id, plan_id, year, content, poster_url, created_at
             FROM review_snapshots WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![review_id, user_id],
            map_review_row,
        )
        .optional()?;
    Ok(review)
}

/// Set the poster URL unless one is already stored. Returns whether it was set.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_poster_once(conn: &Connection, review_id: &str, url: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE review_snapshots SET poster_url = ?1 WHERE id = ?2 AND poster_url IS NULL",
        rusqlite::params![url, review_id],
    )?;
    Ok(changed > 0)
}

/// Number of snapshots stored for a user's year.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_reviews(conn: &Connection, user_id: &str, year: i32) -> Result<u64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM review_snapshots WHERE user_id = ?1 AND year = ?2",
        rusqlite::params![user_id, year],
        |row| row.get(0),
    )?;
    Ok(n)
}
