//! Wipe command implementation.

use super::{Globals, print_json};
use crate::error::{Error, Result};

/// Delete every row stored for the acting user.
///
/// # Errors
///
/// Returns `InvalidArgument` without `--yes`.
pub fn execute(globals: &Globals<'_>, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::InvalidArgument(
            "wipe deletes all of your data; pass --yes to confirm".to_string(),
        ));
    }

    let mut tracker = globals.open_tracker()?;
    let user_id = globals.user_id();
    let stats = tracker.wipe_account(&user_id)?;

    if globals.json {
        return print_json(&stats);
    }
    println!("Deleted {} rows for {user_id}", stats.total());
    println!("  Task sets:      {}", stats.task_sets);
    println!("  Night sessions: {}", stats.night_sessions);
    println!("  Trace events:   {}", stats.trace_events);
    println!("  Year plans:     {}", stats.year_plans);
    println!("  Reviews:        {}", stats.review_snapshots);
    println!("  Notes:          {}", stats.notes);
    Ok(())
}
