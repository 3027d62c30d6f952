//! Task commands.
//!
//! - `dt task complete <id> [--at]`
//! - `dt task skip <id> [--reason]`

use super::{Globals, optional_timestamp, print_json};
use crate::cli::TaskCommands;
use crate::error::Result;
use colored::Colorize;

/// Execute a task command.
///
/// # Errors
///
/// Returns an error if the task is missing, foreign or no longer pending.
pub fn execute(command: &TaskCommands, globals: &Globals<'_>) -> Result<()> {
    let mut tracker = globals.open_tracker()?;
    let user_id = globals.user_id();

    match command {
        TaskCommands::Complete { id, at } => {
            let at = optional_timestamp(at.as_deref())?;
            let done = tracker.complete_task(&user_id, id, at)?;
            if globals.json {
                return print_json(&done);
            }
            println!("{} {}", "✓".green(), done.feedback);
            if done.trace_events.is_empty() {
                println!("  {}", "No year plan is active, so no trace was recorded.".dimmed());
            } else {
                let tags: Vec<_> = done.trace_events.iter().map(|e| e.trace_tag.as_str()).collect();
                println!("  Traces: {}", tags.join(", "));
            }
        }
        TaskCommands::Skip { id, reason } => {
            let task = tracker.skip_task(&user_id, id, reason.as_deref())?;
            if globals.json {
                return print_json(&task);
            }
            println!("Skipped task {}", task.id);
        }
    }
    Ok(())
}
