//! Today's tasks and refresh.
//!
//! - `dt today [--date]` - Show (and on first access create) the day's tasks
//! - `dt refresh <position>` - Swap one pending task for another

use super::{Globals, date_or_today, format_timestamp, print_json};
use crate::error::Result;
use crate::model::TaskStatus;
use crate::tracker::TaskView;
use colored::Colorize;

/// Execute `dt today`.
///
/// # Errors
///
/// Returns an error if the database is missing or the set cannot be created.
pub fn execute_today(globals: &Globals<'_>, date: Option<&str>) -> Result<()> {
    let date = date_or_today(date)?;
    let mut tracker = globals.open_tracker()?;
    let view = tracker.today(&globals.user_id(), date)?;

    if globals.json {
        return print_json(&view);
    }

    println!("{}", format!("Tasks for {}", view.date).bold());
    println!();
    for task in &view.tasks {
        print_task(task);
    }
    println!(
        "Refreshes left: {}/{}",
        view.refreshes_left(),
        view.refresh_limit
    );
    Ok(())
}

/// Execute `dt refresh`.
///
/// # Errors
///
/// Returns an error if the refresh is rejected.
pub fn execute_refresh(
    globals: &Globals<'_>,
    position: u8,
    date: Option<&str>,
    mood: Option<&str>,
    reason: Option<&str>,
) -> Result<()> {
    let date = date_or_today(date)?;
    let mut tracker = globals.open_tracker()?;
    let outcome = tracker.refresh(&globals.user_id(), date, position, mood, reason)?;

    if globals.json {
        return print_json(&outcome);
    }

    println!("Swapped task {position}:");
    print_task(&outcome.task);
    println!(
        "Refreshes left: {}/{}",
        outcome.refresh_limit.saturating_sub(outcome.refresh_count),
        outcome.refresh_limit
    );
    Ok(())
}

fn print_task(task: &TaskView) {
    let marker = match task.status {
        TaskStatus::Pending => "○".normal(),
        TaskStatus::Done => "●".green(),
        TaskStatus::Skipped => "–".dimmed(),
    };
    println!("  {marker} {}. {}", task.position, task.title.bold());
    if !task.description.is_empty() {
        println!("     {}", task.description);
    }
    for step in &task.steps {
        println!("     - {step}");
    }
    let mut meta = vec![task.task_id.clone()];
    if let Some(secs) = task.duration_sec {
        meta.push(format!("{secs}s"));
    }
    if let Some(done_at) = task.done_at {
        meta.push(format!("done {}", format_timestamp(done_at)));
    }
    println!("     {}", meta.join(" · ").dimmed());
    println!();
}
