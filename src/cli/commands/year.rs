//! Year commands: plan, summary, records, review and poster.
//!
//! - `dt year themes` - List plan themes
//! - `dt year plan create|show|archive <year>` - Manage the year plan
//! - `dt year plan directions <year>` - Enable, disable or reorder directions
//! - `dt year summary <year>` - Trace counts and soft identity
//! - `dt year direction <year> <direction>` - Counts within one direction
//! - `dt year month <year> <month>` - Completed records of a month
//! - `dt year record <type> <id>` - One task or night session
//! - `dt year review <year>` - Generate a review snapshot
//! - `dt year poster <review_id> <template>` - Attach a poster

use super::{Globals, format_timestamp, print_json};
use crate::cli::{PlanCommands, YearCommands};
use crate::error::{Error, Result};
use crate::model::{DirectionUpdate, PlanDirection, RelatedType, YearPlan};
use crate::tracker::{TraceCount, Tracker};
use crate::validate::normalize_related_type;
use colored::Colorize;

/// Execute a year command.
///
/// # Errors
///
/// Returns an error if the plan, review or record is missing, or an
/// argument is out of range.
pub fn execute(command: &YearCommands, globals: &Globals<'_>) -> Result<()> {
    let mut tracker = globals.open_tracker()?;
    let user_id = globals.user_id();
    let json = globals.json;

    match command {
        YearCommands::Themes => {
            let themes = tracker.themes();
            if json {
                return print_json(&themes);
            }
            for theme in themes {
                println!("{} {}", theme.theme_id.bold(), theme.title);
                println!("    {}", theme.desc.dimmed());
            }
        }
        YearCommands::Plan { command } => execute_plan(&mut tracker, command, &user_id, json)?,
        YearCommands::Summary { year } => {
            let summary = tracker.summary(&user_id, *year)?;
            if json {
                return print_json(&summary);
            }
            let Some(plan) = &summary.plan else {
                println!("No plan for {year}.");
                println!("\nCreate one with: dt year plan create {year} <theme>");
                return Ok(());
            };
            print_plan(plan);
            println!();
            print_counts(&summary.trace_counts);
            if !summary.direction_counts.is_empty() {
                println!("\n{}", "Directions".bold());
                for d in &summary.direction_counts {
                    println!("  {:<24} {}", d.title, d.count);
                }
            }
            if let Some(identity) = &summary.soft_identity {
                println!("\nThis year you were {}.", identity.title.italic());
            }
        }
        YearCommands::Direction { year, direction } => {
            let detail = tracker.direction_detail(&user_id, *year, direction)?;
            if json {
                return print_json(&detail);
            }
            println!("{} in {}", detail.title.bold(), detail.year);
            print_counts(&detail.trace_counts);
            if !detail.suggestions.is_empty() {
                println!("\n{}", "Try next".bold());
                for t in &detail.suggestions {
                    println!("  {} {}", t.id.dimmed(), t.title);
                }
            }
        }
        YearCommands::Month { year, month } => {
            let records = tracker.month_records(&user_id, *year, *month)?;
            if json {
                return print_json(&records);
            }
            if records.is_empty() {
                println!("Nothing recorded in {year}-{month:02}.");
            }
            for r in &records {
                let kind = match r.record_type {
                    RelatedType::DailyTask => "task",
                    RelatedType::NightSession => "night",
                };
                println!(
                    "{} {} {} {}",
                    r.date,
                    format_timestamp(r.completed_at).dimmed(),
                    format!("[{kind}]").dimmed(),
                    r.title
                );
                if let Some(note) = &r.note {
                    println!("    \"{note}\"");
                }
            }
        }
        YearCommands::Record { record_type, id } => {
            let record_type = normalize_related_type(record_type)?;
            let detail = tracker.record_detail(&user_id, record_type, id)?;
            if json {
                return print_json(&detail);
            }
            println!("{} [{}]", detail.title.bold(), detail.status);
            println!("  ID:   {}", detail.id);
            println!("  Date: {}", detail.date);
            if !detail.description.is_empty() {
                println!("  {}", detail.description);
            }
            if !detail.trace_tags.is_empty() {
                println!("  Traces: {}", detail.trace_tags.join(", "));
            }
            for a in &detail.answers {
                println!("  {} {}", a.qid.dimmed(), a.answer);
            }
            if let Some(note) = &detail.note {
                println!("  Note: {}", note.content);
            }
        }
        YearCommands::Review { year } => {
            let review = tracker.generate_review(&user_id, *year)?;
            if json {
                return print_json(&review);
            }
            println!("{}", review.content.title.bold());
            for h in &review.content.highlights {
                println!("  · {h}");
            }
            println!("\nYou have been {}.", review.content.identity);
            println!("{}", review.content.closing.italic());
            println!("\n{}", format!("Review ID: {}", review.id).dimmed());
        }
        YearCommands::Poster {
            review_id,
            template,
        } => {
            let poster = tracker.generate_poster(&user_id, review_id, template)?;
            if json {
                return print_json(&poster);
            }
            println!("{}", poster.poster_url);
        }
    }
    Ok(())
}

fn execute_plan(tracker: &mut Tracker, command: &PlanCommands, user_id: &str, json: bool) -> Result<()> {
    match command {
        PlanCommands::Create { year, theme } => {
            let plan = tracker.create_plan(user_id, *year, theme)?;
            if json {
                return print_json(&plan);
            }
            println!("Saved plan for {}", plan.year);
            print_plan(&plan);
        }
        PlanCommands::Show { year } => {
            let view = tracker.get_plan(user_id, *year)?;
            if json {
                return print_json(&view);
            }
            match &view.plan {
                Some(plan) => print_plan(plan),
                None => println!("No plan for {year}."),
            }
            if !view.directions.is_empty() {
                println!("\n{}", "Directions".bold());
                print_directions(&view.directions);
            }
        }
        PlanCommands::Archive { year } => {
            let plan = tracker.archive_plan(user_id, *year)?;
            if json {
                return print_json(&plan);
            }
            println!("Archived plan for {}", plan.year);
        }
        PlanCommands::Directions {
            year,
            enable,
            disable,
            order,
        } => {
            let plan = tracker
                .get_plan(user_id, *year)?
                .plan
                .ok_or(Error::PlanNotFound { year: *year })?;
            let updates = direction_updates(enable, disable, order)?;
            let directions = tracker.update_directions(user_id, &plan.id, &updates)?;
            if json {
                return print_json(&directions);
            }
            print_directions(&directions);
        }
    }
    Ok(())
}

/// Merge `--enable`, `--disable` and `--order` flags into one update per direction.
fn direction_updates(enable: &[String], disable: &[String], order: &[String]) -> Result<Vec<DirectionUpdate>> {
    let mut updates = Vec::new();
    for id in enable {
        update_for(&mut updates, id).is_enabled = Some(true);
    }
    for id in disable {
        update_for(&mut updates, id).is_enabled = Some(false);
    }
    for raw in order {
        let (id, n) = raw
            .split_once('=')
            .ok_or_else(|| Error::InvalidArgument(format!("order must be direction=n, got '{raw}'")))?;
        let n = n.trim().parse::<u32>().map_err(|_| {
            Error::InvalidArgument(format!("order position must be a number, got '{raw}'"))
        })?;
        update_for(&mut updates, id.trim()).sort_order = Some(n);
    }
    Ok(updates)
}

fn update_for<'a>(updates: &'a mut Vec<DirectionUpdate>, id: &str) -> &'a mut DirectionUpdate {
    let index = match updates.iter().position(|u| u.direction_id == id) {
        Some(i) => i,
        None => {
            updates.push(DirectionUpdate {
                direction_id: id.to_string(),
                ..DirectionUpdate::default()
            });
            updates.len() - 1
        }
    };
    &mut updates[index]
}

fn print_directions(directions: &[PlanDirection]) {
    for d in directions {
        let line = format!("  {:>2}. {} {}", d.sort_order, d.direction_id.dimmed(), d.title);
        if d.is_enabled {
            println!("{line}");
        } else {
            println!("{} {}", line.dimmed(), "(off)".dimmed());
        }
    }
}

fn print_plan(plan: &YearPlan) {
    println!("  Year:   {}", plan.year);
    println!("  Theme:  {}", plan.theme_title);
    println!("  Status: {}", plan.status.as_str());
}

fn print_counts(counts: &[TraceCount]) {
    if counts.is_empty() {
        println!("No traces yet.");
        return;
    }
    for c in counts {
        println!("  {:<24} {}", c.label, c.count);
    }
}
