//! Night session commands.

use super::{Globals, date_or_today, optional_timestamp, print_json};
use crate::cli::NightCommands;
use crate::error::Result;
use crate::model::NightAnswer;
use colored::Colorize;

/// Execute a night command.
///
/// # Errors
///
/// Returns an error if the program or session is unknown, or the session is
/// already finished.
pub fn execute(command: &NightCommands, globals: &Globals<'_>) -> Result<()> {
    let mut tracker = globals.open_tracker()?;
    let user_id = globals.user_id();

    match command {
        NightCommands::Programs => {
            let programs = tracker.programs()?;
            if globals.json {
                return print_json(&programs);
            }
            for program in programs {
                println!("{} {}", program.program_id.bold(), program.title);
                if let Some(secs) = program.duration_sec {
                    println!("    {secs}s {}", program.program_type.dimmed());
                }
                for q in &program.questions {
                    println!("    {} {}", q.qid.dimmed(), q.text);
                }
            }
        }
        NightCommands::Start { program, date } => {
            let date = date_or_today(date.as_deref())?;
            let started = tracker.start_night(&user_id, date, program)?;
            if globals.json {
                return print_json(&started);
            }
            if started.created {
                println!("Started night session {}", started.session.id);
            } else {
                println!(
                    "Night session for {} already exists: {} ({})",
                    date,
                    started.session.id,
                    started.session.status.as_str()
                );
            }
        }
        NightCommands::Finish { id, answers, at } => {
            let answers = answers
                .iter()
                .map(|raw| NightAnswer::parse(raw))
                .collect::<Result<Vec<_>>>()?;
            let at = optional_timestamp(at.as_deref())?;
            let done = tracker.finish_night(&user_id, id, &answers, at)?;
            if globals.json {
                return print_json(&done);
            }
            println!("{} {}", "☾".blue(), done.feedback);
        }
    }
    Ok(())
}
