//! Note commands.

use super::{Globals, print_json};
use crate::cli::NoteCommands;
use crate::error::Result;
use crate::validate::{normalize_related_type, parse_date};
use serde::Serialize;

#[derive(Serialize)]
struct DeleteOutput<'a> {
    id: &'a str,
    deleted: bool,
}

/// Execute a note command.
///
/// # Errors
///
/// Returns an error if the related record or note is unknown or foreign.
pub fn execute(command: &NoteCommands, globals: &Globals<'_>) -> Result<()> {
    let mut tracker = globals.open_tracker()?;
    let user_id = globals.user_id();

    match command {
        NoteCommands::Add {
            related_type,
            related_id,
            content,
            date,
            mood,
        } => {
            let related_type = normalize_related_type(related_type)?;
            let date = date.as_deref().map(parse_date).transpose()?;
            let note = tracker.create_note(
                &user_id,
                related_type,
                related_id,
                date,
                mood.as_deref(),
                content,
            )?;
            if globals.json {
                return print_json(&note);
            }
            println!("Added note {}", note.id);
        }
        NoteCommands::Edit { id, content, mood } => {
            let note = tracker.update_note(&user_id, id, content, mood.as_deref())?;
            if globals.json {
                return print_json(&note);
            }
            println!("Updated note {}", note.id);
        }
        NoteCommands::Delete { id } => {
            tracker.delete_note(&user_id, id)?;
            if globals.json {
                return print_json(&DeleteOutput { id, deleted: true });
            }
            println!("Deleted note {id}");
        }
    }
    Ok(())
}
