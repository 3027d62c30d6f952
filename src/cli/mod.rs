//! CLI definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
}

pub mod commands;

/// daytrace - small daily tasks, night reflections and a year of traces
#[derive(Parser, Debug)]
#[command(name = "dt", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.daytrace/data/daytrace.db)
    #[arg(long, global = true, env = "DT_DB")]
    pub db: Option<PathBuf>,

    /// User the commands act for (default: OS user name)
    #[arg(long, global = true, env = "DT_USER")]
    pub user: Option<String>,

    /// Catalog file replacing the built-in templates and programs
    #[arg(long, global = true, env = "DT_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database
    Init {
        /// Recreate an existing database file
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Show today's tasks, creating them on first access
    Today {
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Swap the task at a position for a different one
    Refresh {
        /// Task position (1-based)
        position: u8,

        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Current mood, used to prefer matching templates
        #[arg(long)]
        mood: Option<String>,

        /// Why the task is being swapped
        #[arg(long)]
        reason: Option<String>,
    },

    /// Complete or skip a task
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Night reflection sessions
    Night {
        #[command(subcommand)]
        command: NightCommands,
    },

    /// Notes on tasks and night sessions
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },

    /// Year plan, summary, records and review
    Year {
        #[command(subcommand)]
        command: YearCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Delete everything stored for the user
    Wipe {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Task Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Mark a task done
    Complete {
        /// Task ID
        id: String,

        /// Completion time (RFC 3339 or YYYY-MM-DD, default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Skip a task
    Skip {
        /// Task ID
        id: String,

        /// Why the task was skipped
        #[arg(long)]
        reason: Option<String>,
    },
}

// ============================================================================
// Night Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum NightCommands {
    /// List night programs
    Programs,

    /// Start tonight's session
    Start {
        /// Program ID
        program: String,

        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Finish a session
    Finish {
        /// Session ID
        id: String,

        /// Answer as qid=text (repeatable)
        #[arg(long = "answer", short = 'a')]
        answers: Vec<String>,

        /// Finish time (RFC 3339 or YYYY-MM-DD, default: now)
        #[arg(long)]
        at: Option<String>,
    },
}

// ============================================================================
// Note Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum NoteCommands {
    /// Attach a note to a task or night session
    Add {
        /// What the note is about (task, night)
        related_type: String,

        /// Task or session ID
        related_id: String,

        /// Note text
        content: String,

        /// Date (YYYY-MM-DD, default: date of the task or session)
        #[arg(long)]
        date: Option<String>,

        /// Mood when writing
        #[arg(long)]
        mood: Option<String>,
    },

    /// Replace a note's text
    Edit {
        /// Note ID
        id: String,

        /// New text
        content: String,

        /// New mood
        #[arg(long)]
        mood: Option<String>,
    },

    /// Delete a note
    Delete {
        /// Note ID
        id: String,
    },
}

// ============================================================================
// Year Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum YearCommands {
    /// List plan themes
    Themes,

    /// Manage the year plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },

    /// Trace counts and soft identity for a year
    Summary {
        year: i32,
    },

    /// Trace counts within one direction
    Direction {
        year: i32,

        /// Direction ID (emotion, body, order, mind, connection)
        direction: String,
    },

    /// Completed tasks and sessions of a month
    Month {
        year: i32,

        /// Month (1-12)
        month: u32,
    },

    /// Details of a single task or night session
    Record {
        /// Record type (task, night)
        record_type: String,

        /// Task or session ID
        id: String,
    },

    /// Generate a review of the year
    Review {
        year: i32,
    },

    /// Attach a poster to a review
    Poster {
        /// Review ID
        review_id: String,

        /// Poster template name
        template: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// Create or replace the plan for a year
    Create {
        year: i32,

        /// Theme ID (see `dt year themes`)
        theme: String,
    },

    /// Show the plan for a year
    Show {
        year: i32,
    },

    /// Archive the plan; no further traces are recorded for the year
    Archive {
        year: i32,
    },

    /// Show or rearrange the plan's directions
    Directions {
        year: i32,

        /// Direction ID to enable (repeatable)
        #[arg(long)]
        enable: Vec<String>,

        /// Direction ID to disable (repeatable)
        #[arg(long)]
        disable: Vec<String>,

        /// Position as direction=n, lower first (repeatable)
        #[arg(long)]
        order: Vec<String>,
    },
}
