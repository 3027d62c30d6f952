//! daytrace CLI entry point.

use clap::Parser;
use dt::cli::commands::{self, Globals};
use dt::cli::{Cli, Commands, OutputFormat};
use dt::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    // Effective JSON mode: --json OR --format json OR non-TTY stdout
    let json = cli.json
        || cli.format == OutputFormat::Json
        || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let globals = Globals {
        db: cli.db.as_deref(),
        user: cli.user.as_deref(),
        catalog: cli.catalog.as_deref(),
        json,
    };

    match &cli.command {
        Commands::Init { force } => commands::init::execute(globals.db, *force, json),
        Commands::Version => commands::version::execute(json),

        Commands::Today { date } => commands::today::execute_today(&globals, date.as_deref()),
        Commands::Refresh {
            position,
            date,
            mood,
            reason,
        } => commands::today::execute_refresh(
            &globals,
            *position,
            date.as_deref(),
            mood.as_deref(),
            reason.as_deref(),
        ),

        Commands::Task { command } => commands::task::execute(command, &globals),
        Commands::Night { command } => commands::night::execute(command, &globals),
        Commands::Note { command } => commands::note::execute(command, &globals),
        Commands::Year { command } => commands::year::execute(command, &globals),

        Commands::Completions { shell } => {
            commands::completions::execute(shell);
            Ok(())
        }
        Commands::Wipe { yes } => commands::wipe::execute(&globals, *yes),
    }
}
