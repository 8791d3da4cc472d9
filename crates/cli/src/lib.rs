pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "arcos",
    about = "ArcOS command router CLI",
    long_about = "Route free-text commands into pillars, run the interactive shell, apply migrations, and inspect configuration.",
    after_help = "Examples:\n  arcos classify \"Log 30 minute workout\" --json\n  arcos submit \"Write an article about AI\" --session desk\n  arcos shell\n  arcos doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Classify text into a pillar without persisting anything")]
    Classify {
        #[arg(required = true, num_args = 1.., help = "Command text")]
        text: Vec<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Classify, persist, and automate one command")]
    Submit {
        #[arg(required = true, num_args = 1.., help = "Command text")]
        text: Vec<String>,
        #[arg(long, help = "Record the exchange in this session's history")]
        session: Option<String>,
    },
    #[command(about = "Interactive loop; type `history`, `clear`, or `exit`")]
    Shell {
        #[arg(long, help = "Session id to continue (defaults to a new one)")]
        session: Option<String>,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, routing table, database, and automation readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Classify { text, json } => commands::classify::run(&text.join(" "), json),
        Command::Submit { text, session } => {
            commands::submit::run(&text.join(" "), session.as_deref())
        }
        Command::Shell { session } => commands::shell::run(session.as_deref()),
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Runtime events go to stderr so stdout stays parseable.
pub fn init_logging() {
    use arcos_core::config::LogFormat::*;
    use arcos_core::config::{AppConfig, LoadOptions};
    use tracing::Level;

    let Ok(config) = AppConfig::load(LoadOptions::default()) else {
        return;
    };
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::WARN);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(std::io::stderr);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}
