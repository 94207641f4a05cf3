pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "funda",
    about = "Funda operator CLI",
    long_about = "Operate Funda runtime readiness, config inspection, entitlement queries, and load testing.",
    after_help = "Examples:\n  funda doctor --json\n  funda config\n  funda check --report \"Credit Report\" --plan silver\n  funda loadtest --base-url http://localhost:8000"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Validate config, entitlement index, and demo registry readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "List the demo user registry as JSON")]
    Users,
    #[command(about = "Classify a report under a plan and print the coverage result")]
    Check {
        #[arg(long, help = "Report name, matched case- and whitespace-insensitively")]
        report: String,
        #[arg(long, help = "Plan tier: BRONZE, SILVER, or GOLD")]
        plan: String,
    },
    #[command(about = "Drive the streaming chat endpoint and report latency figures")]
    Loadtest {
        #[arg(long, default_value = "http://localhost:8000")]
        base_url: String,
        #[arg(long, default_value_t = 2, help = "Concurrent demo sessions to open")]
        sessions: u32,
        #[arg(long, default_value_t = 5, help = "Streaming requests per session")]
        requests: u32,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Users => {
            commands::CommandResult { exit_code: 0, output: commands::users::run() }
        }
        Command::Check { report, plan } => commands::check::run(&report, &plan),
        Command::Loadtest { base_url, sessions, requests } => {
            commands::loadtest::run(&base_url, sessions, requests)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
