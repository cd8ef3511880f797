//! fieldtrail CLI
//!
//! Run two JSON snapshots through the change tracker, or render a stored ledger

use std::time::Instant;

use clap::{Parser, Subcommand};
use fieldtrail_core::logging_facility::{init, Profile};
use fieldtrail_core::{log_op_end, log_op_error, log_op_start};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "fieldtrail")]
#[command(about = "fieldtrail - Field-level change history for JSON documents", long_about = None)]
struct Cli {
    /// Emit JSON logs on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Diff two snapshots of one record and print the change record
    Diff(commands::diff::DiffArgs),
    /// Render the ledger stored in a document
    Summary(commands::summary::SummaryArgs),
}

impl Commands {
    fn op(&self) -> &'static str {
        match self {
            Commands::Diff(_) => "cli_diff",
            Commands::Summary(_) => "cli_summary",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init(if cli.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let op = cli.command.op();
    let started = Instant::now();
    log_op_start!(op);

    let mut stdout = std::io::stdout().lock();
    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(args, &mut stdout).await,
        Commands::Summary(args) => commands::summary::execute(args, &mut stdout),
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(()) => {
            log_op_end!(op, duration_ms = duration_ms);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            log_op_error!(op, e, duration_ms = duration_ms);
            std::process::exit(1);
        }
    }
}
