//! Summary command
//!
//! Usage: fieldtrail summary --document <FILE> [--config <FILE>]

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use fieldtrail_core::errors::{ExError, ExErrorKind, ExResult};
use fieldtrail_core::ledger::read_ledger;
use fieldtrail_core::summary::render_history;

use super::{load_config, read_document};

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Document carrying a ledger (JSON)
    #[arg(short, long)]
    pub document: PathBuf,

    /// Tracker configuration (TOML); only `ledger_field` is used
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Execute summary command
pub fn execute(args: SummaryArgs, out: &mut impl Write) -> ExResult<()> {
    let config = load_config(args.config.as_deref())?;
    let document = read_document(&args.document)?;
    let ledger = read_ledger(&document, &config.ledger_field)?;

    write!(out, "{}", render_history(&ledger)).map_err(|e| {
        ExError::new(ExErrorKind::Io)
            .with_op("cli_output")
            .with_message(e.to_string())
    })
}
