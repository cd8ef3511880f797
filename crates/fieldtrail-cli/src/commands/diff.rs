//! Diff command
//!
//! Usage: fieldtrail diff --before <FILE> --after <FILE> [--config <FILE>] [--path <P>]... [--actor <NAME>]
//!
//! The before snapshot plays the persisted record; the after snapshot is the
//! record about to be saved.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use fieldtrail_core::document::{modified_top_level_paths, set_path};
use fieldtrail_core::errors::{ExError, ExErrorKind, ExResult};
use fieldtrail_core::ledger::read_ledger;
use fieldtrail_core::summary::render_history;
use fieldtrail_core::{HistoryTracker, MemoryStore, Model, TrackOutcome, TracingLogger};
use serde_json::Value;

use super::{load_config, read_document};

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Persisted snapshot (JSON)
    #[arg(long)]
    pub before: PathBuf,

    /// Snapshot being saved (JSON)
    #[arg(long)]
    pub after: PathBuf,

    /// Tracker configuration (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Modified path; defaults to every top-level key that differs
    #[arg(long = "path")]
    pub paths: Vec<String>,

    /// Actor recorded on the change
    #[arg(long)]
    pub actor: Option<String>,
}

/// Execute diff command
pub async fn execute(args: DiffArgs, out: &mut impl Write) -> ExResult<()> {
    let config = load_config(args.config.as_deref())?;
    let before = read_document(&args.before)?;
    let mut after = read_document(&args.after)?;

    let id = before.get(&config.id_field).cloned().ok_or_else(|| {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("cli_diff")
            .with_path(args.before.display().to_string())
            .with_message(format!("before snapshot has no `{}`", config.id_field))
    })?;
    if after.get(&config.id_field).is_none() {
        set_path(&mut after, &config.id_field, id);
    }
    if let Some(actor) = &args.actor {
        set_path(&mut after, &config.actor_field, Value::String(actor.clone()));
    }

    let paths = if args.paths.is_empty() {
        modified_top_level_paths(&before, &after)
    } else {
        args.paths
    };

    let store = Arc::new(MemoryStore::with_id_field(config.id_field.clone()));
    store.insert(before)?;

    let ledger_field = config.ledger_field.clone();
    let tracker = HistoryTracker::builder(config, Model::without_references(store))
        .logger(Arc::new(TracingLogger))
        .build()?;

    match tracker.on_save(&mut after, &paths, false).await {
        TrackOutcome::Recorded(record) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&record)?).map_err(write_error)?;
            let ledger = read_ledger(&after, &ledger_field)?;
            write!(out, "\n{}", render_history(&ledger)).map_err(write_error)?;
        }
        TrackOutcome::Skipped(reason) => {
            writeln!(out, "no changes ({})", reason).map_err(write_error)?;
        }
    }

    Ok(())
}

fn write_error(err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op("cli_output")
        .with_message(err.to_string())
}
