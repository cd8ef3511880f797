//! Bounded history ledger.
//!
//! A ledger is an oldest-first list of [`ChangeRecord`]s stored in a field of
//! the tracked document. Appending evicts from the front once the limit is
//! exceeded; eviction is purely by age.

use crate::document::get_path;
use crate::errors::{Result, TrackError};
use crate::history::ChangeRecord;
use serde_json::Value;

/// Default number of records retained.
pub const DEFAULT_LIMIT: usize = 50;

/// Return a new ledger with `record` appended and at most `limit` entries kept.
///
/// The input ledger is left untouched; callers persist the returned one.
pub fn append(ledger: &[ChangeRecord], record: ChangeRecord, limit: usize) -> Vec<ChangeRecord> {
    let total = ledger.len() + 1;
    let skip = total.saturating_sub(limit);
    ledger
        .iter()
        .cloned()
        .chain(std::iter::once(record))
        .skip(skip)
        .collect()
}

/// Decode the ledger stored at `field` in `document`.
///
/// A missing or null field is an empty ledger.
///
/// # Errors
///
/// Returns `MalformedLedger` if the field holds anything other than a list of
/// change records.
pub fn read_ledger(document: &Value, field: &str) -> Result<Vec<ChangeRecord>> {
    match get_path(document, field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(|e| TrackError::MalformedLedger {
                field: field.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Encode a ledger for storage.
///
/// # Errors
///
/// Returns `Serialization` if a record cannot be encoded.
pub fn to_value(ledger: &[ChangeRecord]) -> Result<Value> {
    Ok(serde_json::to_value(ledger)?)
}
