//! History entry types.
//!
//! All types implement `Debug, Clone, Serialize, Deserialize, PartialEq` and
//! serialize to the shape stored in a record's ledger:
//!
//! ```json
//! {"action": "updated", "at": "2026-01-01T00:00:00Z", "changedBy": "alice",
//!  "changes": [{"field": "name", "before": "a", "after": "b"}]}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single classification tag for a whole change record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    #[default]
    Updated,
    Added,
    Removed,
    Created,
    Deleted,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Updated => "updated",
            ChangeAction::Added => "added",
            ChangeAction::Removed => "removed",
            ChangeAction::Created => "created",
            ChangeAction::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field-level delta.
///
/// `before` and `after` are never both null and never equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Change {
    /// Display-qualified path or label
    pub field: String,
    pub before: Value,
    pub after: Value,
}

impl Change {
    /// Build a change, or `None` if it would be a no-op.
    pub fn new(field: impl Into<String>, before: Value, after: Value) -> Option<Self> {
        if before == after {
            return None;
        }
        Some(Self {
            field: field.into(),
            before,
            after,
        })
    }
}

/// One diff transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeRecord {
    pub action: ChangeAction,
    pub at: DateTime<Utc>,
    #[serde(rename = "changedBy")]
    pub changed_by: Option<String>,
    pub changes: Vec<Change>,
}

impl ChangeRecord {
    /// Start an empty `updated` record stamped now.
    pub fn new(changed_by: Option<String>) -> Self {
        Self::at(changed_by, Utc::now())
    }

    /// Start an empty `updated` record with an explicit timestamp.
    pub fn at(changed_by: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            action: ChangeAction::Updated,
            at,
            changed_by,
            changes: Vec::new(),
        }
    }

    /// Append a change unless it is a no-op. Returns whether it was kept.
    pub fn push(&mut self, field: impl Into<String>, before: Value, after: Value) -> bool {
        match Change::new(field, before, after) {
            Some(change) => {
                self.changes.push(change);
                true
            }
            None => false,
        }
    }

    /// Classify the record as a removal. Removal always wins.
    pub fn mark_removed(&mut self) {
        self.action = ChangeAction::Removed;
    }

    /// Classify the record as an addition unless it is already a removal.
    pub fn mark_added(&mut self) {
        if self.action != ChangeAction::Removed {
            self.action = ChangeAction::Added;
        }
    }

    pub fn is_removal(&self) -> bool {
        self.action == ChangeAction::Removed
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
