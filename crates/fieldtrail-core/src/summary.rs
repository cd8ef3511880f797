//! Human-readable summary renderer for history ledgers.

use serde_json::Value;

use crate::history::{ChangeAction, ChangeRecord};

/// Render a Markdown summary of a ledger, newest entry first.
///
/// Informational only; the structured ledger is the source of truth.
pub fn render_history(ledger: &[ChangeRecord]) -> String {
    let mut out = String::new();

    out.push_str("## History\n\n");

    if ledger.is_empty() {
        out.push_str("_No recorded changes._\n");
        return out;
    }

    out.push_str(&format!("**Entries**: {}\n\n", ledger.len()));

    for record in ledger.iter().rev() {
        let actor = record.changed_by.as_deref().unwrap_or("unknown");
        out.push_str(&format!(
            "### {} by {} at {}\n\n",
            action_label(record.action),
            actor,
            record.at.format("%Y-%m-%d %H:%M:%S UTC"),
        ));
        for change in &record.changes {
            out.push_str(&format!(
                "- **{}**: {} → {}\n",
                change.field,
                render_value(&change.before),
                render_value(&change.after),
            ));
        }
        out.push('\n');
    }

    out
}

fn action_label(action: ChangeAction) -> &'static str {
    match action {
        ChangeAction::Updated => "Updated",
        ChangeAction::Added => "Added",
        ChangeAction::Removed => "Removed",
        ChangeAction::Created => "Created",
        ChangeAction::Deleted => "Deleted",
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "_none_".to_string(),
        Value::String(s) => format!("`{}`", s),
        other => format!("`{}`", other),
    }
}
