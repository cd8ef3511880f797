//! Correlation types for tracking operations
//!
//! Every tracked write gets its own [`OperationId`] so that diagnostics
//! emitted while diffing one record can be tied back together.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single tracking operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(String);

impl OperationId {
    /// Generate a new OperationId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried through one tracked write
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub operation_id: OperationId,
    pub record_id: Option<String>,
}

impl OperationContext {
    /// Create a new context with a fresh OperationId
    pub fn new() -> Self {
        Self {
            operation_id: OperationId::new(),
            record_id: None,
        }
    }

    /// Attach the id of the record being tracked
    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.record_id {
            Some(id) => write!(f, "op={} record={}", self.operation_id, id),
            None => write!(f, "op={}", self.operation_id),
        }
    }
}
