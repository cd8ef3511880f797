//! Core types shared across fieldtrail crates
//!
//! - **Correlation types**: OperationId, OperationContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{OperationContext, OperationId};
