//! fieldtrail core - per-record field history for document stores
//!
//! This crate provides the change-tracking engine, including:
//! - Field pattern matching with `$` array-index wildcards
//! - Reference resolution of identifiers to display labels
//! - Identity-aware array set-difference
//! - Recursive change tracking into a single change record
//! - A bounded, FIFO-evicted history ledger
//! - Direct-mutation and query-update entry points for host hooks
//!
//! Persistence is behind the [`RecordStore`] trait; [`MemoryStore`] is the
//! in-process implementation.

pub mod array_diff;
pub mod config;
pub mod document;
pub mod errors;
pub mod history;
pub mod ledger;
pub mod logger;
pub mod logging_facility;
pub mod orchestrator;
pub mod pattern;
pub mod reference;
pub mod store;
pub mod summary;
pub mod tracker;

pub use fieldtrail_core_types as core_types;

// Re-export commonly used types
pub use array_diff::{diff_arrays, ArrayDelta, ElementIdentity, IdField, NoIdentity};
pub use config::TrackerConfig;
pub use document::Document;
pub use errors::{ExError, ExErrorKind, ExResult, Result, TrackError};
pub use history::{Change, ChangeAction, ChangeRecord};
pub use logger::{LogLevel, NoopLogger, RecordingLogger, TrackLogger, TracingLogger};
pub use orchestrator::{HistoryTracker, QueryUpdateOptions, SkipReason, TrackOutcome};
pub use pattern::{matches_pattern, should_track, FieldFilter, FieldPattern};
pub use reference::{Model, ModelRegistry, ReferenceMap, ReferenceResolver, SchemaMetadata};
pub use store::{Filter, MemoryStore, RecordStore, UpdateOptions};
pub use tracker::ChangeTracker;
