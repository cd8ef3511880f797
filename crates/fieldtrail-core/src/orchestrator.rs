//! Change-detection entry points.
//!
//! A host calls [`HistoryTracker::on_save`] before persisting an in-memory
//! modified record, or [`HistoryTracker::on_query_update`] before applying a
//! filter-based update. Both compute one [`ChangeRecord`] and append it to the
//! record's ledger. Runtime failures never surface: they are logged and the
//! write proceeds untracked.

use std::sync::Arc;

use fieldtrail_core_types::OperationContext;
use serde_json::{Map, Value};

use crate::array_diff::{ElementIdentity, IdField};
use crate::config::TrackerConfig;
use crate::document::{flatten_update, set_path, value_at, Document};
use crate::errors::Result;
use crate::history::ChangeRecord;
use crate::ledger;
use crate::logger::{LevelFilter, NoopLogger, TrackLogger};
use crate::pattern::FieldFilter;
use crate::reference::{label_text, Model, ModelRegistry, ReferenceResolver};
use crate::store::{filter_by_id, Filter, UpdateOptions};
use crate::tracker::ChangeTracker;

/// Why a write produced no history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The caller asked for tracking to be bypassed
    Bypassed,
    /// The update held no literal assignments
    EmptyUpdate,
    /// First save of a record
    NewRecord,
    /// The prior snapshot could not be found
    PriorStateMissing,
    /// No record matched the update filter
    NoMatch,
    /// Nothing tracked changed
    NoChanges,
    /// The record store returned an error
    StoreUnavailable,
    /// The stored ledger could not be decoded
    MalformedLedger,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Bypassed => "bypassed",
            SkipReason::EmptyUpdate => "empty_update",
            SkipReason::NewRecord => "new_record",
            SkipReason::PriorStateMissing => "prior_state_missing",
            SkipReason::NoMatch => "no_match",
            SkipReason::NoChanges => "no_changes",
            SkipReason::StoreUnavailable => "store_unavailable",
            SkipReason::MalformedLedger => "malformed_ledger",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one tracking call.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// The record was appended to the ledger
    Recorded(ChangeRecord),
    Skipped(SkipReason),
}

impl TrackOutcome {
    pub fn record(&self) -> Option<&ChangeRecord> {
        match self {
            TrackOutcome::Recorded(record) => Some(record),
            TrackOutcome::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            TrackOutcome::Recorded(_) => None,
            TrackOutcome::Skipped(reason) => Some(*reason),
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, TrackOutcome::Recorded(_))
    }
}

/// Options for [`HistoryTracker::on_query_update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryUpdateOptions {
    pub actor: Option<String>,
    /// Skip tracking entirely (set on the tracker's own ledger writes)
    pub bypass_tracking: bool,
}

impl QueryUpdateOptions {
    pub fn by(actor: impl Into<String>) -> Self {
        Self {
            actor: Some(actor.into()),
            bypass_tracking: false,
        }
    }
}

/// Builder for [`HistoryTracker`].
pub struct HistoryTrackerBuilder {
    config: TrackerConfig,
    model: Model,
    registry: ModelRegistry,
    logger: Arc<dyn TrackLogger>,
    identity: Option<Box<dyn ElementIdentity>>,
}

impl HistoryTrackerBuilder {
    /// Collections that references may point into.
    pub fn registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Diagnostic sink; filtered by the configured log level.
    pub fn logger(mut self, logger: Arc<dyn TrackLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Array element identity strategy. Defaults to the configured id field.
    pub fn identity(mut self, identity: Box<dyn ElementIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Validate the config and build the tracker.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` or `InvalidPattern` if the config is rejected.
    pub fn build(self) -> Result<HistoryTracker> {
        let filter = self.config.validate()?;
        let logger: Arc<dyn TrackLogger> =
            Arc::new(LevelFilter::new(self.logger, self.config.log_level));
        let resolver = ReferenceResolver::new(
            self.registry,
            self.config.display_field.clone(),
            logger.clone(),
        );
        let identity = self
            .identity
            .unwrap_or_else(|| Box::new(IdField(self.config.id_field.clone())));
        Ok(HistoryTracker {
            config: self.config,
            filter,
            model: self.model,
            resolver,
            identity,
            logger,
        })
    }
}

/// History tracking for one collection.
pub struct HistoryTracker {
    config: TrackerConfig,
    filter: FieldFilter,
    model: Model,
    resolver: ReferenceResolver,
    identity: Box<dyn ElementIdentity>,
    logger: Arc<dyn TrackLogger>,
}

impl HistoryTracker {
    /// Tracker with no reference targets and no diagnostics.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` or `InvalidPattern` if the config is rejected.
    pub fn new(config: TrackerConfig, model: Model) -> Result<Self> {
        Self::builder(config, model).build()
    }

    pub fn builder(config: TrackerConfig, model: Model) -> HistoryTrackerBuilder {
        HistoryTrackerBuilder {
            config,
            model,
            registry: ModelRegistry::new(),
            logger: Arc::new(NoopLogger),
            identity: None,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Direct-mutation protocol.
    ///
    /// `record` is the modified in-memory record and `modified_paths` the
    /// paths the caller set directly. On success the new ledger is written
    /// into `record` so it is persisted with the rest of the write.
    pub async fn on_save(
        &self,
        record: &mut Document,
        modified_paths: &[String],
        is_new: bool,
    ) -> TrackOutcome {
        let Some(id) = (!is_new)
            .then(|| record.get(&self.config.id_field).and_then(label_text))
            .flatten()
        else {
            return TrackOutcome::Skipped(SkipReason::NewRecord);
        };
        let ctx = OperationContext::new().with_record_id(id.clone());

        let prior = match self.model.store.find_by_id(&id).await {
            Ok(Some(prior)) => prior,
            Ok(None) => return self.skip(&ctx, SkipReason::PriorStateMissing),
            Err(err) => {
                self.logger.warn("on_save", &format!("{}: {}", ctx, err));
                return TrackOutcome::Skipped(SkipReason::StoreUnavailable);
            }
        };

        let actor = record.get(&self.config.actor_field).and_then(label_text);
        let assignments = modified_paths
            .iter()
            .map(|path| (path.clone(), value_at(record, path)));
        let change = self.compute(&prior, assignments, actor).await;
        if change.is_empty() {
            return self.skip(&ctx, SkipReason::NoChanges);
        }

        let ledger_value = match self.appended_ledger(&ctx, &prior, &change) {
            Ok(value) => value,
            Err(reason) => return TrackOutcome::Skipped(reason),
        };
        set_path(record, &self.config.ledger_field, ledger_value);
        self.logger.debug(
            "on_save",
            &format!("{}: recorded {} change(s)", ctx, change.changes.len()),
        );
        TrackOutcome::Recorded(change)
    }

    /// Query-update protocol.
    ///
    /// Tracks `update` against the first record matching `filter`, then
    /// writes the appended ledger back with tracking bypassed. The ledger is
    /// re-read just before that write; a concurrent write to the same
    /// ledger in between is lost (last write wins).
    pub async fn on_query_update(
        &self,
        filter: &Filter,
        update: &Value,
        options: QueryUpdateOptions,
    ) -> TrackOutcome {
        let ctx = OperationContext::new();
        if options.bypass_tracking {
            return TrackOutcome::Skipped(SkipReason::Bypassed);
        }

        let flattened = flatten_update(update);
        for directive in &flattened.skipped_directives {
            self.logger.debug(
                "on_query_update",
                &format!("{}: skipping non-literal directive {}", ctx, directive),
            );
        }
        if flattened.is_empty() {
            return self.skip(&ctx, SkipReason::EmptyUpdate);
        }

        let current = match self.model.store.find_one(filter).await {
            Ok(Some(current)) => current,
            Ok(None) => return self.skip(&ctx, SkipReason::NoMatch),
            Err(err) => {
                self.logger
                    .warn("on_query_update", &format!("{}: {}", ctx, err));
                return TrackOutcome::Skipped(SkipReason::StoreUnavailable);
            }
        };
        let record_id = current.get(&self.config.id_field).and_then(label_text);
        let ctx = match &record_id {
            Some(id) => ctx.with_record_id(id.clone()),
            None => ctx,
        };

        let change = self
            .compute(&current, flattened.assignments.into_iter(), options.actor)
            .await;
        if change.is_empty() {
            return self.skip(&ctx, SkipReason::NoChanges);
        }

        let write_filter = match &record_id {
            Some(id) => filter_by_id(&self.config.id_field, id),
            None => filter.clone(),
        };
        let latest = match self.model.store.find_one(&write_filter).await {
            Ok(Some(latest)) => latest,
            Ok(None) => return self.skip(&ctx, SkipReason::PriorStateMissing),
            Err(err) => {
                self.logger
                    .warn("on_query_update", &format!("{}: {}", ctx, err));
                return TrackOutcome::Skipped(SkipReason::StoreUnavailable);
            }
        };
        let ledger_value = match self.appended_ledger(&ctx, &latest, &change) {
            Ok(value) => value,
            Err(reason) => return TrackOutcome::Skipped(reason),
        };

        let mut patch = Map::new();
        patch.insert(self.config.ledger_field.clone(), ledger_value);
        if let Err(err) = self
            .model
            .store
            .update_one(
                &write_filter,
                &Value::Object(patch),
                UpdateOptions::bypassing_tracking(),
            )
            .await
        {
            self.logger
                .warn("on_query_update", &format!("{}: {}", ctx, err));
            return TrackOutcome::Skipped(SkipReason::StoreUnavailable);
        }

        self.logger.debug(
            "on_query_update",
            &format!("{}: recorded {} change(s)", ctx, change.changes.len()),
        );
        TrackOutcome::Recorded(change)
    }

    /// Track every assignment against `before_doc` into one record.
    async fn compute(
        &self,
        before_doc: &Value,
        assignments: impl Iterator<Item = (String, Value)>,
        actor: Option<String>,
    ) -> ChangeRecord {
        let schema = self.model.schema.as_ref();
        let tracker = ChangeTracker::new(
            &self.resolver,
            schema,
            self.identity.as_ref(),
            &self.config,
        );
        let mut change = ChangeRecord::new(actor);

        for (path, after) in assignments {
            if self.config.is_internal_path(&path) || !self.filter.should_track(&path) {
                continue;
            }
            let label = self.field_label(before_doc, &path, &after).await;
            tracker
                .track(before_doc, &path, &after, &mut change, &label)
                .await;
        }
        change
    }

    /// Display label of the value at `path`, preferring the new value's label.
    async fn field_label(&self, before_doc: &Value, path: &str, after: &Value) -> String {
        let schema = self.model.schema.as_ref();
        let label = self.resolver.resolve_field_label(schema, path, after).await;
        if label != path {
            return label;
        }
        let before = value_at(before_doc, path);
        self.resolver.resolve_field_label(schema, path, &before).await
    }

    /// Append `change` to the ledger stored in `snapshot` and encode the result.
    fn appended_ledger(
        &self,
        ctx: &OperationContext,
        snapshot: &Value,
        change: &ChangeRecord,
    ) -> std::result::Result<Value, SkipReason> {
        let encoded = ledger::read_ledger(snapshot, &self.config.ledger_field).and_then(|entries| {
            ledger::to_value(&ledger::append(&entries, change.clone(), self.config.limit))
        });
        encoded.map_err(|err| {
            self.logger
                .warn("append_ledger", &format!("{}: {}", ctx, err));
            SkipReason::MalformedLedger
        })
    }

    fn skip(&self, ctx: &OperationContext, reason: SkipReason) -> TrackOutcome {
        self.logger
            .debug("track", &format!("{}: skipped ({})", ctx, reason));
        TrackOutcome::Skipped(reason)
    }
}
