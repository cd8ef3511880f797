#![allow(dead_code)]

use std::sync::Arc;

use fieldtrail_core::{
    HistoryTracker, MemoryStore, Model, ModelRegistry, RecordingLogger, ReferenceMap,
    TrackerConfig,
};
use serde_json::{json, Value};

pub const SUPPLIER_ONE: &str = "64b7f0c2a1e4b5d6c7f8a901";
pub const SUPPLIER_TWO: &str = "64b7f0c2a1e4b5d6c7f8a902";
/// Syntactically valid identifier with no record behind it
pub const MISSING_SUPPLIER: &str = "64b7f0c2a1e4b5d6c7f8a9ff";
pub const ORDER_ID: &str = "order-1";

/// Orders, suppliers and the tracker wired over them
pub struct Fixture {
    pub orders: Arc<MemoryStore>,
    pub suppliers: Arc<MemoryStore>,
    pub logger: RecordingLogger,
    pub tracker: HistoryTracker,
}

/// Supplier collection with two labelled records
pub fn supplier_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(json!({"_id": SUPPLIER_ONE, "_display": "Supplier One"}))
        .unwrap();
    store
        .insert(json!({"_id": SUPPLIER_TWO, "_display": "Supplier Two"}))
        .unwrap();
    store
}

/// Order schema: top-level and per-item supplier references
pub fn order_schema() -> ReferenceMap {
    ReferenceMap::new()
        .with_reference("supplier", "suppliers")
        .unwrap()
        .with_reference("items.$.supplier", "suppliers")
        .unwrap()
}

pub fn supplier_registry(suppliers: Arc<MemoryStore>) -> ModelRegistry {
    ModelRegistry::new().with_model("suppliers", Model::without_references(suppliers))
}

/// Build a fixture with `order` already persisted
pub fn fixture_with(config: TrackerConfig, order: Value) -> Fixture {
    let orders = Arc::new(MemoryStore::new());
    orders.insert(order).unwrap();
    let suppliers = supplier_store();
    let logger = RecordingLogger::new();
    let tracker = HistoryTracker::builder(
        config,
        Model::new(orders.clone(), Arc::new(order_schema())),
    )
    .registry(supplier_registry(suppliers.clone()))
    .logger(Arc::new(logger.clone()))
    .build()
    .unwrap();
    Fixture {
        orders,
        suppliers,
        logger,
        tracker,
    }
}

/// Default-config fixture over a basic order
pub fn fixture() -> Fixture {
    fixture_with(TrackerConfig::default(), base_order())
}

pub fn base_order() -> Value {
    json!({
        "_id": ORDER_ID,
        "name": "Order 1",
        "status": "open",
        "supplier": SUPPLIER_ONE,
        "address": {"city": "Lyon", "zip": "69001"},
        "tags": ["item1", "item2", "item3"],
        "items": [
            {"_id": "i1", "_display": "Item1", "name": "Item1", "nested": {"name": "nested1"}}
        ]
    })
}

pub fn paths(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}
