#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use fieldtrail_core::ledger::read_ledger;
use fieldtrail_core::store::filter_by_id;
use fieldtrail_core::{
    Filter, HistoryTracker, Model, ModelRegistry, QueryUpdateOptions, RecordStore, ReferenceMap,
    SkipReason, TrackerConfig, UpdateOptions,
};
use fieldtrail_store::SqliteStore;
use serde_json::json;

const SUPPLIER_ONE: &str = "64b7f0c2a1e4b5d6c7f8a901";
const SUPPLIER_TWO: &str = "64b7f0c2a1e4b5d6c7f8a902";

fn seeded_orders() -> SqliteStore {
    let orders = SqliteStore::in_memory("orders").unwrap();
    orders
        .insert(&json!({
            "_id": "order-1",
            "status": "open",
            "supplier": SUPPLIER_ONE,
            "address": {"city": "Lyon"}
        }))
        .unwrap();
    orders
        .insert(&json!({"_id": "order-2", "status": "open", "address": {"city": "Paris"}}))
        .unwrap();
    orders
}

fn tracker_over(orders: &SqliteStore) -> HistoryTracker {
    let suppliers = orders.sibling("suppliers");
    suppliers
        .insert(&json!({"_id": SUPPLIER_ONE, "_display": "Supplier One"}))
        .unwrap();
    suppliers
        .insert(&json!({"_id": SUPPLIER_TWO, "_display": "Supplier Two"}))
        .unwrap();
    let schema = ReferenceMap::new()
        .with_reference("supplier", "suppliers")
        .unwrap();
    HistoryTracker::builder(
        TrackerConfig::default(),
        Model::new(Arc::new(orders.clone()), Arc::new(schema)),
    )
    .registry(
        ModelRegistry::new().with_model("suppliers", Model::without_references(Arc::new(suppliers))),
    )
    .build()
    .unwrap()
}

// ---------------------------------------------------------------------------
// RecordStore contract
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_find_by_id_and_missing() {
    let orders = seeded_orders();
    let found = orders.find_by_id("order-1").await.unwrap().unwrap();
    assert_eq!(found["status"], json!("open"));
    assert!(orders.find_by_id("order-404").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_one_by_nested_path() {
    let orders = seeded_orders();
    let mut filter = Filter::new();
    filter.insert("address.city".to_string(), json!("Paris"));
    let found = orders.find_one(&filter).await.unwrap().unwrap();
    assert_eq!(found["_id"], json!("order-2"));
}

#[tokio::test]
async fn test_find_one_returns_first_in_insertion_order() {
    let orders = seeded_orders();
    let mut filter = Filter::new();
    filter.insert("status".to_string(), json!("open"));
    let found = orders.find_one(&filter).await.unwrap().unwrap();
    assert_eq!(found["_id"], json!("order-1"));
}

#[tokio::test]
async fn test_update_one_applies_dotted_patch() {
    let orders = seeded_orders();
    orders
        .update_one(
            &filter_by_id("_id", "order-2"),
            &json!({"address.city": "Nice", "history": []}),
            UpdateOptions::default(),
        )
        .await
        .unwrap();
    let stored = orders.get("order-2").unwrap().unwrap();
    assert_eq!(stored["address"]["city"], json!("Nice"));
    assert_eq!(stored["history"], json!([]));
    assert_eq!(orders.get("order-1").unwrap().unwrap()["address"]["city"], json!("Lyon"));
}

#[tokio::test]
async fn test_update_one_without_match_is_a_no_op() {
    let orders = seeded_orders();
    orders
        .update_one(
            &filter_by_id("_id", "order-404"),
            &json!({"status": "x"}),
            UpdateOptions::bypassing_tracking(),
        )
        .await
        .unwrap();
    assert_eq!(orders.len().unwrap(), 2);
}

#[tokio::test]
async fn test_documents_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trail.db");
    {
        let store = SqliteStore::open(&path, "orders").unwrap();
        store.insert(&json!({"_id": "order-1", "status": "open"})).unwrap();
    }
    let reopened = SqliteStore::open(&path, "orders").unwrap();
    let found = reopened.find_by_id("order-1").await.unwrap().unwrap();
    assert_eq!(found["status"], json!("open"));
}

// ---------------------------------------------------------------------------
// Tracking over SQLite
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_save_appends_ledger_and_resolves_reference() {
    let orders = seeded_orders();
    let tracker = tracker_over(&orders);

    let mut record = orders.get("order-1").unwrap().unwrap();
    record["supplier"] = json!(SUPPLIER_TWO);
    record["_changedBy"] = json!("dana");
    let outcome = tracker
        .on_save(&mut record, &["supplier".to_string()], false)
        .await;

    let change = outcome.record().unwrap();
    assert_eq!(change.changed_by.as_deref(), Some("dana"));
    assert_eq!(change.changes[0].before, json!("Supplier One"));
    assert_eq!(change.changes[0].after, json!("Supplier Two"));

    // The host persists the record; the ledger travels with it
    orders.insert(&record).unwrap();
    let stored = orders.get("order-1").unwrap().unwrap();
    assert_eq!(read_ledger(&stored, "history").unwrap().len(), 1);
}

#[tokio::test]
async fn test_query_update_writes_ledger_to_database() {
    let orders = seeded_orders();
    let tracker = tracker_over(&orders);

    let mut filter = Filter::new();
    filter.insert("address.city".to_string(), json!("Paris"));
    let outcome = tracker
        .on_query_update(
            &filter,
            &json!({"$set": {"status": "shipped"}}),
            QueryUpdateOptions::by("erin"),
        )
        .await;
    assert!(outcome.is_recorded());

    let stored = orders.get("order-2").unwrap().unwrap();
    let ledger = read_ledger(&stored, "history").unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].changed_by.as_deref(), Some("erin"));
    assert_eq!(ledger[0].changes[0].field, "status");
    // Only the ledger is written; the update itself is the host's
    assert_eq!(stored["status"], json!("open"));
}

#[tokio::test]
async fn test_query_update_with_no_match() {
    let orders = seeded_orders();
    let tracker = tracker_over(&orders);
    let outcome = tracker
        .on_query_update(
            &filter_by_id("_id", "order-404"),
            &json!({"status": "shipped"}),
            QueryUpdateOptions::default(),
        )
        .await;
    assert_eq!(outcome.skip_reason(), Some(SkipReason::NoMatch));
}
