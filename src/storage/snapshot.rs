use std::collections::HashSet;
use std::sync::Arc;

use super::errors::PersistenceError;
use super::store::KeyValueStore;
use crate::domain::order::Order;

// ============================================================================
// Order Snapshot Store - The whole collection under one key
// ============================================================================
//
// Loading never fails. A missing key, unreadable store or payload that is not
// a JSON array all degrade to an empty history; individual bad entries are
// skipped and the rest of the collection survives.
//
// ============================================================================

pub struct OrderSnapshotStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl OrderSnapshotStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load(&self) -> Vec<Order> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %self.key, "No order snapshot yet, starting empty");
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Order snapshot unreadable, starting empty");
                return Vec::new();
            }
        };

        let orders = decode_collection(&raw);
        tracing::info!(key = %self.key, orders = orders.len(), "Loaded order snapshot");
        orders
    }

    pub fn save(&self, orders: &[Order]) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(orders)?;
        self.store.set(&self.key, &json)
    }
}

impl std::fmt::Debug for OrderSnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSnapshotStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Tolerant decoding of a stored collection
///
/// Entries that fail to parse, carry no items, or repeat an earlier order id
/// are dropped with a warning.
pub fn decode_collection(raw: &str) -> Vec<Order> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = %err, "Order snapshot is not a JSON array, starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut orders = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let order: Order = match serde_json::from_value(entry) {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(index, error = %err, "Skipping malformed order entry");
                continue;
            }
        };

        if !order.is_well_formed() {
            tracing::warn!(index, order_id = %order.order_id(), "Skipping order without items");
            continue;
        }

        if !seen.insert(order.order_id().clone()) {
            tracing::warn!(index, order_id = %order.order_id(), "Skipping duplicate order id");
            continue;
        }

        orders.push(order);
    }

    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::LineItemId;
    use crate::domain::order::{OrderId, OrderItem, OrderStatus};
    use crate::storage::store::MemoryStore;
    use chrono::DateTime;

    const KEY: &str = "dawak_orders";

    fn order(suffix: u64) -> Order {
        Order::seal(
            OrderId::from_suffix(suffix),
            DateTime::from_timestamp_millis(1_735_689_600_000).unwrap(),
            vec![OrderItem {
                id: LineItemId::new().into(),
                drug_name: "Panadol Extra".into(),
                quantity: 2,
                notes: Some("after meals".into()),
            }],
        )
        .unwrap()
    }

    fn snapshots() -> (Arc<MemoryStore>, OrderSnapshotStore) {
        let store = Arc::new(MemoryStore::new());
        let snapshots = OrderSnapshotStore::new(store.clone(), KEY);
        (store, snapshots)
    }

    #[test]
    fn test_missing_snapshot_loads_empty() {
        let (_, snapshots) = snapshots();
        assert!(snapshots.load().is_empty());
    }

    #[test]
    fn test_save_then_load_is_equal_by_value() {
        let (_, snapshots) = snapshots();
        let orders = vec![order(2), order(1)];

        snapshots.save(&orders).unwrap();
        assert_eq!(snapshots.load(), orders);
    }

    #[test]
    fn test_corrupt_payload_loads_empty() {
        let (store, snapshots) = snapshots();

        for garbage in ["{not json", "null", "{\"orderId\":\"ORD-1\"}", "42", ""] {
            store.set(KEY, garbage).unwrap();
            assert!(snapshots.load().is_empty(), "payload {garbage:?} should load empty");
        }
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let good = serde_json::to_value(order(7)).unwrap();
        let raw = serde_json::json!([
            good,
            {"orderId": "ORD-000008", "createdAt": 0, "status": "LOST", "items": []},
            {"orderId": "ORD-000009", "createdAt": 0, "status": "PENDING", "items": []},
            "just a string",
            good,
        ])
        .to_string();

        let orders = decode_collection(&raw);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id().as_str(), "ORD-000007");
        assert_eq!(orders[0].status(), OrderStatus::Pending);
    }

    const LEGACY_SNAPSHOT: &str = r#"[
        {"orderId":"ORD-600000","timestamp":1735689600000,"status":"ACCEPTED","items":[
            {"id":1735689599000,"drugName":"Panadol Extra","quantity":"2","notes":"","image":null,"imagePreview":null},
            {"id":1735689598000,"drugName":"Vitamin C","quantity":1,"notes":"after meals","image":null,"imagePreview":null}
        ]},
        {"orderId":"ORD-500000","timestamp":1735689500000,"status":"DELIVERED","items":[
            {"id":1735689499000,"drugName":"Brufen","quantity":1,"notes":"","image":null,"imagePreview":null}
        ]}
    ]"#;

    #[test]
    fn test_front_end_snapshot_loads_every_order() {
        let orders = decode_collection(LEGACY_SNAPSHOT);

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id().as_str(), "ORD-600000");
        assert_eq!(orders[0].status(), OrderStatus::Accepted);
        assert_eq!(orders[0].items()[0].quantity, 2);
        assert_eq!(orders[0].items()[0].notes, None);
        assert_eq!(orders[0].items()[1].notes.as_deref(), Some("after meals"));
        assert_eq!(orders[1].status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_front_end_snapshot_survives_resave() {
        let (store, snapshots) = snapshots();
        store.set(KEY, LEGACY_SNAPSHOT).unwrap();

        let loaded = snapshots.load();
        snapshots.save(&loaded).unwrap();

        assert_eq!(snapshots.load(), loaded);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_quota_failure_is_reported() {
        let store = Arc::new(MemoryStore::with_quota(4));
        let snapshots = OrderSnapshotStore::new(store, KEY);

        let result = snapshots.save(&[order(1)]);
        assert!(matches!(result, Err(PersistenceError::QuotaExceeded { .. })));
    }
}
