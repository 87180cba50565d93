use std::sync::Arc;

use super::errors::PersistenceError;
use super::snapshot::OrderSnapshotStore;
use crate::domain::order::{ChangeSink, CollectionChanged};
use crate::health::{Component, ComponentHealth, ReportsHealth};
use crate::metrics::Metrics;
use crate::utils::{GuardState, WriteGuard};

// ============================================================================
// Write-Through Sink
// ============================================================================
//
// Mirrors every committed collection to the snapshot store before the
// mutating call returns. After `failure_threshold` consecutive failures the
// guard opens and the session carries on in memory only.
//
// ============================================================================

pub struct WriteThrough {
    snapshots: OrderSnapshotStore,
    guard: WriteGuard,
    last_error: Option<String>,
    metrics: Option<Arc<Metrics>>,
}

impl WriteThrough {
    pub fn new(snapshots: OrderSnapshotStore, failure_threshold: u32) -> Self {
        Self {
            snapshots,
            guard: WriteGuard::new(failure_threshold),
            last_error: None,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn is_in_memory_only(&self) -> bool {
        self.guard.state() == GuardState::Open
    }

    fn record_failure_metric(&self, err: &PersistenceError) {
        if let Some(metrics) = &self.metrics {
            metrics.record_persistence_failure("save", err.kind());
        }
    }
}

impl ChangeSink for WriteThrough {
    fn collection_changed(&mut self, change: CollectionChanged<'_>) -> Result<(), PersistenceError> {
        if !self.guard.allows_write() {
            let err = PersistenceError::InMemoryOnly {
                failures: self.guard.failure_count(),
            };
            tracing::warn!(
                event_type = change.cause.event_type(),
                "Skipping write, persistence is disabled for this session"
            );
            self.record_failure_metric(&err);
            return Err(err);
        }

        match self.snapshots.save(change.orders) {
            Ok(()) => {
                self.guard.record_success();
                self.last_error = None;
                tracing::debug!(
                    key = self.snapshots.key(),
                    orders = change.orders.len(),
                    event_type = change.cause.event_type(),
                    "Wrote order snapshot"
                );
                Ok(())
            }
            Err(err) => {
                self.record_failure_metric(&err);
                self.last_error = Some(err.to_string());
                self.guard.record_failure();
                tracing::warn!(
                    key = self.snapshots.key(),
                    error = %err,
                    failures = self.guard.failure_count(),
                    "Failed to write order snapshot, keeping in-memory state"
                );
                Err(err)
            }
        }
    }
}

impl ReportsHealth for WriteThrough {
    fn health(&self) -> ComponentHealth {
        let component = Component::Persistence {
            key: self.snapshots.key().to_string(),
            consecutive_failures: self.guard.failure_count(),
            in_memory_only: self.is_in_memory_only(),
        };

        if self.is_in_memory_only() {
            ComponentHealth::degraded(component, "running in memory only")
        } else if let Some(last_error) = &self.last_error {
            ComponentHealth::degraded(component, format!("last write failed: {last_error}"))
        } else {
            ComponentHealth::healthy(component)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::LineItemId;
    use crate::domain::order::{ChangeCause, Order, OrderId, OrderItem};
    use crate::health::HealthStatus;
    use crate::storage::store::{KeyValueStore, MemoryStore};
    use chrono::Utc;

    const KEY: &str = "dawak_orders";

    fn orders() -> Vec<Order> {
        vec![Order::seal(
            OrderId::from_suffix(1),
            Utc::now(),
            vec![OrderItem {
                id: LineItemId::new().into(),
                drug_name: "Panadol".into(),
                quantity: 1,
                notes: None,
            }],
        )
        .unwrap()]
    }

    fn change<'a>(cause: &'a ChangeCause, orders: &'a [Order]) -> CollectionChanged<'a> {
        CollectionChanged { cause, orders }
    }

    #[test]
    fn test_writes_snapshot_on_change() {
        let store = Arc::new(MemoryStore::new());
        let mut sink = WriteThrough::new(OrderSnapshotStore::new(store.clone(), KEY), 3);
        let orders = orders();
        let cause = ChangeCause::Submitted { order_id: OrderId::from_suffix(1) };

        sink.collection_changed(change(&cause, &orders)).unwrap();

        let stored = store.get(KEY).unwrap().unwrap();
        assert_eq!(crate::storage::decode_collection(&stored), orders);
        assert_eq!(sink.health().status, HealthStatus::Healthy);
    }

    #[test]
    fn test_failure_degrades_then_recovers() {
        let store = Arc::new(MemoryStore::with_quota(0));
        let mut sink = WriteThrough::new(OrderSnapshotStore::new(store.clone(), KEY), 3);
        let orders = orders();
        let cause = ChangeCause::Submitted { order_id: OrderId::from_suffix(1) };

        assert!(sink.collection_changed(change(&cause, &orders)).is_err());
        let degraded = sink.health();
        assert_eq!(degraded.status, HealthStatus::Degraded);
        assert!(matches!(
            degraded.component,
            Component::Persistence { consecutive_failures: 1, in_memory_only: false, .. }
        ));

        store.set_quota(None);
        assert!(sink.collection_changed(change(&cause, &orders)).is_ok());
        assert_eq!(sink.health().status, HealthStatus::Healthy);
        assert_eq!(sink.health().reason, None);
    }

    #[test]
    fn test_threshold_switches_to_in_memory_only() {
        let store = Arc::new(MemoryStore::with_quota(0));
        let mut sink = WriteThrough::new(OrderSnapshotStore::new(store.clone(), KEY), 2);
        let orders = orders();
        let cause = ChangeCause::Submitted { order_id: OrderId::from_suffix(1) };

        let _ = sink.collection_changed(change(&cause, &orders));
        let _ = sink.collection_changed(change(&cause, &orders));
        assert!(sink.is_in_memory_only());

        store.set_quota(None);
        let result = sink.collection_changed(change(&cause, &orders));
        assert!(matches!(result, Err(PersistenceError::InMemoryOnly { failures: 2 })));
        assert_eq!(store.get(KEY).unwrap(), None);
    }
}
