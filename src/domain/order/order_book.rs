use std::sync::Arc;
use tokio::sync::watch;

use super::aggregate::Order;
use super::errors::EmptyCartError;
use super::events::{ChangeCause, ChangeSink, CollectionChanged};
use super::value_objects::{OrderId, OrderItem, OrderStatus};
use crate::domain::cart::Cart;
use crate::health::{ComponentHealth, ReportsHealth};
use crate::metrics::Metrics;
use crate::storage::PersistenceError;
use crate::utils::Clock;

// ============================================================================
// Order Book - Owner of the order collection
// ============================================================================
//
// Orchestrates: Cart → Order (sealed) → collection (newest first) → sink
//
// All mutations go through `commit`, which swaps in the complete new
// collection, runs the write-through sink, then publishes the snapshot to
// observers. Callers hold the session lock for the whole call, so no observer
// ever sees a half-applied change.
//
// ============================================================================

/// Result of a successful submission
///
/// `warning` is set when the order exists in memory but could not be written
/// to durable storage.
#[derive(Debug)]
pub struct Submission {
    pub order: Order,
    pub warning: Option<PersistenceError>,
}

pub struct OrderBook {
    orders: Vec<Order>,
    sink: Box<dyn ChangeSink>,
    clock: Arc<dyn Clock>,
    publisher: watch::Sender<Vec<Order>>,
    metrics: Option<Arc<Metrics>>,
}

impl OrderBook {
    pub fn new(orders: Vec<Order>, sink: Box<dyn ChangeSink>, clock: Arc<dyn Clock>) -> Self {
        let (publisher, _) = watch::channel(orders.clone());
        let book = Self {
            orders,
            sink,
            clock,
            publisher,
            metrics: None,
        };
        tracing::info!(orders = book.orders.len(), "Order book ready");
        book
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        metrics.update_orders_by_status(&self.orders);
        self.metrics = Some(metrics);
        self
    }

    /// Newest first
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.order_id() == order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn count_by_status(&self, status: OrderStatus) -> usize {
        self.orders.iter().filter(|o| o.status() == status).count()
    }

    /// Watch the collection; every commit publishes the full new snapshot
    pub fn subscribe(&self) -> watch::Receiver<Vec<Order>> {
        self.publisher.subscribe()
    }

    pub fn persistence_health(&self) -> ComponentHealth {
        self.sink.health()
    }

    /// Seal the cart into a new `PENDING` order
    ///
    /// An empty cart is rejected before anything is touched. Otherwise the
    /// order is prepended, written through, and the cart is emptied.
    pub fn submit_order(&mut self, cart: &mut Cart) -> Result<Submission, EmptyCartError> {
        if cart.is_empty() {
            tracing::info!("Rejected submission of an empty cart");
            return Err(EmptyCartError);
        }

        let created_at = self.clock.now();
        let order_id = self.unique_order_id(OrderId::from_timestamp(created_at));
        let items: Vec<OrderItem> = cart.take_items().into_iter().map(OrderItem::from).collect();
        let order = Order::seal(order_id.clone(), created_at, items)?;

        let mut next = Vec::with_capacity(self.orders.len() + 1);
        next.push(order.clone());
        next.extend(self.orders.iter().cloned());

        let warning = self
            .commit(next, ChangeCause::Submitted { order_id: order_id.clone() })
            .err();

        if let Some(metrics) = &self.metrics {
            metrics.record_order_submitted();
        }

        tracing::info!(
            order_id = %order_id,
            item_count = order.items().len(),
            persisted = warning.is_none(),
            "✅ Order submitted"
        );

        Ok(Submission { order, warning })
    }

    /// Replace the collection and fan the change out
    ///
    /// The in-memory collection is authoritative: a sink failure is returned
    /// but never rolls the change back.
    pub(crate) fn commit(
        &mut self,
        orders: Vec<Order>,
        cause: ChangeCause,
    ) -> Result<(), PersistenceError> {
        self.orders = orders;

        let result = self.sink.collection_changed(CollectionChanged {
            cause: &cause,
            orders: &self.orders,
        });

        self.publisher.send_replace(self.orders.clone());

        if let Some(metrics) = &self.metrics {
            metrics.update_orders_by_status(&self.orders);
        }

        tracing::debug!(
            event_type = cause.event_type(),
            orders = self.orders.len(),
            "Committed order collection"
        );

        result
    }

    /// Clock-derived id, bumped past any id already in the collection
    fn unique_order_id(&self, candidate: OrderId) -> OrderId {
        let mut id = candidate;
        let mut attempts = 0;

        while self.get(&id).is_some() && attempts < OrderId::space_size() {
            id = id.successor();
            attempts += 1;
        }

        if attempts > 0 {
            tracing::debug!(order_id = %id, attempts, "Order id collided, bumped suffix");
        }

        id
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("orders", &self.orders.len())
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingSink;
    use super::*;
    use crate::domain::cart::LineItemDraft;
    use crate::utils::FixedClock;
    use chrono::Duration;

    fn book_with(sink: RecordingSink, clock: Arc<FixedClock>) -> OrderBook {
        OrderBook::new(Vec::new(), Box::new(sink), clock)
    }

    fn cart_with(names: &[(&str, i64)]) -> Cart {
        let mut cart = Cart::new();
        for (name, quantity) in names {
            cart.add_item(&mut LineItemDraft::new(*name).with_quantity(*quantity))
                .unwrap();
        }
        cart
    }

    #[test]
    fn test_submit_seals_cart_into_pending_order() {
        let sink = RecordingSink::default();
        let clock = Arc::new(FixedClock::at_millis(1_735_689_612_345));
        let mut book = book_with(sink.clone(), clock);
        let mut cart = cart_with(&[("Panadol Extra", 2)]);

        let submission = book.submit_order(&mut cart).unwrap();

        assert!(cart.is_empty());
        assert!(submission.warning.is_none());
        assert_eq!(submission.order.order_id().as_str(), "ORD-612345");
        assert_eq!(submission.order.status(), OrderStatus::Pending);
        assert_eq!(submission.order.items()[0].drug_name, "Panadol Extra");
        assert_eq!(submission.order.items()[0].quantity, 2);
        assert_eq!(book.orders(), &[submission.order.clone()]);

        let changes = sink.changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].1, book.orders());
    }

    #[test]
    fn test_submit_keeps_cart_order_in_snapshot() {
        let sink = RecordingSink::default();
        let mut book = book_with(sink, Arc::new(FixedClock::at_millis(0)));
        let mut cart = cart_with(&[("First", 1), ("Second", 1)]);

        let submission = book.submit_order(&mut cart).unwrap();
        let names: Vec<_> = submission.order.items().iter().map(|i| i.drug_name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[test]
    fn test_empty_cart_is_rejected_without_write() {
        let sink = RecordingSink::default();
        let mut book = book_with(sink.clone(), Arc::new(FixedClock::at_millis(0)));

        let result = book.submit_order(&mut Cart::new());

        assert!(matches!(result, Err(EmptyCartError)));
        assert!(book.is_empty());
        assert!(sink.changes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_newest_order_first() {
        let clock = Arc::new(FixedClock::at_millis(1_000));
        let mut book = book_with(RecordingSink::default(), clock.clone());

        let first = book.submit_order(&mut cart_with(&[("A", 1)])).unwrap().order;
        clock.advance(Duration::seconds(1));
        let second = book.submit_order(&mut cart_with(&[("B", 1)])).unwrap().order;

        assert_eq!(book.orders()[0], second);
        assert_eq!(book.orders()[1], first);
    }

    #[test]
    fn test_order_ids_stay_unique_under_a_frozen_clock() {
        let clock = Arc::new(FixedClock::at_millis(1_735_689_999_999));
        let mut book = book_with(RecordingSink::default(), clock);

        let ids: Vec<_> = (0..5)
            .map(|_| {
                book.submit_order(&mut cart_with(&[("Panadol", 1)]))
                    .unwrap()
                    .order
                    .order_id()
                    .clone()
            })
            .collect();

        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 5);
        assert_eq!(ids[0].as_str(), "ORD-999999");
        assert_eq!(ids[1].as_str(), "ORD-000000");
    }

    #[test]
    fn test_persistence_failure_is_a_warning_not_a_rollback() {
        let sink = RecordingSink::default();
        *sink.fail.lock().unwrap() = true;
        let mut book = book_with(sink, Arc::new(FixedClock::at_millis(0)));
        let mut cart = cart_with(&[("Panadol", 1)]);

        let submission = book.submit_order(&mut cart).unwrap();

        assert!(matches!(
            submission.warning,
            Some(PersistenceError::QuotaExceeded { .. })
        ));
        assert_eq!(book.len(), 1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_subscribers_receive_full_snapshots() {
        let mut book = book_with(RecordingSink::default(), Arc::new(FixedClock::at_millis(0)));
        let mut rx = book.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        book.submit_order(&mut cart_with(&[("Panadol", 1)])).unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_slice(), book.orders());
    }

    #[test]
    fn test_submission_releases_image_previews() {
        use crate::domain::cart::test_support::RecordingHost;
        use crate::domain::cart::{ImageAttachment, PreviewHandle};

        let host = Arc::new(RecordingHost::default());
        let mut cart = Cart::new();
        let mut draft = LineItemDraft::new("Panadol").with_image(
            ImageAttachment::new(PreviewHandle::new("blob:1", host.clone())).with_payload(vec![1, 2, 3]),
        );
        cart.add_item(&mut draft).unwrap();

        let mut book = book_with(RecordingSink::default(), Arc::new(FixedClock::at_millis(0)));
        book.submit_order(&mut cart).unwrap();

        assert_eq!(host.released(), vec!["blob:1"]);
    }

    #[test]
    fn test_count_by_status() {
        let mut book = book_with(RecordingSink::default(), Arc::new(FixedClock::at_millis(0)));
        book.submit_order(&mut cart_with(&[("A", 1)])).unwrap();
        book.submit_order(&mut cart_with(&[("B", 1)])).unwrap();

        assert_eq!(book.count_by_status(OrderStatus::Pending), 2);
        assert_eq!(book.count_by_status(OrderStatus::Delivered), 0);
    }
}
