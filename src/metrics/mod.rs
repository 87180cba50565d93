use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::domain::order::{Order, OrderStatus};

// ============================================================================
// Metrics Module - Prometheus metrics for the order engine
// ============================================================================
//
// Provides metrics for:
// - Cart edits and validation failures
// - Order submissions and status transitions
// - Scheduler ticks (committed vs. unchanged)
// - Persistence failures by operation and kind
// - Current orders per status
//
// There is no HTTP exporter; `encode_text` renders the registry in the
// Prometheus text format for logs or an embedding application.
// ============================================================================

/// Central metrics registry for one session
pub struct Metrics {
    registry: Registry,

    // Cart Metrics
    pub cart_items_added: IntCounter,
    pub cart_items_removed: IntCounter,
    pub cart_validation_failures: IntCounterVec,

    // Order Metrics
    pub orders_submitted: IntCounter,
    pub empty_submissions: IntCounter,
    pub status_transitions: IntCounterVec,
    pub orders_by_status: IntGaugeVec,

    // Scheduler Metrics
    pub scheduler_ticks: IntCounterVec,

    // Persistence Metrics
    pub persistence_failures: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Cart Metrics
        let cart_items_added = IntCounter::new("cart_items_added_total", "Line items added to the cart")?;
        registry.register(Box::new(cart_items_added.clone()))?;

        let cart_items_removed = IntCounter::new("cart_items_removed_total", "Line items removed from the cart")?;
        registry.register(Box::new(cart_items_removed.clone()))?;

        let cart_validation_failures = IntCounterVec::new(
            Opts::new("cart_validation_failures_total", "Rejected add-to-cart attempts"),
            &["reason"],
        )?;
        registry.register(Box::new(cart_validation_failures.clone()))?;

        // Order Metrics
        let orders_submitted = IntCounter::new("orders_submitted_total", "Orders sealed from the cart")?;
        registry.register(Box::new(orders_submitted.clone()))?;

        let empty_submissions = IntCounter::new(
            "order_empty_submissions_total",
            "Submissions rejected because the cart was empty",
        )?;
        registry.register(Box::new(empty_submissions.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Order status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let orders_by_status = IntGaugeVec::new(
            Opts::new("orders_by_status", "Orders currently in each status"),
            &["status"],
        )?;
        registry.register(Box::new(orders_by_status.clone()))?;

        // Scheduler Metrics
        let scheduler_ticks = IntCounterVec::new(
            Opts::new("scheduler_ticks_total", "Status progression ticks by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(scheduler_ticks.clone()))?;

        // Persistence Metrics
        let persistence_failures = IntCounterVec::new(
            Opts::new("persistence_failures_total", "Failed durable storage operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(persistence_failures.clone()))?;

        Ok(Self {
            registry,
            cart_items_added,
            cart_items_removed,
            cart_validation_failures,
            orders_submitted,
            empty_submissions,
            status_transitions,
            orders_by_status,
            scheduler_ticks,
            persistence_failures,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every metric in the Prometheus text exposition format
    pub fn encode_text(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn record_item_added(&self) {
        self.cart_items_added.inc();
    }

    pub fn record_item_removed(&self) {
        self.cart_items_removed.inc();
    }

    pub fn record_validation_failure(&self, reason: &str) {
        self.cart_validation_failures.with_label_values(&[reason]).inc();
    }

    pub fn record_order_submitted(&self) {
        self.orders_submitted.inc();
    }

    pub fn record_empty_submission(&self) {
        self.empty_submissions.inc();
    }

    pub fn record_status_transition(&self, from: OrderStatus, to: OrderStatus) {
        self.status_transitions
            .with_label_values(&[from.as_str(), to.as_str()])
            .inc();
    }

    /// `outcome` is "committed" or "unchanged"
    pub fn record_tick(&self, outcome: &str) {
        self.scheduler_ticks.with_label_values(&[outcome]).inc();
    }

    pub fn record_persistence_failure(&self, operation: &str, kind: &str) {
        self.persistence_failures.with_label_values(&[operation, kind]).inc();
    }

    /// Recompute the per-status gauge from the full collection
    pub fn update_orders_by_status(&self, orders: &[Order]) {
        for status in OrderStatus::ALL {
            let count = orders.iter().filter(|o| o.status() == status).count();
            self.orders_by_status
                .with_label_values(&[status.as_str()])
                .set(i64::try_from(count).unwrap_or(i64::MAX));
        }
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_status_transition() {
        let metrics = Metrics::new().unwrap();
        metrics.record_status_transition(OrderStatus::Pending, OrderStatus::Accepted);
        metrics.record_status_transition(OrderStatus::Pending, OrderStatus::Accepted);

        let value = metrics
            .status_transitions
            .with_label_values(&["PENDING", "ACCEPTED"])
            .get();
        assert_eq!(value, 2);
    }

    #[test]
    fn test_validation_failures_by_reason() {
        let metrics = Metrics::new().unwrap();
        metrics.record_validation_failure("empty_drug_name");

        assert_eq!(
            metrics
                .cart_validation_failures
                .with_label_values(&["empty_drug_name"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .cart_validation_failures
                .with_label_values(&["invalid_quantity"])
                .get(),
            0
        );
    }

    #[test]
    fn test_encode_text_contains_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_submitted();
        metrics.record_tick("committed");

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("orders_submitted_total 1"));
        assert!(text.contains("scheduler_ticks_total{outcome=\"committed\"} 1"));
    }
}
