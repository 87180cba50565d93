use std::sync::Arc;

use crate::domain::order::{
    ChangeCause, Order, OrderBook, ProgressionPolicy, StatusTransition,
};
use crate::metrics::Metrics;
use crate::storage::PersistenceError;
use crate::utils::RandomSource;

// ============================================================================
// Status Progression - One simulated fulfilment step
// ============================================================================
//
// A tick rolls once for every non-terminal order, builds the proposed
// collection, and commits it only when it differs by value from the current
// one. Terminal orders are copied through without a roll.
//
// ============================================================================

/// Outcome of one tick
#[derive(Debug, Default)]
pub struct TickReport {
    /// Non-terminal orders that were rolled for
    pub evaluated: usize,
    pub transitions: Vec<StatusTransition>,
    /// Set when the advanced collection could not be written through
    pub warning: Option<PersistenceError>,
}

impl TickReport {
    pub fn committed(&self) -> bool {
        !self.transitions.is_empty()
    }
}

pub struct StatusProgression {
    policy: ProgressionPolicy,
    random: Box<dyn RandomSource>,
    metrics: Option<Arc<Metrics>>,
}

impl StatusProgression {
    pub fn new(policy: ProgressionPolicy, random: Box<dyn RandomSource>) -> Self {
        Self {
            policy,
            random,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn policy(&self) -> &ProgressionPolicy {
        &self.policy
    }

    pub fn tick(&mut self, book: &mut OrderBook) -> TickReport {
        let mut report = TickReport::default();
        let mut proposed: Vec<Order> = Vec::with_capacity(book.len());

        for order in book.orders() {
            if order.is_terminal() {
                proposed.push(order.clone());
                continue;
            }

            report.evaluated += 1;
            let roll = self.random.next_roll();
            let next = order.advance(roll, &self.policy);

            if next.status() != order.status() {
                report.transitions.push(StatusTransition {
                    order_id: order.order_id().clone(),
                    from: order.status(),
                    to: next.status(),
                });
            }
            proposed.push(next);
        }

        if proposed.as_slice() == book.orders() {
            tracing::debug!(evaluated = report.evaluated, "Tick left every order unchanged");
            self.record_tick("unchanged");
            return report;
        }

        for transition in &report.transitions {
            tracing::info!(
                order_id = %transition.order_id,
                from = ?transition.from,
                to = ?transition.to,
                "🚚 Order status advanced"
            );
            if let Some(metrics) = &self.metrics {
                metrics.record_status_transition(transition.from, transition.to);
            }
        }

        let cause = ChangeCause::StatusAdvanced {
            transitions: report.transitions.clone(),
        };
        report.warning = book.commit(proposed, cause).err();
        self.record_tick("committed");

        report
    }

    fn record_tick(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_tick(outcome);
        }
    }
}

impl std::fmt::Debug for StatusProgression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusProgression")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
