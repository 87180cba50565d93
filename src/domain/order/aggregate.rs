use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::errors::EmptyCartError;
use super::progression::ProgressionPolicy;
use super::value_objects::{OrderId, OrderItem, OrderStatus};

// ============================================================================
// Order - Sealed cart with a delivery status
// ============================================================================
//
// Invariants:
// 1. `items` is never empty
// 2. Only `status` changes after creation, and only forward by one step
// 3. `DELIVERED` is terminal
//
// Fields are private so the invariants cannot be broken from outside; the
// status moves only through `advance`.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    order_id: OrderId,

    // Older snapshots call this field `timestamp`
    #[serde(alias = "timestamp", with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,

    status: OrderStatus,
    items: Vec<OrderItem>,
}

impl Order {
    /// Create a `PENDING` order from item snapshots
    ///
    /// `created_at` is truncated to milliseconds, the resolution snapshots
    /// keep, so a reloaded order compares equal to the in-memory one.
    pub fn seal(
        order_id: OrderId,
        created_at: DateTime<Utc>,
        items: Vec<OrderItem>,
    ) -> Result<Self, EmptyCartError> {
        if items.is_empty() {
            return Err(EmptyCartError);
        }

        Ok(Self {
            order_id,
            created_at: created_at.trunc_subsecs(3),
            status: OrderStatus::Pending,
            items,
        })
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Propose the next state of this order for one progression roll
    ///
    /// Returns a copy moved one status forward when the roll passes the
    /// policy for the current status, or an unchanged copy when the roll
    /// fails or the order is already delivered.
    pub fn advance(&self, roll: f64, policy: &ProgressionPolicy) -> Order {
        match self.status.next() {
            Some(next) if policy.passes(self.status, roll) => Order {
                status: next,
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Snapshots loaded from storage skip `seal`, so they are re-checked here
    pub(crate) fn is_well_formed(&self) -> bool {
        !self.items.is_empty()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
