pub mod auth;

pub use auth::{AuthError, AuthGate, Credentials};

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::config::Config;
use crate::domain::cart::{Cart, LineItemDraft, LineItemId, ValidationError};
use crate::domain::order::{EmptyCartError, Order, OrderBook, OrderId, Submission};
use crate::health::{ReportsHealth, SessionHealth};
use crate::metrics::Metrics;
use crate::scheduler::{spawn_scheduler, SchedulerHandle, StatusProgression};
use crate::storage::{KeyValueStore, OrderSnapshotStore, WriteThrough};
use crate::utils::{Clock, RandomSource, StdRandom, SystemClock};

// ============================================================================
// Pharmacy Session - Explicit container for one logged-in session
// ============================================================================
//
// Owns the cart, the shared order book and the scheduler task. Opening loads
// the stored collection and starts the scheduler; `logout` or `close` stop
// it again. Nothing here is process-wide, so several sessions can coexist
// (tests open many).
//
// ============================================================================

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not logged in")]
    NotAuthenticated,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    EmptyCart(#[from] EmptyCartError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Collaborators injected into a session
pub struct SessionEnvironment {
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub random: Box<dyn RandomSource>,
    pub metrics: Arc<Metrics>,
}

impl SessionEnvironment {
    /// Wall clock and entropy-seeded rolls
    pub fn new(store: Arc<dyn KeyValueStore>, metrics: Arc<Metrics>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            random: Box::new(StdRandom::from_entropy()),
            metrics,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Gate over this environment's store and clock
    pub fn auth_gate(&self, config: &Config) -> AuthGate {
        AuthGate::new(
            self.store.clone(),
            config.storage.token_key.clone(),
            config.auth.credentials.clone(),
            self.clock.clone(),
        )
    }
}

pub struct PharmacySession {
    gate: AuthGate,
    cart: Cart,
    book: Arc<Mutex<OrderBook>>,
    scheduler: SchedulerHandle,
    metrics: Arc<Metrics>,
}

impl PharmacySession {
    /// Open a session behind an active gate
    ///
    /// Must be called from within a tokio runtime; the scheduler task is
    /// spawned here and fires its first tick one interval later.
    pub fn open(gate: AuthGate, config: &Config, env: SessionEnvironment) -> Result<Self, SessionError> {
        if !gate.is_active() {
            tracing::warn!("Refusing to open a session without a login");
            return Err(SessionError::NotAuthenticated);
        }

        let SessionEnvironment {
            store,
            clock,
            random,
            metrics,
        } = env;

        let snapshots = OrderSnapshotStore::new(store, config.storage.orders_key.clone());
        let orders = snapshots.load();
        let sink = WriteThrough::new(snapshots, config.storage.failure_threshold).with_metrics(metrics.clone());
        let book = OrderBook::new(orders, Box::new(sink), clock).with_metrics(metrics.clone());
        let book = Arc::new(Mutex::new(book));

        let progression =
            StatusProgression::new(config.progression.policy, random).with_metrics(metrics.clone());
        let scheduler = spawn_scheduler(book.clone(), progression, config.progression.tick_interval);

        tracing::info!(
            orders_key = %config.storage.orders_key,
            tick_interval_ms = config.progression.tick_interval.as_millis() as u64,
            "🏥 Pharmacy session opened"
        );

        Ok(Self {
            gate,
            cart: Cart::new(),
            book,
            scheduler,
            metrics,
        })
    }

    // ========================================================================
    // Cart
    // ========================================================================

    /// Validate the draft and move it into the cart
    ///
    /// On success the draft is reset for the next entry; on failure it is
    /// left as typed.
    pub fn add_item(&mut self, draft: &mut LineItemDraft) -> Result<LineItemId, SessionError> {
        match self.cart.add_item(draft) {
            Ok(id) => {
                self.metrics.record_item_added();
                Ok(id)
            }
            Err(err) => {
                self.metrics.record_validation_failure(err.reason());
                tracing::debug!(error = %err, "Rejected cart item");
                Err(err.into())
            }
        }
    }

    /// Returns false when no item has that id
    pub fn remove_item(&mut self, id: LineItemId) -> bool {
        let removed = self.cart.remove_item(id);
        if removed {
            self.metrics.record_item_removed();
        }
        removed
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    // ========================================================================
    // Orders
    // ========================================================================

    pub async fn submit_order(&mut self) -> Result<Submission, SessionError> {
        let mut book = self.book.lock().await;
        match book.submit_order(&mut self.cart) {
            Ok(submission) => {
                if let Some(warning) = &submission.warning {
                    tracing::warn!(
                        order_id = %submission.order.order_id(),
                        error = %warning,
                        "Order kept in memory only"
                    );
                }
                Ok(submission)
            }
            Err(err) => {
                self.metrics.record_empty_submission();
                Err(err.into())
            }
        }
    }

    /// Snapshot of the collection, newest first
    pub async fn orders(&self) -> Vec<Order> {
        self.book.lock().await.orders().to_vec()
    }

    pub async fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.book.lock().await.get(order_id).cloned()
    }

    /// Receive the full collection after every committed change
    pub async fn subscribe(&self) -> watch::Receiver<Vec<Order>> {
        self.book.lock().await.subscribe()
    }

    pub async fn health(&self) -> SessionHealth {
        let persistence = self.book.lock().await.persistence_health();
        SessionHealth::from_components(vec![persistence, self.scheduler.health()])
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Stop the scheduler and clear the login marker
    ///
    /// The order history stays in the store for the next login.
    pub async fn logout(self) -> Result<(), SessionError> {
        let Self { gate, scheduler, .. } = self;
        scheduler.shutdown().await;
        gate.logout()?;
        Ok(())
    }

    /// Stop the scheduler but stay logged in
    pub async fn close(self) -> u64 {
        let ticks = self.scheduler.shutdown().await;
        tracing::info!(ticks, "Pharmacy session closed");
        ticks
    }
}

impl std::fmt::Debug for PharmacySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PharmacySession")
            .field("cart", &self.cart.len())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
