use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::progression::StatusProgression;
use crate::domain::order::OrderBook;
use crate::health::{Component, ComponentHealth, ReportsHealth};

// ============================================================================
// Scheduler Runner - Background timer driving status progression
// ============================================================================
//
// One tokio task per session. The first tick fires one interval after start;
// each tick takes the order book lock, so ticks never interleave with user
// operations. Late ticks are skipped rather than bunched up.
//
// ============================================================================

/// Start the background progression loop
pub fn spawn_scheduler(
    book: Arc<Mutex<OrderBook>>,
    mut progression: StatusProgression,
    period: Duration,
) -> SchedulerHandle {
    // interval_at panics on a zero period
    let period = period.max(Duration::from_millis(1));
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let ticks = Arc::new(AtomicU64::new(0));
    let tick_counter = ticks.clone();

    tracing::info!(period_ms = period.as_millis() as u64, "⏱️  Starting status progression scheduler");

    let first_tick = Instant::now() + period;
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(first_tick, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => {
                    tracing::debug!("Scheduler received shutdown");
                    break;
                }
                _ = interval.tick() => {
                    let mut book = book.lock().await;
                    let report = progression.tick(&mut book);
                    let count = tick_counter.fetch_add(1, Ordering::Relaxed) + 1;

                    if let Some(warning) = &report.warning {
                        tracing::warn!(tick = count, error = %warning, "Advanced orders were not persisted");
                    }
                }
            }
        }

        tick_counter.load(Ordering::Relaxed)
    });

    SchedulerHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
        ticks,
    }
}

/// Owner of the scheduler task
///
/// `shutdown` stops the loop and waits for it; dropping the handle aborts
/// the task outright.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<u64>>,
    ticks: Arc<AtomicU64>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Stop the timer and join the task, returning the number of ticks run
    pub async fn shutdown(mut self) -> u64 {
        if let Some(tx) = self.shutdown_tx.take() {
            // Err means the loop already exited
            let _ = tx.send(());
        }

        let ticks = match self.task.take() {
            Some(task) => match task.await {
                Ok(ticks) => ticks,
                Err(err) => {
                    tracing::warn!(error = %err, "Scheduler task did not finish cleanly");
                    self.ticks()
                }
            },
            None => self.ticks(),
        };

        tracing::info!(ticks, "Status progression scheduler stopped");
        ticks
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl ReportsHealth for SchedulerHandle {
    fn health(&self) -> ComponentHealth {
        let running = self.is_running();
        let component = Component::Scheduler {
            ticks: self.ticks(),
            running,
        };

        if running {
            ComponentHealth::healthy(component)
        } else {
            ComponentHealth::unhealthy(component, "stopped")
        }
    }
}
