use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dawak_orders::config::Config;
use dawak_orders::domain::cart::{ImageAttachment, LineItemDraft, PreviewHandle, PreviewHost};
use dawak_orders::metrics::Metrics;
use dawak_orders::session::{PharmacySession, SessionEnvironment};
use dawak_orders::storage::FileStore;

const DEFAULT_DEMO_DURATION_SECS: u64 = 30;

/// Stand-in for an image picker: previews are only logged
struct LoggingPreviewHost;

impl PreviewHost for LoggingPreviewHost {
    fn release(&self, key: &str) {
        tracing::debug!(preview = key, "🖼️  Released image preview");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO with debug for this crate, overridable with RUST_LOG
    // Example: RUST_LOG=dawak_orders=trace cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,dawak_orders=debug"))
        )
        .init();

    tracing::info!("💊 Starting Dawak pharmacy order demo");

    // === 1. Configuration and storage ===
    let config = Config::from_env();
    let store = Arc::new(FileStore::open(&config.storage.data_dir)?);
    tracing::info!(data_dir = %store.root().display(), "Using file-backed store");

    // === 2. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 3. Login and open the session ===
    let env = SessionEnvironment::new(store, metrics.clone());
    let gate = env.auth_gate(&config);
    if !gate.is_active() {
        gate.login(&config.auth.credentials.email, &config.auth.credentials.password)?;
    }
    let mut session = PharmacySession::open(gate, &config, env)?;

    // === 4. Fill the cart and submit ===
    let previews: Arc<dyn PreviewHost> = Arc::new(LoggingPreviewHost);

    session.add_item(&mut LineItemDraft::new("Panadol Extra").with_quantity(2))?;
    session.add_item(
        &mut LineItemDraft::new("Augmentin 1g")
            .with_notes("Prescription attached")
            .with_image(ImageAttachment::new(PreviewHandle::new("preview-1", previews.clone()))),
    )?;

    if let Err(err) = session.add_item(&mut LineItemDraft::new("  ")) {
        tracing::info!(error = %err, "Blank drug name rejected as expected");
    }

    let submission = session.submit_order().await?;
    tracing::info!(
        order_id = %submission.order.order_id(),
        items = submission.order.items().len(),
        "📦 Submitted demo order"
    );

    // === 5. Watch the scheduler move orders along ===
    let duration = std::env::var("DAWAK_DEMO_DURATION_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_DEMO_DURATION_SECS);
    tracing::info!(seconds = duration, "⏳ Watching status progression");

    let mut changes = session.subscribe().await;
    let deadline = tokio::time::sleep(Duration::from_secs(duration));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let orders = changes.borrow_and_update().clone();
                for order in &orders {
                    tracing::info!(
                        order_id = %order.order_id(),
                        status = order.status().label(),
                        "Order status"
                    );
                }
            }
        }
    }

    // === 6. Report and tear down ===
    for order in session.orders().await {
        tracing::info!(
            order_id = %order.order_id(),
            created_at = %order.created_at(),
            status = order.status().label(),
            items = order.items().len(),
            "📋 Order history"
        );
    }

    let health = session.health().await;
    tracing::info!(overall = ?health.overall_status, summary = %health.summary(), "Session health");
    tracing::debug!("Metrics:\n{}", metrics.encode_text()?);

    session.logout().await?;
    tracing::info!("🎉 Demo complete!");

    Ok(())
}
