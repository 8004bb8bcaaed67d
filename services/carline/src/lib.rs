//! Carline - school dismissal queue service
//!
//! Keeps a live board of cars waiting at each pickup cone, moves them through
//! the pickup workflow on staff action, and auto-clears cars left in "sent".

pub mod auto_clear;
pub mod board;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod lane;
pub mod model;
pub mod queue;
pub mod state;
pub mod store;
pub mod subscription;
pub mod workflow;

pub use config::{load_config, Config};
pub use error::{CarlineError, Result};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auto_clear::AutoClear;
use crate::board::Board;
use crate::store::{DocumentStore, MemoryStore, StoreSeed};

/// Run the carline service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    let cancel = CancellationToken::new();

    let store: Arc<dyn DocumentStore> = match &config.store.seed_path {
        Some(path) => {
            tracing::debug!("Seeding store from {:?}", path);
            Arc::new(MemoryStore::with_seed(StoreSeed::load(path)?))
        }
        None => Arc::new(MemoryStore::new()),
    };

    let state = state::new_state_handle(config.school.id.clone(), config.school.tz()?);
    let board = Board::new(store, state, &config.school)?;

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    let mut handles = vec![tokio::spawn(subscription::run(
        board.clone(),
        cancel.clone(),
    ))];

    if config.auto_clear.enabled {
        let auto_clear = AutoClear::new(board.clone(), &config.auto_clear, cancel.clone());
        handles.push(tokio::spawn(async move { auto_clear.run().await }));
    } else {
        tracing::info!("Auto-clear disabled");
    }

    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let dashboard_board = board.clone();
        let cancel_for_dashboard = cancel.clone();

        handles.push(tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_board);
            let listener = match dashboard::bind(dashboard_port).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("{}. Continuing without dashboard.", e);
                    return;
                }
            };
            tracing::info!("Dashboard listening on http://0.0.0.0:{}", dashboard_port);

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        }));
    }

    tracing::info!("Carline started for '{}'", config.school.name);

    cancel.cancelled().await;
    for handle in handles {
        let _ = handle.await;
    }

    tracing::info!("Carline stopped");
    Ok(())
}
