//! Live query: keeps the shared state in step with the store's change feed

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::board::Board;
use crate::clock;

/// How often the board checks whether the school day has changed
pub const DAY_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Load the board, then apply store changes until cancelled or the feed closes
pub async fn run(board: Board, cancel: CancellationToken) {
    run_with_day_check(board, cancel, DAY_CHECK_INTERVAL).await
}

/// Like [`run`], checking for a new school day every `day_check`.
/// A failed initial load is retried on the same schedule.
pub async fn run_with_day_check(board: Board, cancel: CancellationToken, day_check: Duration) {
    // Subscribe before loading so nothing written in between is missed.
    let mut events = board.store().subscribe();
    if let Err(e) = board.load().await {
        tracing::warn!("Initial board load failed: {}", e);
    }

    let mut ticker = tokio::time::interval(day_check);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = board.roll_over_at(clock::current_epoch_ms()).await {
                    tracing::warn!("Day rollover failed: {}", e);
                }
            }
            received = events.recv() => match received {
                Ok(event) => {
                    let changed = board
                        .state()
                        .write()
                        .await
                        .apply_event(event, clock::current_epoch_ms());
                    tracing::trace!("Store change applied (changed={})", changed);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Change feed lagged by {} events, reloading", skipped);
                    if let Err(e) = board.load().await {
                        tracing::warn!("Board reload failed: {}", e);
                    }
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("Change feed closed");
                    break;
                }
            },
            _ = cancel.cancelled() => {
                tracing::debug!("Subscription cancelled");
                break;
            }
        }
    }
}
