//! Auto-clear: completes cars left in "sent" longer than the school's delay

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::board::Board;
use crate::clock;
use crate::config::AutoClearConfig;

/// Fixed-interval sweep over the board's sent records
#[derive(Debug)]
pub struct AutoClear {
    board: Board,
    delay: Duration,
    interval: Duration,
    cancel: CancellationToken,
}

impl AutoClear {
    pub fn new(board: Board, config: &AutoClearConfig, cancel: CancellationToken) -> Self {
        Self {
            board,
            delay: Duration::from_secs(config.delay_seconds),
            interval: Duration::from_secs(config.check_interval_seconds),
            cancel,
        }
    }

    /// Override the check interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Complete every overdue record once. Returns how many were cleared.
    pub async fn sweep(&self, now_ms: u64) -> usize {
        if let Err(e) = self.board.roll_over_at(now_ms).await {
            tracing::warn!("Day rollover before auto-clear failed: {}", e);
        }

        let candidates = self
            .board
            .state()
            .read()
            .await
            .auto_clear_candidates(now_ms, self.delay);

        let mut cleared = 0;
        for dismissal in candidates {
            match self.board.clear_if_due(&dismissal.id, self.delay, now_ms).await {
                Ok(Some(_)) => cleared += 1,
                Ok(None) => {
                    tracing::debug!("Car {} no longer due for auto-clear", dismissal.car_number)
                }
                Err(e) => tracing::warn!(
                    "Auto-clear of car {} ({}) failed: {}",
                    dismissal.car_number,
                    dismissal.id,
                    e
                ),
            }
        }
        cleared
    }

    /// Sweep until cancelled
    pub async fn run(&self) {
        tracing::info!(
            "Auto-clear every {:?}, delay {:?}",
            self.interval,
            self.delay
        );
        loop {
            let cleared = self.sweep(clock::current_epoch_ms()).await;
            if cleared > 0 {
                tracing::debug!("Auto-clear completed {} cars", cleared);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Auto-clear loop cancelled");
                    break;
                }
            }
        }
    }
}
