//! Repaint-rate stopwatch sampler

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::state::AppState;

/// Roughly one display frame at 60 Hz
pub const REPAINT_INTERVAL: Duration = Duration::from_millis(16);

/// Background task that refreshes the stopwatch reading at repaint rate
/// while it runs, and parks otherwise
pub async fn stopwatch_sampler_task(state: Arc<AppState>) {
    info!("Starting stopwatch sampler task");

    let mut running = state.watch_stopwatch_running();

    loop {
        while !*running.borrow_and_update() {
            if running.changed().await.is_err() {
                return;
            }
        }

        let mut repaint = interval(REPAINT_INTERVAL);
        repaint.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = repaint.tick() => {
                    if let Err(e) = state.sample_stopwatch() {
                        error!("Failed to sample stopwatch: {}", e);
                    }
                }

                changed = running.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !*running.borrow_and_update() {
                        break;
                    }
                }
            }
        }
    }
}
