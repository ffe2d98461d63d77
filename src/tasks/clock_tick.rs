//! 1 Hz clock tick driving the alarm matcher and the countdown

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that samples the wall clock once per second
pub async fn clock_tick_task(state: Arc<AppState>) {
    info!("Starting clock tick task");

    let mut interval = interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match state.tick() {
            Ok(events) if !events.is_empty() => debug!("Tick produced {:?}", events),
            Ok(_) => {}
            Err(e) => error!("Clock tick failed: {}", e),
        }
    }
}
