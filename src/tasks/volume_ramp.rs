//! Ascending volume ramp during ringing

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::broadcast::error::RecvError,
    time::{interval_at, Instant},
};
use tracing::{debug, error, info, warn};

use crate::state::{AppState, ClockEvent};

pub const RAMP_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that raises the volume once per second while an
/// ascending ring is active, and stops as soon as ringing is dismissed
pub async fn volume_ramp_task(state: Arc<AppState>) {
    info!("Starting volume ramp task");

    let mut event_rx = state.subscribe();

    loop {
        match event_rx.recv().await {
            Ok(ClockEvent::RingingStarted { ascending: true, ringing }) => {
                debug!("Ramping volume for {}", ringing.describe());

                let mut interval = interval_at(Instant::now() + RAMP_INTERVAL, RAMP_INTERVAL);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            match state.ramp_volume() {
                                Ok(Some(volume)) => debug!("Volume raised to {:.1}", volume),
                                Ok(None) => {
                                    debug!("Volume ramp complete");
                                    break;
                                }
                                Err(e) => {
                                    error!("Failed to raise volume: {}", e);
                                    break;
                                }
                            }
                        }

                        event = event_rx.recv() => {
                            match event {
                                Ok(ClockEvent::RingingStopped) => {
                                    debug!("Ringing stopped, cancelling volume ramp");
                                    break;
                                }
                                Ok(_) | Err(RecvError::Lagged(_)) => {}
                                Err(RecvError::Closed) => return,
                            }
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Volume ramp task lagged by {} events", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Event channel closed, volume ramp task exiting");
                return;
            }
        }
    }
}
