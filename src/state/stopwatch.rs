//! Stopwatch with lap capture

use serde::Serialize;

use crate::error::{ClockError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lap {
    /// 1-based lap number
    pub index: usize,
    pub absolute_elapsed_ms: u64,
    pub delta_from_previous_lap_ms: u64,
}

/// Stopwatch measured against a virtual start epoch on a monotonic clock.
/// Elapsed time is always recomputed as `now - epoch`, never accumulated.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    /// Monotonic timestamp at which elapsed would have been zero
    epoch_ms: Option<u64>,
    elapsed_ms: u64,
    /// Most recent first
    laps: Vec<Lap>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.epoch_ms.is_some()
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    /// Last sampled elapsed time
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Recompute elapsed from the epoch; no-op while stopped
    pub fn sample(&mut self, now_ms: u64) -> u64 {
        if let Some(epoch) = self.epoch_ms {
            self.elapsed_ms = now_ms.saturating_sub(epoch);
        }
        self.elapsed_ms
    }

    pub fn start(&mut self, now_ms: u64) {
        if self.epoch_ms.is_none() {
            self.epoch_ms = Some(now_ms.saturating_sub(self.elapsed_ms));
        }
    }

    pub fn pause(&mut self, now_ms: u64) {
        self.sample(now_ms);
        self.epoch_ms = None;
    }

    pub fn reset(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(ClockError::InvalidTransition { action: "reset stopwatch", phase: "running" });
        }
        self.elapsed_ms = 0;
        self.laps.clear();
        Ok(())
    }

    pub fn lap(&mut self, now_ms: u64) -> Result<Lap> {
        if !self.is_running() {
            return Err(ClockError::InvalidTransition { action: "record a lap", phase: "stopped" });
        }
        let elapsed = self.sample(now_ms);
        let previous = self.laps.first().map(|lap| lap.absolute_elapsed_ms).unwrap_or(0);
        let lap = Lap {
            index: self.laps.len() + 1,
            absolute_elapsed_ms: elapsed,
            delta_from_previous_lap_ms: elapsed - previous,
        };
        self.laps.insert(0, lap);
        Ok(lap)
    }
}
