//! Ringing session: looped playback, haptics and the ascending volume ramp

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::services::{audio::log_audio_failure, AudioSink, HapticSink, PlaybackRequest, RING_PATTERN_MS};
use super::{Alarm, AppSettings};

/// Number of one-second steps from silence to full volume
pub const RAMP_STEPS: u8 = 10;

/// What is currently sounding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RingingAlarm {
    Alarm(Alarm),
    #[serde(rename_all = "camelCase")]
    TimerFinished { finished_at: String },
}

impl RingingAlarm {
    pub fn describe(&self) -> String {
        match self {
            RingingAlarm::Alarm(alarm) => format!("alarm {} ({})", alarm.time, alarm.label),
            RingingAlarm::TimerFinished { finished_at } => format!("timer finished at {}", finished_at),
        }
    }
}

/// Single ringing slot; at most one session at a time
#[derive(Debug, Default)]
pub struct Ringer {
    current: Option<RingingAlarm>,
    /// Ramp position, `None` when not ramping
    ramp_step: Option<u8>,
}

impl Ringer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&RingingAlarm> {
        self.current.as_ref()
    }

    pub fn is_ringing(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_ramping(&self) -> bool {
        self.ramp_step.is_some()
    }

    /// Begin ringing. Returns `false` when suppressed because a session is
    /// already active. Sink failures are logged; the state still changes.
    pub fn trigger(
        &mut self,
        source: RingingAlarm,
        settings: &AppSettings,
        audio: &dyn AudioSink,
        haptics: &dyn HapticSink,
    ) -> bool {
        if let Some(active) = &self.current {
            debug!("Suppressing {} while {} is ringing", source.describe(), active.describe());
            return false;
        }

        info!("Ringing: {}", source.describe());
        let volume = if settings.ascending_volume { 0.0 } else { 1.0 };
        self.ramp_step = settings.ascending_volume.then_some(0);
        self.current = Some(source);

        let request = PlaybackRequest {
            source: settings.sound_source().to_string(),
            start_offset_secs: settings.sound_start_time,
            looped: true,
            volume,
        };
        log_audio_failure("play", audio.play(&request));
        if let Err(e) = haptics.vibrate(&RING_PATTERN_MS) {
            warn!("Vibration failed: {}", e);
        }
        true
    }

    /// One ramp increment. Returns the new volume, or `None` once the ramp
    /// is over or was cancelled.
    pub fn ramp_step(&mut self, audio: &dyn AudioSink) -> Option<f32> {
        let step = self.ramp_step?.saturating_add(1).min(RAMP_STEPS);
        let volume = f32::from(step) / f32::from(RAMP_STEPS);
        log_audio_failure("volume change", audio.set_volume(volume));

        self.ramp_step = (step < RAMP_STEPS).then_some(step);
        Some(volume)
    }

    /// Stop ringing and cancel any ramp; returns what was ringing
    pub fn stop(&mut self, audio: &dyn AudioSink, haptics: &dyn HapticSink) -> Option<RingingAlarm> {
        self.ramp_step = None;
        let stopped = self.current.take()?;

        log_audio_failure("stop", audio.stop());
        if let Err(e) = haptics.cancel() {
            warn!("Failed to cancel vibration: {}", e);
        }
        info!("Stopped ringing: {}", stopped.describe());
        Some(stopped)
    }
}
