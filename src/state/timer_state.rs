//! Countdown timer state machine

use serde::Serialize;

use crate::error::{ClockError, Result};

/// Longest countdown accepted from the user, in seconds (180 minutes)
pub const MAX_TIMER_SECONDS: u64 = 180 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Finished,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Finished => "finished",
        }
    }
}

/// Countdown timer.
///
/// Remaining time is decremented by one per tick rather than derived from a
/// deadline, so a late tick delays completion by the same amount.
#[derive(Debug, Clone)]
pub struct TimerState {
    time_left_seconds: u64,
    initial_total_seconds: u64,
    phase: TimerPhase,
}

impl TimerState {
    /// Create an idle timer
    pub fn new() -> Self {
        Self {
            time_left_seconds: 0,
            initial_total_seconds: 0,
            phase: TimerPhase::Idle,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn time_left_seconds(&self) -> u64 {
        self.time_left_seconds
    }

    pub fn initial_total_seconds(&self) -> u64 {
        self.initial_total_seconds
    }

    /// Share of the countdown already elapsed, in percent
    pub fn progress_percent(&self) -> f64 {
        if self.initial_total_seconds == 0 {
            return 0.0;
        }
        let done = self.initial_total_seconds - self.time_left_seconds;
        done as f64 / self.initial_total_seconds as f64 * 100.0
    }

    /// Start a fresh countdown from idle (or after a finished one)
    pub fn start(&mut self, duration_seconds: u64) -> Result<()> {
        validate_duration(duration_seconds)?;
        match self.phase {
            TimerPhase::Idle | TimerPhase::Finished => {
                self.time_left_seconds = duration_seconds;
                self.initial_total_seconds = duration_seconds;
                self.phase = TimerPhase::Running;
                Ok(())
            }
            phase => Err(self.rejected("start", phase)),
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        match self.phase {
            TimerPhase::Running => {
                self.phase = TimerPhase::Paused;
                Ok(())
            }
            phase => Err(self.rejected("pause", phase)),
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        match self.phase {
            TimerPhase::Paused => {
                self.phase = TimerPhase::Running;
                Ok(())
            }
            phase => Err(self.rejected("resume", phase)),
        }
    }

    /// Return to idle from any phase
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance one second. Returns `true` exactly once, on the tick that
    /// brings the countdown to zero.
    pub fn tick(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.time_left_seconds = self.time_left_seconds.saturating_sub(1);
        if self.time_left_seconds == 0 {
            self.phase = TimerPhase::Finished;
            return true;
        }
        false
    }

    fn rejected(&self, action: &'static str, phase: TimerPhase) -> ClockError {
        ClockError::InvalidTransition { action, phase: phase.as_str() }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a user-entered duration
pub fn validate_duration(duration_seconds: u64) -> Result<()> {
    if duration_seconds == 0 || duration_seconds > MAX_TIMER_SECONDS {
        return Err(ClockError::invalid_input(format!(
            "timer duration must be between 1 and {} seconds",
            MAX_TIMER_SECONDS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_a_single_completion() {
        for duration in [1u64, 2, 7, 60, 300] {
            let mut timer = TimerState::new();
            timer.start(duration).unwrap();

            let completions = (0..duration).filter(|_| timer.tick()).count();

            assert_eq!(completions, 1, "duration {duration}");
            assert_eq!(timer.phase(), TimerPhase::Finished);
            assert_eq!(timer.time_left_seconds(), 0);
            assert!(!timer.is_running());
            assert!(!timer.tick(), "finished timer must stay quiet");
        }
    }

    #[test]
    fn two_second_scenario() {
        let mut timer = TimerState::new();
        timer.start(2).unwrap();

        assert!(!timer.tick());
        assert_eq!(timer.time_left_seconds(), 1);
        assert!(timer.is_running());

        assert!(timer.tick());
        assert_eq!(timer.time_left_seconds(), 0);
        assert!(!timer.is_running());
    }

    #[test]
    fn pause_and_resume_keep_remaining() {
        let mut timer = TimerState::new();
        timer.start(10).unwrap();
        timer.tick();
        timer.tick();

        timer.pause().unwrap();
        assert!(!timer.tick());
        assert!(!timer.tick());
        assert_eq!(timer.time_left_seconds(), 8);

        timer.resume().unwrap();
        assert_eq!(timer.time_left_seconds(), 8);
        assert!(timer.is_running());
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut timer = TimerState::new();
        assert!(matches!(timer.pause(), Err(ClockError::InvalidTransition { .. })));
        assert!(matches!(timer.resume(), Err(ClockError::InvalidTransition { .. })));

        timer.start(5).unwrap();
        assert!(matches!(timer.start(5), Err(ClockError::InvalidTransition { .. })));
        assert!(matches!(timer.resume(), Err(ClockError::InvalidTransition { .. })));
    }

    #[test]
    fn bad_durations_leave_timer_idle() {
        let mut timer = TimerState::new();
        assert!(matches!(timer.start(0), Err(ClockError::InvalidInput(_))));
        assert!(matches!(timer.start(MAX_TIMER_SECONDS + 1), Err(ClockError::InvalidInput(_))));
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn reset_from_any_phase() {
        let mut timer = TimerState::new();
        timer.start(5).unwrap();
        timer.pause().unwrap();
        timer.reset();

        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.time_left_seconds(), 0);
        assert_eq!(timer.initial_total_seconds(), 0);
    }

    #[test]
    fn progress_tracks_elapsed_share() {
        let mut timer = TimerState::new();
        assert_eq!(timer.progress_percent(), 0.0);

        timer.start(4).unwrap();
        timer.tick();
        assert_eq!(timer.progress_percent(), 25.0);
    }

    #[test]
    fn restart_after_finish() {
        let mut timer = TimerState::new();
        timer.start(1).unwrap();
        assert!(timer.tick());

        timer.start(3).unwrap();
        assert_eq!(timer.time_left_seconds(), 3);
        assert_eq!(timer.initial_total_seconds(), 3);
    }
}
