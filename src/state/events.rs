//! Notifications broadcast by the application state

use serde::Serialize;

use super::{Alarm, RingingAlarm};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClockEvent {
    /// The alarm matcher selected an alarm this tick
    AlarmTriggered { alarm: Alarm },
    /// The countdown reached zero
    TimerFinished,
    /// The ringer started a session
    RingingStarted { ringing: RingingAlarm, ascending: bool },
    RingingStopped,
}
