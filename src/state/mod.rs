//! State management module
//!
//! This module contains the clock components and the controller that owns them.

pub mod alarm;
pub mod app_state;
pub mod events;
pub mod ringer;
pub mod settings;
pub mod stopwatch;
pub mod timer_state;

// Re-export main types
pub use alarm::Alarm;
pub use app_state::AppState;
pub use events::ClockEvent;
pub use ringer::{Ringer, RingingAlarm};
pub use settings::{AppSettings, SettingsPatch};
pub use stopwatch::{Lap, Stopwatch};
pub use timer_state::{TimerPhase, TimerState};
