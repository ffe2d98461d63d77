//! Pixelclock - A headless clock daemon
//!
//! This library provides the clock core (alarm matching, countdown timer,
//! stopwatch and ringer) together with the HTTP API and background tasks
//! that drive it.

pub mod config;
pub mod error;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::ClockError;
pub use services::Capabilities;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
