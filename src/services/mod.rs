//! External capability module
//!
//! This module contains the capabilities the clock core calls into: the wall
//! clock, the key-value store, audio output and haptic feedback.

pub mod audio;
pub mod haptics;
pub mod storage;
pub mod time_source;

use std::sync::Arc;

// Re-export main types
pub use audio::*;
pub use haptics::*;
pub use storage::*;
pub use time_source::*;

/// Bundle of capabilities injected into the application state
#[derive(Clone)]
pub struct Capabilities {
    pub clock: Arc<dyn TimeSource>,
    pub store: Arc<dyn KeyValueStore>,
    pub audio: Arc<dyn AudioSink>,
    pub haptics: Arc<dyn HapticSink>,
}

impl Capabilities {
    /// In-memory store, silent audio and the given clock
    pub fn headless(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            clock,
            store: Arc::new(MemoryStore::new()),
            audio: Arc::new(SilentAudioSink),
            haptics: Arc::new(LogHapticSink),
        }
    }
}
