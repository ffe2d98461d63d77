//! Haptic feedback sinks

use tracing::debug;

use crate::error::Result;

/// Vibration pattern used while ringing, in alternating on/off milliseconds
pub const RING_PATTERN_MS: [u64; 4] = [500, 250, 500, 1000];

/// Optional vibration capability
pub trait HapticSink: Send + Sync {
    /// Start repeating `pattern` until cancelled
    fn vibrate(&self, pattern: &[u64]) -> Result<()>;
    fn cancel(&self) -> Result<()>;
}

/// Sink for hosts without a vibration motor
#[derive(Debug, Default)]
pub struct LogHapticSink;

impl HapticSink for LogHapticSink {
    fn vibrate(&self, pattern: &[u64]) -> Result<()> {
        debug!("Vibration pattern requested: {:?}", pattern);
        Ok(())
    }

    fn cancel(&self) -> Result<()> {
        debug!("Vibration cancelled");
        Ok(())
    }
}
