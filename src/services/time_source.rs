//! Wall-clock and monotonic time sources

use std::{
    sync::Mutex,
    time::{Duration, Instant},
};
use chrono::{Local, NaiveDateTime};

/// Source of the current local time and a monotonic millisecond counter
pub trait TimeSource: Send + Sync {
    /// Current local wall-clock time, without timezone
    fn now(&self) -> NaiveDateTime;

    /// Milliseconds elapsed on a monotonic clock since an arbitrary origin
    fn monotonic_ms(&self) -> u64;
}

/// Time source backed by the system clock
#[derive(Debug)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn monotonic_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually driven time source, advanced explicitly by the caller
#[derive(Debug)]
pub struct ManualTimeSource {
    inner: Mutex<(NaiveDateTime, u64)>,
}

impl ManualTimeSource {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { inner: Mutex::new((start, 0)) }
    }

    /// Move both the wall clock and the monotonic counter forward
    pub fn advance(&self, by: Duration) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.0 += chrono::Duration::milliseconds(by.as_millis() as i64);
            inner.1 += by.as_millis() as u64;
        }
    }

    /// Jump the wall clock without touching the monotonic counter
    pub fn set_now(&self, now: NaiveDateTime) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.0 = now;
        }
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> NaiveDateTime {
        self.inner.lock().map(|inner| inner.0).unwrap_or_default()
    }

    fn monotonic_ms(&self) -> u64 {
        self.inner.lock().map(|inner| inner.1).unwrap_or_default()
    }
}
