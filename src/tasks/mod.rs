//! Background tasks module
//!
//! This module contains the periodic tasks that run alongside the HTTP server.

pub mod clock_tick;
pub mod stopwatch_sampler;
pub mod volume_ramp;

// Re-export main functions
pub use clock_tick::clock_tick_task;
pub use stopwatch_sampler::stopwatch_sampler_task;
pub use volume_ramp::volume_ramp_task;
