//! The push-style telemetry source.
//!
//! Unlike the polled vendors, Check Point streams events. A background task
//! listens in bounded windows and hands mapped records to the threat session,
//! which drains them at the start of each cycle.

mod consumer;
mod sse;

pub use consumer::{StreamConsumer, StreamSettings, StreamState};
pub use sse::{SseEvent, SseParser};
