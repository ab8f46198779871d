//! Injectable sleeping, so backoff can be observed without waiting.

use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;

/// Something that can wait for a duration.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Records requested durations and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Durations requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .map(|slept| slept.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        match self.slept.lock() {
            Ok(mut slept) => slept.push(duration),
            Err(poisoned) => poisoned.into_inner().push(duration),
        }
        Box::pin(std::future::ready(()))
    }
}
