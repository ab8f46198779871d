//! HTTP fetching with bounded retries.
//!
//! A request moves through explicit [`RetryState`]s: it is attempted, backs
//! off on throttling (429/403), transport errors or unexpected statuses, and
//! ends in success or exhaustion. Exhaustion is not an error for callers, it is
//! simply the absence of data for this cycle.

mod request;
mod retry;
mod sleeper;

pub use request::RetryingFetcher;
pub use retry::{run_with_retry, RetryPolicy, RetryState};
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};
