//! Request identity: User-Agent pool and header values.
//!
//! Every session client is built with one identity from the pool and every
//! request overrides it with a fresh random pick, so consecutive requests to the
//! same vendor do not share a fingerprint.

use rand::seq::IndexedRandom;

/// Desktop browser identities used for rotation.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:130.0) Gecko/20100101 Firefox/130.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
];

/// Accept value for JSON endpoints
pub const ACCEPT_JSON: &str = "application/json";
/// Accept value for the event-stream source
pub const ACCEPT_EVENT_STREAM: &str = "text/event-stream";
/// Accept-Language sent to vendors that check it
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Picks a random identity from [`USER_AGENTS`].
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}
