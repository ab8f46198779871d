//! Vendor adapters.
//!
//! Each adapter is a pure transform from a vendor payload to normalized
//! records, plus a thin driver that fetches the payload through the
//! [`RetryingFetcher`](crate::fetch::RetryingFetcher). Malformed sub-items are
//! skipped and counted, never fatal to the rest of the payload.

mod checkpoint;
mod fortiguard;
mod news;
mod radware;
mod reputation;

use std::fmt;

use clap::ValueEnum;
use serde_json::Value;

use crate::models::IpKind;

pub use checkpoint::{map_checkpoint_event, CHECKPOINT_FIELDS};
pub use fortiguard::{fetch_fortiguard, parse_fortiguard};
pub use news::{articles_from_feed, fetch_feed};
pub use radware::{fetch_radware, parse_radware};
pub use reputation::{
    fetch_ip_source, locate_ips, parse_alienvault, parse_banlist, parse_fraudguard, parse_talos,
};

/// Attack-telemetry vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ThreatSource {
    Fortiguard,
    /// Pushes events over a server-sent-event stream instead of being polled.
    Checkpoint,
    Radware,
}

impl ThreatSource {
    pub fn all() -> Vec<Self> {
        vec![Self::Fortiguard, Self::Checkpoint, Self::Radware]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fortiguard => "fortiguard",
            Self::Checkpoint => "checkpoint",
            Self::Radware => "radware",
        }
    }

    pub fn is_streamed(&self) -> bool {
        matches!(self, Self::Checkpoint)
    }
}

impl fmt::Display for ThreatSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IP-reputation lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum IpSource {
    #[value(name = "alienvault")]
    AlienVault,
    #[value(name = "bd-banlist")]
    BdBanlist,
    #[value(name = "fraudguard")]
    FraudGuard,
    Talos,
}

impl IpSource {
    pub fn all() -> Vec<Self> {
        vec![Self::AlienVault, Self::BdBanlist, Self::FraudGuard, Self::Talos]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlienVault => "alienvault",
            Self::BdBanlist => "bd-banlist",
            Self::FraudGuard => "fraudguard",
            Self::Talos => "talos",
        }
    }

    /// Talos lists spam senders; the others list attackers.
    pub fn kind(&self) -> IpKind {
        match self {
            Self::Talos => IpKind::Spam,
            _ => IpKind::Malicious,
        }
    }
}

impl fmt::Display for IpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a pure adapter: the records it could map and how many
/// sub-items it had to skip.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub items: Vec<T>,
    pub malformed: usize,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            malformed: 0,
        }
    }
}

impl<T> Parsed<T> {
    pub(crate) fn skip(&mut self) {
        self.malformed += 1;
    }
}

/// Vendors write "no value" as null or as the literal string `"None"`.
pub(crate) fn is_present(value: &Value) -> bool {
    !(value.is_null() || value.as_str() == Some("None"))
}

/// Non-blank text, accepting numbers as their decimal rendering.
pub(crate) fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && s != "None").then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A coordinate given as a JSON number or a numeric string.
pub(crate) fn float_field(value: Option<&Value>) -> Option<f64> {
    let parsed: Option<f64> = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// A non-negative attack count, given as integer, float or numeric string.
pub(crate) fn count_field(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_names_round_trip_through_clap() {
        for source in ThreatSource::all() {
            assert_eq!(ThreatSource::from_str(source.as_str(), true), Ok(source));
        }
        for source in IpSource::all() {
            assert_eq!(IpSource::from_str(source.as_str(), true), Ok(source));
        }
    }

    #[test]
    fn test_ip_source_kind() {
        assert_eq!(IpSource::Talos.kind(), IpKind::Spam);
        assert_eq!(IpSource::AlienVault.kind(), IpKind::Malicious);
        assert!(ThreatSource::Checkpoint.is_streamed());
        assert!(!ThreatSource::Radware.is_streamed());
    }

    #[test]
    fn test_field_helpers() {
        assert_eq!(text_field(Some(&json!(" US "))), Some("US".to_string()));
        assert_eq!(text_field(Some(&json!("None"))), None);
        assert_eq!(text_field(Some(&json!(""))), None);
        assert_eq!(text_field(Some(&json!(1704067200))), Some("1704067200".to_string()));
        assert_eq!(text_field(None), None);

        assert_eq!(float_field(Some(&json!(12.5))), Some(12.5));
        assert_eq!(float_field(Some(&json!("-3.25"))), Some(-3.25));
        assert_eq!(float_field(Some(&json!("north"))), None);
        assert_eq!(float_field(Some(&json!(null))), None);

        assert_eq!(count_field(Some(&json!(3))), Some(3));
        assert_eq!(count_field(Some(&json!(2.0))), Some(2));
        assert_eq!(count_field(Some(&json!("7"))), Some(7));
        assert_eq!(count_field(Some(&json!(-1))), None);

        assert!(is_present(&json!("x")));
        assert!(!is_present(&json!("None")));
        assert!(!is_present(&json!(null)));
    }
}
