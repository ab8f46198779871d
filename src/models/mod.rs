//! Normalized record types shared by every source and consumer.
//!
//! Vendors speak their own payload dialects; adapters map them onto these
//! types, the aggregation step folds them, and consumers receive them in
//! batches.

mod attack;
mod ip;
mod news;

use serde::Serialize;

pub use attack::{AttackGroup, AttackRecord};
pub use ip::{IpKind, MaliciousIpRecord};
pub use news::NewsArticle;

/// An independently scheduled and queued family of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Threat,
    News,
    MaliciousIp,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Threat, Domain::News, Domain::MaliciousIp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Threat => "threat_data",
            Domain::News => "news_data",
            Domain::MaliciousIp => "malicious_ip",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch of records from one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "domain", content = "records", rename_all = "snake_case")]
pub enum DomainBatch {
    Threat(Vec<AttackGroup>),
    News(Vec<NewsArticle>),
    MaliciousIp(Vec<MaliciousIpRecord>),
}

impl DomainBatch {
    pub fn domain(&self) -> Domain {
        match self {
            DomainBatch::Threat(_) => Domain::Threat,
            DomainBatch::News(_) => Domain::News,
            DomainBatch::MaliciousIp(_) => Domain::MaliciousIp,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DomainBatch::Threat(r) => r.len(),
            DomainBatch::News(r) => r.len(),
            DomainBatch::MaliciousIp(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Natural identity of a delivered record, used by the session seen-set.
pub trait Identity {
    fn identity(&self) -> String;
}

impl Identity for AttackGroup {
    fn identity(&self) -> String {
        format!("{}>{}", self.source_country_code, self.destination_country_code)
    }
}

impl Identity for MaliciousIpRecord {
    fn identity(&self) -> String {
        self.ip.clone()
    }
}

impl Identity for NewsArticle {
    fn identity(&self) -> String {
        self.link.clone()
    }
}

/// Current UTC time in ISO-8601 without offset, the stamp used when a vendor
/// supplies none.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
