//! Malicious-IP reputation records.

use serde::{Deserialize, Serialize};

/// Why a reputation list flags an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpKind {
    Malicious,
    Spam,
}

/// A flagged address with its approximate location, when the locator knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaliciousIpRecord {
    pub ip: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(rename = "type")]
    pub kind: IpKind,
}
