//! Attack telemetry records.

use serde::{Deserialize, Serialize};

/// One attack event as reported by a single vendor, in the common shape.
///
/// Created by an adapter per raw event and consumed by the aggregation step of
/// the same cycle. Coordinates are optional everywhere: vendors omit them or
/// send values that do not parse.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttackRecord {
    pub attack_name: Option<String>,
    pub attack_type: Option<String>,
    pub attack_count: Option<u64>,
    pub source_country_code: Option<String>,
    pub source_country_name: Option<String>,
    pub source_latitude: Option<f64>,
    pub source_longitude: Option<f64>,
    pub destination_country_code: Option<String>,
    pub destination_country_name: Option<String>,
    pub destination_latitude: Option<f64>,
    pub destination_longitude: Option<f64>,
    /// ISO-8601, vendor supplied or stamped at parse time.
    pub timestamp: String,
}

impl AttackRecord {
    /// Both country codes, when present and non-blank.
    pub fn country_pair(&self) -> Option<(&str, &str)> {
        let src = self.source_country_code.as_deref().filter(|c| !c.trim().is_empty())?;
        let dst = self
            .destination_country_code
            .as_deref()
            .filter(|c| !c.trim().is_empty())?;
        Some((src, dst))
    }

    /// Count contributed to a group: missing or zero counts as one attack.
    pub fn effective_count(&self) -> u64 {
        match self.attack_count {
            Some(n) if n > 0 => n,
            _ => 1,
        }
    }
}

/// All attacks of one cycle between one source and one destination country.
///
/// Names, coordinates and timestamp are taken from the first record that
/// contributed to the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackGroup {
    pub source_country_code: String,
    pub source_country_name: Option<String>,
    pub source_latitude: Option<f64>,
    pub source_longitude: Option<f64>,
    pub destination_country_code: String,
    pub destination_country_name: Option<String>,
    pub destination_latitude: Option<f64>,
    pub destination_longitude: Option<f64>,
    pub attack_count: u64,
    /// Distinct attack types seen for the pair.
    pub attack_types: Vec<String>,
    pub timestamp: String,
}

impl AttackGroup {
    pub fn key(&self) -> (&str, &str) {
        (&self.source_country_code, &self.destination_country_code)
    }
}
