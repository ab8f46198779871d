//! IP-reputation lists.
//!
//! Each list is reduced to a sorted set of syntactically valid addresses, then
//! every address is placed with the IP locator.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::LazyLock;

use log::{debug, error};
use regex::Regex;
use serde_json::Value;

use super::{IpSource, Parsed};
use crate::config::SourceEndpoints;
use crate::error_handling::EventKind;
use crate::fetch::RetryingFetcher;
use crate::lookup::{compile_regex_unsafe, IpLocator};
use crate::models::{IpKind, MaliciousIpRecord};

const IPV4_CANDIDATE_PATTERN: &str = r"\b(?:\d{1,3}\.){3}\d{1,3}\b";
const FRAUDGUARD_DATA_PATTERN: &str = r"(?s)const threatData = (\[.*?\]);";

static IPV4_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(IPV4_CANDIDATE_PATTERN, "IPV4_CANDIDATE"));
static FRAUDGUARD_DATA: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(FRAUDGUARD_DATA_PATTERN, "FRAUDGUARD_DATA"));

fn is_valid_ip(candidate: &str) -> bool {
    candidate.parse::<IpAddr>().is_ok()
}

/// Folds candidate strings into a sorted set, counting the invalid ones.
fn collect_valid<'a>(candidates: impl IntoIterator<Item = &'a str>) -> Parsed<String> {
    let mut valid = BTreeSet::new();
    let mut parsed = Parsed::default();
    for candidate in candidates {
        if is_valid_ip(candidate) {
            valid.insert(candidate.to_string());
        } else {
            debug!("dropping invalid IP token '{}'", candidate);
            parsed.skip();
        }
    }
    parsed.items = valid.into_iter().collect();
    parsed
}

/// AlienVault reputation export: IPv4 literals scattered through `#`-separated
/// lines. Every dotted quad is a candidate.
pub fn parse_alienvault(text: &str) -> Parsed<String> {
    collect_valid(IPV4_CANDIDATE.find_iter(text).map(|m| m.as_str()))
}

/// Binary Defense banlist: one address per line, `#` comments.
pub fn parse_banlist(text: &str) -> Parsed<String> {
    collect_valid(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#')),
    )
}

/// FraudGuard landing page: a JSON array assigned to `threatData` inside an
/// inline script.
pub fn parse_fraudguard(page: &str) -> Parsed<String> {
    let mut parsed = Parsed::default();
    let Some(array) = FRAUDGUARD_DATA.captures(page).and_then(|c| c.get(1)) else {
        debug!("fraudguard: threatData not found in page");
        parsed.skip();
        return parsed;
    };
    let attacks: Vec<Value> = match serde_json::from_str(array.as_str()) {
        Ok(attacks) => attacks,
        Err(e) => {
            debug!("fraudguard: threatData is not valid JSON: {}", e);
            parsed.skip();
            return parsed;
        }
    };
    let mut malformed = 0;
    let candidates: Vec<&str> = attacks
        .iter()
        .filter_map(|attack| {
            let ip = attack.get("ip").and_then(Value::as_str);
            if ip.is_none() {
                malformed += 1;
            }
            ip
        })
        .collect();
    let mut parsed = collect_valid(candidates);
    parsed.malformed += malformed;
    parsed
}

/// Talos top senders: `{"spam": [{"ip": ...}, ...]}`.
pub fn parse_talos(payload: &Value) -> Parsed<String> {
    let Some(entries) = payload.get("spam").and_then(Value::as_array) else {
        return Parsed::default();
    };
    let mut malformed = 0;
    let candidates: Vec<&str> = entries
        .iter()
        .filter_map(|entry| {
            let ip = entry.get("ip").and_then(Value::as_str);
            if ip.is_none() {
                malformed += 1;
            }
            ip
        })
        .collect();
    let mut parsed = collect_valid(candidates);
    parsed.malformed += malformed;
    parsed
}

/// Attaches coordinates and a kind to each address.
pub fn locate_ips(ips: Vec<String>, kind: IpKind, locator: &dyn IpLocator) -> Vec<MaliciousIpRecord> {
    ips.into_iter()
        .map(|ip| {
            let coords = ip.parse().ok().and_then(|addr| locator.locate(addr));
            MaliciousIpRecord {
                latitude: coords.map(|(lat, _)| lat),
                longitude: coords.map(|(_, lon)| lon),
                ip,
                kind,
            }
        })
        .collect()
}

/// Fetches and parses one reputation list.
pub async fn fetch_ip_source(
    source: IpSource,
    fetcher: &RetryingFetcher,
    endpoints: &SourceEndpoints,
    locator: &dyn IpLocator,
) -> Vec<MaliciousIpRecord> {
    let fetcher = fetcher.labeled(source.as_str());
    let parsed = match source {
        IpSource::AlienVault => fetcher
            .fetch_text(&endpoints.alienvault, &[], &[])
            .await
            .map(|text| parse_alienvault(&text)),
        IpSource::BdBanlist => fetcher
            .fetch_text(&endpoints.bd_banlist, &[], &[])
            .await
            .map(|text| parse_banlist(&text)),
        IpSource::FraudGuard => fetcher
            .fetch_text(&endpoints.fraudguard, &[], &[])
            .await
            .map(|page| parse_fraudguard(&page)),
        IpSource::Talos => fetcher
            .fetch_json(&endpoints.talos, &[], &[])
            .await
            .map(|payload| parse_talos(&payload)),
    };
    let Some(parsed) = parsed else {
        error!("{}: failed to retrieve data", source);
        return Vec::new();
    };
    fetcher.stats().add(EventKind::InvalidIp, parsed.malformed);
    debug!(
        "{}: {} addresses ({} dropped)",
        source,
        parsed.items.len(),
        parsed.malformed
    );
    locate_ips(parsed.items, source.kind(), locator)
}
