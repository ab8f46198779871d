//! Fortiguard outbreak map.
//!
//! Payload: `{"ips": {"<bucket>": [{count, vuln_name, vuln_type, src_country,
//! src_lat, src_long, dest_country, dest_lat, dest_long, timestamp}, ...]}}`.

use log::{debug, error};
use reqwest::header::{self, HeaderName};
use serde_json::Value;

use super::{count_field, float_field, text_field, Parsed};
use crate::config::{ACCEPT_JSON, ACCEPT_LANGUAGE, FORTIGUARD_REFERER, USER_AGENTS};
use crate::error_handling::EventKind;
use crate::fetch::RetryingFetcher;
use crate::lookup::CountryDirectory;
use crate::models::{now_timestamp, AttackRecord};

/// Fortiguard rejects rotating identities, so it always sees the first one.
const PINNED_USER_AGENT: &str = USER_AGENTS[0];

pub fn parse_fortiguard(payload: &Value, countries: &dyn CountryDirectory) -> Parsed<AttackRecord> {
    let mut parsed = Parsed::default();
    let Some(ips) = payload.get("ips") else {
        return parsed;
    };
    let Some(buckets) = ips.as_object() else {
        debug!("fortiguard: 'ips' is not an object");
        parsed.skip();
        return parsed;
    };

    for (bucket, attacks) in buckets {
        let Some(attacks) = attacks.as_array() else {
            debug!("fortiguard: skipping non-list bucket {}", bucket);
            parsed.skip();
            continue;
        };
        for attack in attacks {
            let Some(attack) = attack.as_object() else {
                debug!("fortiguard: skipping non-object attack in bucket {}", bucket);
                parsed.skip();
                continue;
            };
            let src = text_field(attack.get("src_country"));
            let dst = text_field(attack.get("dest_country"));
            parsed.items.push(AttackRecord {
                attack_name: text_field(attack.get("vuln_name")),
                attack_type: text_field(attack.get("vuln_type")),
                attack_count: count_field(attack.get("count")),
                source_country_name: src.as_deref().and_then(|c| countries.name(c)),
                source_country_code: src,
                source_latitude: float_field(attack.get("src_lat")),
                source_longitude: float_field(attack.get("src_long")),
                destination_country_name: dst.as_deref().and_then(|c| countries.name(c)),
                destination_country_code: dst,
                destination_latitude: float_field(attack.get("dest_lat")),
                destination_longitude: float_field(attack.get("dest_long")),
                timestamp: text_field(attack.get("timestamp")).unwrap_or_else(now_timestamp),
            });
        }
    }
    parsed
}

pub async fn fetch_fortiguard(
    fetcher: &RetryingFetcher,
    url: &str,
    countries: &dyn CountryDirectory,
) -> Vec<AttackRecord> {
    let headers: [(HeaderName, &str); 4] = [
        (header::ACCEPT, ACCEPT_JSON),
        (header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE),
        (header::REFERER, FORTIGUARD_REFERER),
        (header::USER_AGENT, PINNED_USER_AGENT),
    ];
    let Some(payload) = fetcher
        .fetch_json(url, &[("outbreak_id", "0")], &headers)
        .await
    else {
        error!("{}: failed to retrieve data", fetcher.label());
        return Vec::new();
    };
    let parsed = parse_fortiguard(&payload, countries);
    fetcher.stats().add(EventKind::MalformedItem, parsed.malformed);
    debug!(
        "{}: collected {} entries ({} malformed)",
        fetcher.label(),
        parsed.items.len(),
        parsed.malformed
    );
    parsed.items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::CountryTable;
    use serde_json::json;

    #[test]
    fn test_parse_fortiguard_maps_fields() {
        let countries = CountryTable::builtin().unwrap();
        let payload = json!({
            "ips": {
                "1704067200": [{
                    "count": 4,
                    "vuln_name": "Apache.Log4j.Error.Log.Remote.Code.Execution",
                    "vuln_type": "RCE",
                    "src_country": "CN",
                    "src_lat": 31.2,
                    "src_long": "121.4",
                    "dest_country": "US",
                    "dest_lat": 40.7,
                    "dest_long": -74.0,
                    "timestamp": "2024-01-01T00:00:00"
                }]
            }
        });
        let parsed = parse_fortiguard(&payload, &countries);
        assert_eq!(parsed.malformed, 0);
        assert_eq!(parsed.items.len(), 1);
        let rec = &parsed.items[0];
        assert_eq!(rec.attack_count, Some(4));
        assert_eq!(rec.attack_type.as_deref(), Some("RCE"));
        assert_eq!(rec.source_country_code.as_deref(), Some("CN"));
        assert_eq!(rec.source_country_name.as_deref(), Some("China"));
        assert_eq!(rec.source_longitude, Some(121.4));
        assert_eq!(rec.destination_country_name.as_deref(), Some("United States"));
        assert_eq!(rec.timestamp, "2024-01-01T00:00:00");
    }

    #[test]
    fn test_parse_fortiguard_skips_malformed_members() {
        let countries = CountryTable::builtin().unwrap();
        let payload = json!({
            "ips": {
                "a": "not a list",
                "b": [42, {"vuln_name": "X", "src_country": "FR", "dest_country": null}]
            }
        });
        let parsed = parse_fortiguard(&payload, &countries);
        assert_eq!(parsed.malformed, 2);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].destination_country_code, None);
        assert!(!parsed.items[0].timestamp.is_empty(), "timestamp falls back to now");
    }

    #[test]
    fn test_parse_fortiguard_without_ips() {
        let countries = CountryTable::builtin().unwrap();
        let parsed = parse_fortiguard(&json!({"other": 1}), &countries);
        assert!(parsed.items.is_empty());
        assert_eq!(parsed.malformed, 0);

        let parsed = parse_fortiguard(&json!({"ips": []}), &countries);
        assert_eq!(parsed.malformed, 1);
    }
}
