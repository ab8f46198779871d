//! Radware live threat map.
//!
//! Payload: a list of lists of `{type, sourceCountry, destinationCountry,
//! attackTime}`. There are no counts and no coordinates, so both ends are
//! placed on their country centroid.

use log::{debug, error};
use serde_json::Value;

use super::{text_field, Parsed};
use crate::error_handling::EventKind;
use crate::fetch::RetryingFetcher;
use crate::lookup::CountryDirectory;
use crate::models::{now_timestamp, AttackRecord};

pub fn parse_radware(payload: &Value, countries: &dyn CountryDirectory) -> Parsed<AttackRecord> {
    let mut parsed = Parsed::default();
    let Some(groups) = payload.as_array() else {
        debug!("radware: payload is not a list");
        parsed.skip();
        return parsed;
    };

    for group in groups {
        let Some(attacks) = group.as_array() else {
            debug!("radware: skipping non-list attack group: {}", group);
            parsed.skip();
            continue;
        };
        for attack in attacks {
            let Some(attack) = attack.as_object() else {
                debug!("radware: skipping non-dict attack: {}", attack);
                parsed.skip();
                continue;
            };
            let kind = text_field(attack.get("type"));
            let src = text_field(attack.get("sourceCountry"));
            let dst = text_field(attack.get("destinationCountry"));
            let src_centroid = src.as_deref().and_then(|c| countries.centroid(c));
            let dst_centroid = dst.as_deref().and_then(|c| countries.centroid(c));
            parsed.items.push(AttackRecord {
                attack_name: kind.clone(),
                attack_type: kind,
                attack_count: None,
                source_country_name: src.as_deref().and_then(|c| countries.name(c)),
                source_country_code: src,
                source_latitude: src_centroid.map(|(lat, _)| lat),
                source_longitude: src_centroid.map(|(_, lon)| lon),
                destination_country_name: dst.as_deref().and_then(|c| countries.name(c)),
                destination_country_code: dst,
                destination_latitude: dst_centroid.map(|(lat, _)| lat),
                destination_longitude: dst_centroid.map(|(_, lon)| lon),
                timestamp: text_field(attack.get("attackTime")).unwrap_or_else(now_timestamp),
            });
        }
    }
    parsed
}

pub async fn fetch_radware(
    fetcher: &RetryingFetcher,
    url: &str,
    countries: &dyn CountryDirectory,
) -> Vec<AttackRecord> {
    let Some(payload) = fetcher.fetch_json(url, &[], &[]).await else {
        error!("{}: failed to retrieve data", fetcher.label());
        return Vec::new();
    };
    let parsed = parse_radware(&payload, countries);
    fetcher.stats().add(EventKind::MalformedItem, parsed.malformed);
    debug!(
        "{}: collected {} entries ({} malformed)",
        fetcher.label(),
        parsed.items.len(),
        parsed.malformed
    );
    parsed.items
}
