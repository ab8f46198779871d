//! Check Point live threat map events.
//!
//! The stream sends compact keys; this is the mapping onto [`AttackRecord`].

use serde_json::Value;

use super::{count_field, float_field, is_present, text_field};
use crate::lookup::CountryDirectory;
use crate::models::{now_timestamp, AttackRecord};

/// Keys carried by a telemetry event.
pub const CHECKPOINT_FIELDS: [&str; 10] = [
    "a_c", "a_n", "a_t", "d_co", "d_la", "d_lo", "s_co", "s_la", "s_lo", "t",
];

/// Maps one decoded `attack` event. Returns `None` when the event is not an
/// object or carries none of the known keys.
pub fn map_checkpoint_event(
    event: &Value,
    countries: &dyn CountryDirectory,
) -> Option<AttackRecord> {
    let fields = event.as_object()?;
    if !CHECKPOINT_FIELDS
        .iter()
        .any(|key| fields.get(*key).is_some_and(is_present))
    {
        return None;
    }
    let src = text_field(fields.get("s_co"));
    let dst = text_field(fields.get("d_co"));
    Some(AttackRecord {
        attack_count: count_field(fields.get("a_c")),
        attack_name: text_field(fields.get("a_n")),
        attack_type: text_field(fields.get("a_t")),
        source_country_name: src.as_deref().and_then(|c| countries.name(c)),
        source_country_code: src,
        source_latitude: float_field(fields.get("s_la")),
        source_longitude: float_field(fields.get("s_lo")),
        destination_country_name: dst.as_deref().and_then(|c| countries.name(c)),
        destination_country_code: dst,
        destination_latitude: float_field(fields.get("d_la")),
        destination_longitude: float_field(fields.get("d_lo")),
        timestamp: text_field(fields.get("t")).unwrap_or_else(now_timestamp),
    })
}
