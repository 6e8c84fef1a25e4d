//! Itinerary normalization.
//!
//! Converts a raw, schema-variable flight-search payload into canonical
//! [`Itinerary`] records. The walk is defensive: any entry missing a
//! resolvable price or a departure timestamp on either leg is silently
//! dropped — malformed entries are expected noise from the external source,
//! not errors.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::models::{Itinerary, Leg};

/// The raw itinerary entries of a payload, wherever the provider put them.
/// Known shapes: `data.itineraries` and top-level `itineraries`.
fn entries(payload: &Value) -> &[Value] {
    payload
        .pointer("/data/itineraries")
        .or_else(|| payload.pointer("/itineraries"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Number of raw entries in the payload, normalizable or not.
/// Used by the pipeline to count dropped records.
pub fn raw_count(payload: &Value) -> usize {
    entries(payload).len()
}

/// Normalize a payload into a finite, restartable sequence of itineraries.
/// Each call re-scans the payload; no state is carried between calls.
pub fn normalize<'a>(
    payload: &'a Value,
    currency: &'a str,
) -> impl Iterator<Item = Itinerary> + 'a {
    entries(payload)
        .iter()
        .filter_map(move |raw| normalize_one(raw, currency))
}

fn normalize_one(raw: &Value, currency: &str) -> Option<Itinerary> {
    let price = resolve_price(raw)?;
    if price < 0.0 {
        return None;
    }
    let outbound = normalize_leg(raw.get("outbound")?)?;
    let inbound = normalize_leg(raw.get("inbound")?)?;
    Some(Itinerary {
        price,
        currency: currency.to_string(),
        outbound,
        inbound,
    })
}

/// Price resolution: prefer the explicit EUR-denominated field, else fall
/// back to the generic price field under the assumption it is already in the
/// target currency. Best-effort inherited from the source's data contract,
/// not a currency-conversion guarantee.
fn resolve_price(raw: &Value) -> Option<f64> {
    amount(raw.pointer("/price/priceEur/amount"))
        .or_else(|| amount(raw.pointer("/price/amount")))
}

/// Providers encode amounts as either a JSON number or a decimal string.
fn amount(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn normalize_leg(leg: &Value) -> Option<Leg> {
    let segments = leg.get("sectorSegments").and_then(Value::as_array)?;
    let first = segments.first()?.get("segment")?;
    let last = segments.last()?.get("segment")?;

    let departure_local = parse_local(first.pointer("/source/localTime").and_then(Value::as_str)?)?;
    let arrival_local = last
        .pointer("/destination/localTime")
        .and_then(Value::as_str)
        .and_then(parse_local);

    // Carrier and flight number are best-effort from the first segment.
    let carrier_code = first
        .pointer("/carrier/code")
        .and_then(Value::as_str)
        .map(str::to_string);
    let flight_number = match (&carrier_code, first.get("code").and_then(Value::as_str)) {
        (Some(carrier), Some(code)) => Some(format!("{carrier}{code}")),
        (None, Some(code)) => Some(code.to_string()),
        _ => None,
    };

    Some(Leg {
        departure_local,
        arrival_local,
        carrier_code,
        flight_number,
    })
}

/// Parse an airport-local wall-clock timestamp. The source emits naive ISO
/// strings, occasionally with a trailing `Z`; no timezone conversion happens
/// here or anywhere downstream.
fn parse_local(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leg(dep: &str, arr: &str, carrier: &str, code: &str) -> Value {
        json!({
            "sectorSegments": [{
                "segment": {
                    "source": { "localTime": dep },
                    "destination": { "localTime": arr },
                    "carrier": { "code": carrier, "name": "Transavia" },
                    "code": code,
                }
            }]
        })
    }

    fn payload(itineraries: Vec<Value>) -> Value {
        json!({ "data": { "itineraries": itineraries } })
    }

    #[test]
    fn extracts_full_itinerary() {
        let p = payload(vec![json!({
            "price": { "priceEur": { "amount": "89.99" } },
            "outbound": leg("2024-01-04T17:40:00", "2024-01-04T19:50:00", "HV", "5131"),
            "inbound": leg("2024-01-07T20:10:00", "2024-01-07T22:25:00", "HV", "5136"),
        })]);

        let itins: Vec<Itinerary> = normalize(&p, "EUR").collect();
        assert_eq!(itins.len(), 1);
        let it = &itins[0];
        assert_eq!(it.price, 89.99);
        assert_eq!(it.currency, "EUR");
        assert_eq!(it.outbound.carrier_code.as_deref(), Some("HV"));
        assert_eq!(it.outbound.flight_number.as_deref(), Some("HV5131"));
        assert_eq!(
            it.outbound.departure_local,
            "2024-01-04T17:40:00".parse().unwrap()
        );
        assert_eq!(
            it.inbound.arrival_local,
            Some("2024-01-07T22:25:00".parse().unwrap())
        );
    }

    #[test]
    fn falls_back_to_generic_price_field() {
        let p = payload(vec![json!({
            "price": { "amount": 120.5 },
            "outbound": leg("2024-01-04T17:40:00", "2024-01-04T19:50:00", "HV", "5131"),
            "inbound": leg("2024-01-07T20:10:00", "2024-01-07T22:25:00", "HV", "5136"),
        })]);
        let itins: Vec<Itinerary> = normalize(&p, "EUR").collect();
        assert_eq!(itins.len(), 1);
        assert_eq!(itins[0].price, 120.5);
    }

    #[test]
    fn prefers_eur_field_over_generic() {
        let p = payload(vec![json!({
            "price": { "amount": "999.0", "priceEur": { "amount": "95.50" } },
            "outbound": leg("2024-01-04T17:40:00", "2024-01-04T19:50:00", "HV", "5131"),
            "inbound": leg("2024-01-07T20:10:00", "2024-01-07T22:25:00", "HV", "5136"),
        })]);
        let itins: Vec<Itinerary> = normalize(&p, "EUR").collect();
        assert_eq!(itins[0].price, 95.50);
    }

    #[test]
    fn drops_entry_without_price() {
        let p = payload(vec![json!({
            "outbound": leg("2024-01-04T17:40:00", "2024-01-04T19:50:00", "HV", "5131"),
            "inbound": leg("2024-01-07T20:10:00", "2024-01-07T22:25:00", "HV", "5136"),
        })]);
        assert_eq!(normalize(&p, "EUR").count(), 0);
        assert_eq!(raw_count(&p), 1);
    }

    #[test]
    fn drops_entry_with_missing_leg_departure() {
        let mut broken = leg("2024-01-04T17:40:00", "2024-01-04T19:50:00", "HV", "5131");
        broken["sectorSegments"][0]["segment"]["source"] = json!({});
        let p = payload(vec![json!({
            "price": { "amount": "50.0" },
            "outbound": broken,
            "inbound": leg("2024-01-07T20:10:00", "2024-01-07T22:25:00", "HV", "5136"),
        })]);
        assert_eq!(normalize(&p, "EUR").count(), 0);
    }

    #[test]
    fn drops_negative_price() {
        let p = payload(vec![json!({
            "price": { "amount": "-10.0" },
            "outbound": leg("2024-01-04T17:40:00", "2024-01-04T19:50:00", "HV", "5131"),
            "inbound": leg("2024-01-07T20:10:00", "2024-01-07T22:25:00", "HV", "5136"),
        })]);
        assert_eq!(normalize(&p, "EUR").count(), 0);
    }

    #[test]
    fn carrier_and_flight_are_nullable() {
        let p = payload(vec![json!({
            "price": { "amount": "50.0" },
            "outbound": {
                "sectorSegments": [{
                    "segment": { "source": { "localTime": "2024-01-04T17:40:00" } }
                }]
            },
            "inbound": leg("2024-01-07T20:10:00", "2024-01-07T22:25:00", "HV", "5136"),
        })]);
        let itins: Vec<Itinerary> = normalize(&p, "EUR").collect();
        assert_eq!(itins.len(), 1);
        assert!(itins[0].outbound.carrier_code.is_none());
        assert!(itins[0].outbound.flight_number.is_none());
        assert!(itins[0].outbound.arrival_local.is_none());
    }

    #[test]
    fn handles_top_level_itineraries_array() {
        let p = json!({ "itineraries": [{
            "price": { "amount": "50.0" },
            "outbound": leg("2024-01-04T17:40:00", "2024-01-04T19:50:00", "HV", "5131"),
            "inbound": leg("2024-01-07T20:10:00", "2024-01-07T22:25:00", "HV", "5136"),
        }] });
        assert_eq!(normalize(&p, "EUR").count(), 1);
    }

    #[test]
    fn restartable_rescan_yields_same_records() {
        let p = payload(vec![json!({
            "price": { "amount": "50.0" },
            "outbound": leg("2024-01-04T17:40:00", "2024-01-04T19:50:00", "HV", "5131"),
            "inbound": leg("2024-01-07T20:10:00", "2024-01-07T22:25:00", "HV", "5136"),
        })]);
        let first: Vec<Itinerary> = normalize(&p, "EUR").collect();
        let second: Vec<Itinerary> = normalize(&p, "EUR").collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_or_alien_payload_yields_nothing() {
        assert_eq!(normalize(&json!({}), "EUR").count(), 0);
        assert_eq!(normalize(&json!({"data": {}}), "EUR").count(), 0);
        assert_eq!(normalize(&json!([1, 2, 3]), "EUR").count(), 0);
        assert_eq!(raw_count(&json!(null)), 0);
    }
}
