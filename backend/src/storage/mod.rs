pub mod csv;
pub mod sqlite;
pub mod traits;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use shared::{AdvanceKind, StrStatus, VehicleType};

/// Uniform instant encoding for both backings: fixed-width UTC RFC 3339, so
/// lexicographic comparison matches chronological order.
pub(crate) fn encode_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Lenient decode: malformed stored values coerce to the epoch rather than
/// failing the whole read, matching the coercion rules for amounts.
pub(crate) fn decode_instant(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH)
}

pub(crate) fn encode_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn decode_date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH.date_naive())
}

pub(crate) fn decode_str_status(raw: &str) -> StrStatus {
    if raw == "Received" {
        StrStatus::Received
    } else {
        StrStatus::NotReceived
    }
}

pub(crate) fn decode_vehicle_type(raw: &str) -> VehicleType {
    match raw {
        "tempo" => VehicleType::Tempo,
        "pickup" => VehicleType::Pickup,
        _ => VehicleType::Lorry,
    }
}

/// Orphan advances keep an empty-string trip reference on disk; `None` in the
/// domain model maps to that.
pub(crate) fn encode_trip_ref(trip_id: &Option<String>) -> String {
    trip_id.clone().unwrap_or_default()
}

pub(crate) fn decode_trip_ref(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

pub(crate) fn encode_advance_kind(kind: Option<AdvanceKind>) -> Option<String> {
    kind.map(|kind| match kind {
        AdvanceKind::Initial => "initial".to_string(),
        AdvanceKind::Additional => "additional".to_string(),
    })
}

pub(crate) fn decode_advance_kind(raw: &str) -> Option<AdvanceKind> {
    match raw {
        "initial" => Some(AdvanceKind::Initial),
        "additional" => Some(AdvanceKind::Additional),
        _ => None,
    }
}
