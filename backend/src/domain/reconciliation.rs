//! Reconciles a trip's legacy `advance_amount` field with its advance
//! records. The single source of per-trip totals; advance, report and
//! dashboard paths all come through here.

use shared::{Advance, AdvanceKind, Trip, TripAdvanceSummary};

use super::advance_totals::advance_totals;

/// Deterministic id for the synthesized initial advance, stable across
/// recomputation so repeated reconciliations agree.
pub fn synthetic_initial_id(trip_id: &str) -> String {
    format!("initial-{trip_id}")
}

/// Build the reconciled advance picture for one trip.
///
/// When the trip carries a legacy `advance_amount` but no record classifies as
/// Initial, a virtual initial advance is synthesized from the trip fields. A
/// real initial record suppresses synthesis, so the amount is never counted
/// twice.
pub fn reconcile(trip: &Trip, advances: &[Advance]) -> TripAdvanceSummary {
    let breakdown = advance_totals(advances);

    let mut initial_advances = breakdown.initial_advances;
    let mut initial_total = breakdown.initial;

    if trip.advance_amount > 0.0 && initial_total == 0.0 {
        let synthetic = Advance {
            id: synthetic_initial_id(&trip.id),
            vehicle_number: trip.vehicle_number.clone(),
            trip_id: Some(trip.id.clone()),
            trip_date: trip.date,
            amount: trip.advance_amount,
            kind: Some(AdvanceKind::Initial),
            note: "Initial advance recorded on the trip entry".to_string(),
            is_settled: false,
            created_at: trip.created_at,
        };
        initial_total = synthetic.amount;
        initial_advances.push(synthetic);
    }

    TripAdvanceSummary {
        trip_id: trip.id.clone(),
        initial_total,
        additional_total: breakdown.additional,
        grand_total: initial_total + breakdown.additional,
        record_count: breakdown.count,
        initial_count: initial_advances.len(),
        additional_count: breakdown.additional_count,
        initial_advances,
        additional_advances: breakdown.additional_advances,
    }
}

/// Summary used when the advance lookup for a trip failed: reconcile against
/// an empty list so the trip-level amount still surfaces.
pub fn fallback_summary(trip: &Trip) -> TripAdvanceSummary {
    reconcile(trip, &[])
}
