//! Pure aggregation of a trip's advance records into initial/additional
//! buckets and totals. No I/O; callers fetch, this computes.

use shared::{Advance, AdvanceKind};

/// Normalized category of an advance record. Legacy records written before the
/// kind tag existed are classified by whether they reference a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceClass {
    Initial,
    Additional,
    /// Neither tagged nor linked to a trip. Excluded from both buckets but
    /// still counted in `AdvanceBreakdown::count`.
    Unclassified,
}

impl AdvanceClass {
    pub fn of(advance: &Advance) -> Self {
        match advance.kind {
            Some(AdvanceKind::Initial) => AdvanceClass::Initial,
            Some(AdvanceKind::Additional) => AdvanceClass::Additional,
            None if advance.trip_id.as_deref().is_some_and(|id| !id.is_empty()) => {
                AdvanceClass::Additional
            }
            None => AdvanceClass::Unclassified,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceBreakdown {
    /// Initial records in input order.
    pub initial_advances: Vec<Advance>,
    /// Additional records in input order.
    pub additional_advances: Vec<Advance>,
    pub initial: f64,
    pub additional: f64,
    pub total: f64,
    /// Counts every input record, including unclassified ones that land in
    /// neither bucket. Historical totals depend on this, so it stays.
    pub count: usize,
    pub initial_count: usize,
    pub additional_count: usize,
}

/// Categorize and sum a trip's advances. Deterministic over the input slice;
/// order within each bucket follows input order.
pub fn advance_totals(advances: &[Advance]) -> AdvanceBreakdown {
    let mut breakdown = AdvanceBreakdown {
        count: advances.len(),
        ..AdvanceBreakdown::default()
    };

    for advance in advances {
        match AdvanceClass::of(advance) {
            AdvanceClass::Initial => {
                breakdown.initial += advance.amount;
                breakdown.initial_advances.push(advance.clone());
            }
            AdvanceClass::Additional => {
                breakdown.additional += advance.amount;
                breakdown.additional_advances.push(advance.clone());
            }
            AdvanceClass::Unclassified => {}
        }
    }

    breakdown.initial_count = breakdown.initial_advances.len();
    breakdown.additional_count = breakdown.additional_advances.len();
    breakdown.total = breakdown.initial + breakdown.additional;
    breakdown
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use shared::AdvanceKind;

    use super::*;

    fn advance(id: &str, amount: f64, kind: Option<AdvanceKind>, trip_id: Option<&str>) -> Advance {
        Advance {
            id: id.to_string(),
            vehicle_number: "KA01AB1234".to_string(),
            trip_id: trip_id.map(str::to_string),
            trip_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            amount,
            kind,
            note: String::new(),
            is_settled: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_input_yields_zeroed_breakdown() {
        let breakdown = advance_totals(&[]);
        assert_eq!(breakdown, AdvanceBreakdown::default());
    }

    #[test]
    fn initial_plus_two_additional() {
        let advances = vec![
            advance("a", 1000.0, Some(AdvanceKind::Initial), Some("trip-1")),
            advance("b", 200.0, Some(AdvanceKind::Additional), Some("trip-1")),
            advance("c", 150.0, Some(AdvanceKind::Additional), Some("trip-1")),
        ];
        let breakdown = advance_totals(&advances);
        assert_eq!(breakdown.initial, 1000.0);
        assert_eq!(breakdown.additional, 350.0);
        assert_eq!(breakdown.total, 1350.0);
        assert_eq!(breakdown.count, 3);
        assert_eq!(breakdown.initial_count, 1);
        assert_eq!(breakdown.additional_count, 2);
    }

    #[test]
    fn untagged_with_trip_reference_counts_as_additional() {
        let advances = vec![advance("a", 300.0, None, Some("trip-1"))];
        let breakdown = advance_totals(&advances);
        assert_eq!(breakdown.additional, 300.0);
        assert_eq!(breakdown.additional_count, 1);
        assert_eq!(breakdown.initial, 0.0);
    }

    #[test]
    fn untagged_orphan_is_counted_but_lands_in_no_bucket() {
        let advances = vec![
            advance("a", 500.0, Some(AdvanceKind::Initial), Some("trip-1")),
            advance("b", 75.0, None, None),
        ];
        let breakdown = advance_totals(&advances);
        assert_eq!(breakdown.count, 2);
        assert_eq!(breakdown.initial_count, 1);
        assert_eq!(breakdown.additional_count, 0);
        assert_eq!(breakdown.total, 500.0);
        assert!(breakdown.additional_advances.is_empty());
    }

    #[test]
    fn total_is_sum_of_bucket_totals() {
        let advances = vec![
            advance("a", 100.0, Some(AdvanceKind::Initial), Some("trip-1")),
            advance("b", 40.0, Some(AdvanceKind::Additional), Some("trip-1")),
            advance("c", 60.0, None, Some("trip-1")),
            advance("d", 10.0, None, None),
        ];
        let breakdown = advance_totals(&advances);
        assert_eq!(breakdown.total, breakdown.initial + breakdown.additional);
        assert_eq!(breakdown.total, 200.0);
    }

    #[test]
    fn bucket_order_follows_input_order() {
        let advances = vec![
            advance("first", 10.0, Some(AdvanceKind::Additional), Some("t")),
            advance("second", 20.0, Some(AdvanceKind::Additional), Some("t")),
        ];
        let breakdown = advance_totals(&advances);
        let ids: Vec<&str> = breakdown
            .additional_advances
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn input_is_not_mutated() {
        let advances = vec![advance("a", 10.0, Some(AdvanceKind::Initial), Some("t"))];
        let before = advances.clone();
        let _ = advance_totals(&advances);
        assert_eq!(advances, before);
    }

    #[test]
    fn empty_trip_reference_is_unclassified() {
        let advances = vec![advance("a", 25.0, None, Some(""))];
        let breakdown = advance_totals(&advances);
        assert_eq!(breakdown.count, 1);
        assert_eq!(breakdown.additional_count, 0);
        assert_eq!(breakdown.total, 0.0);
    }
}
