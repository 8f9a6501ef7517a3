use std::collections::HashMap;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use shared::{Advance, AdvanceKind, CreateAdvanceRequest, Trip, TripAdvanceSummary};

use crate::error::DomainError;
use crate::storage::traits::{AdvanceStore, Connection};

use super::reconciliation::{fallback_summary, reconcile};

/// Advance records: booking, per-trip lookup with orphan recovery, and the
/// reconciled summaries the report and dashboard surfaces consume.
#[derive(Clone)]
pub struct AdvanceService<C: Connection> {
    advances: C::AdvanceRepository,
}

impl<C: Connection> AdvanceService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            advances: connection.create_advance_repository(),
        }
    }

    pub async fn add_advance(&self, request: CreateAdvanceRequest) -> Result<Advance> {
        if request.amount <= 0.0 {
            return Err(DomainError::validation("advance amount must be positive"));
        }
        if request.vehicle_number.trim().is_empty() {
            return Err(DomainError::validation("vehicle number is required"));
        }

        let advance = Advance {
            id: Uuid::new_v4().to_string(),
            vehicle_number: request.vehicle_number.trim().to_string(),
            trip_id: request.trip_id.filter(|id| !id.is_empty()),
            trip_date: request.trip_date,
            amount: request.amount,
            kind: request.kind.or(Some(AdvanceKind::Additional)),
            note: request.note,
            is_settled: false,
            created_at: Utc::now(),
        };
        self.advances.store_advance(&advance).await?;
        Ok(advance)
    }

    /// Advances for one trip, newest first. When the direct query comes back
    /// empty and a vehicle number is known, orphaned records (written before
    /// trip linking) for that vehicle are recovered instead.
    pub async fn advances_for_trip(
        &self,
        trip_id: &str,
        vehicle_number: Option<&str>,
    ) -> Result<Vec<Advance>> {
        if trip_id.is_empty() {
            warn!("advance lookup requested with an empty trip id");
            return Ok(Vec::new());
        }

        let mut advances = self.advances.advances_by_trip(trip_id).await?;
        if advances.is_empty() {
            if let Some(vehicle) = vehicle_number {
                match self.advances.orphaned_advances_by_vehicle(vehicle).await {
                    Ok(orphans) => {
                        if !orphans.is_empty() {
                            info!(
                                "recovered {} orphaned advances for vehicle {vehicle}",
                                orphans.len()
                            );
                        }
                        advances = orphans;
                    }
                    Err(e) => warn!("orphan recovery failed for vehicle {vehicle}: {e:#}"),
                }
            }
        }

        advances.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(advances)
    }

    /// Reconciled summary for one trip. A failed lookup degrades to the
    /// trip-level amounts instead of propagating.
    pub async fn trip_summary(&self, trip: &Trip) -> TripAdvanceSummary {
        match self
            .advances_for_trip(&trip.id, Some(&trip.vehicle_number))
            .await
        {
            Ok(advances) => reconcile(trip, &advances),
            Err(e) => {
                warn!(
                    "advance lookup failed for trip {}, using trip-level amounts: {e:#}",
                    trip.id
                );
                fallback_summary(trip)
            }
        }
    }

    /// Batch summaries keyed by trip id. One trip's failure never aborts the
    /// others.
    pub async fn summaries_for_trips(
        &self,
        trips: &[Trip],
    ) -> HashMap<String, TripAdvanceSummary> {
        let mut summaries = HashMap::with_capacity(trips.len());
        for trip in trips {
            summaries.insert(trip.id.clone(), self.trip_summary(trip).await);
        }
        summaries
    }

    pub async fn all_advances(&self) -> Result<Vec<Advance>> {
        let mut advances = self.advances.all_advances().await?;
        advances.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(advances)
    }

    pub async fn advances_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Advance>> {
        let mut advances = self.advances.advances_by_vehicle(vehicle_number).await?;
        advances.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(advances)
    }

    pub async fn advances_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Advance>> {
        let (start, end) = day_bounds(from, to);
        let mut advances = self.advances.advances_created_between(start, end).await?;
        advances.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(advances)
    }
}

/// Inclusive UTC instant bounds covering the whole days of a date range.
pub(crate) fn day_bounds(
    from: NaiveDate,
    to: NaiveDate,
) -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
    let end_of_day =
        chrono::NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(chrono::NaiveTime::MIN);
    let start = from.and_time(chrono::NaiveTime::MIN).and_utc();
    let end = to.and_time(end_of_day).and_utc();
    (start, end)
}
