use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use shared::{
    Advance, AdvanceKind, CreateTripRequest, SetStrStatusRequest, Trip, UpdateTripRequest,
};

use crate::error::DomainError;
use crate::storage::traits::{AdvanceStore, Connection, TripStore, VillageStore};

/// Trip lifecycle: creation with serial assignment and the linked initial
/// advance record, edits that append top-up advances, status changes.
#[derive(Clone)]
pub struct TripService<C: Connection> {
    trips: C::TripRepository,
    advances: C::AdvanceRepository,
    villages: C::VillageRepository,
}

impl<C: Connection> TripService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            trips: connection.create_trip_repository(),
            advances: connection.create_advance_repository(),
            villages: connection.create_village_repository(),
        }
    }

    /// Next serial number: highest on record plus one. A failed store query
    /// degrades to 1 rather than blocking entry.
    pub async fn next_sl_number(&self) -> u32 {
        match self.trips.max_sl_number().await {
            Ok(max) => max + 1,
            Err(e) => {
                warn!("serial number lookup failed, defaulting to 1: {e:#}");
                1
            }
        }
    }

    pub async fn create_trip(&self, request: CreateTripRequest) -> Result<Trip> {
        if request.vehicle_number.trim().is_empty() {
            return Err(DomainError::validation("vehicle number is required"));
        }
        if request.advance_amount < 0.0 {
            return Err(DomainError::validation("advance amount cannot be negative"));
        }

        let now = Utc::now();
        let trip = Trip {
            id: Uuid::new_v4().to_string(),
            sl_number: self.next_sl_number().await,
            date: request.date,
            vehicle_number: request.vehicle_number.trim().to_string(),
            str_number: request.str_number,
            str_status: Default::default(),
            villages: request.villages,
            quantity: request.quantity,
            driver_name: request.driver_name,
            mobile_number: request.mobile_number,
            vehicle_type: request.vehicle_type,
            advance_amount: request.advance_amount,
            created_at: now,
            updated_at: now,
        };
        self.trips.store_trip(&trip).await?;
        info!("created trip {} (sl {})", trip.id, trip.sl_number);

        self.record_village_usage(&trip.villages).await;

        // The trip-level advance also becomes a tagged record; losing it only
        // costs the tag, reconciliation recovers the amount from the trip.
        if trip.advance_amount > 0.0 {
            let advance = Advance {
                id: Uuid::new_v4().to_string(),
                vehicle_number: trip.vehicle_number.clone(),
                trip_id: Some(trip.id.clone()),
                trip_date: trip.date,
                amount: trip.advance_amount,
                kind: Some(AdvanceKind::Initial),
                note: "Initial advance recorded on the trip entry".to_string(),
                is_settled: false,
                created_at: now,
            };
            if let Err(e) = self.advances.store_advance(&advance).await {
                error!(
                    "failed to record initial advance for trip {}: {e:#}",
                    trip.id
                );
            }
        }

        Ok(trip)
    }

    pub async fn update_trip(&self, trip_id: &str, request: UpdateTripRequest) -> Result<Trip> {
        let mut trip = self
            .trips
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| DomainError::not_found("trip"))?;

        let previous_advance = trip.advance_amount;

        if let Some(date) = request.date {
            trip.date = date;
        }
        if let Some(str_number) = request.str_number {
            trip.str_number = str_number;
        }
        if let Some(villages) = request.villages {
            trip.villages = villages;
        }
        if let Some(quantity) = request.quantity {
            trip.quantity = quantity;
        }
        if let Some(driver_name) = request.driver_name {
            trip.driver_name = driver_name;
        }
        if let Some(mobile_number) = request.mobile_number {
            trip.mobile_number = mobile_number;
        }
        if let Some(vehicle_type) = request.vehicle_type {
            trip.vehicle_type = vehicle_type;
        }
        if let Some(advance_amount) = request.advance_amount {
            if advance_amount < 0.0 {
                return Err(DomainError::validation("advance amount cannot be negative"));
            }
            trip.advance_amount = advance_amount;
        }
        trip.updated_at = Utc::now();
        self.trips.update_trip(&trip).await?;

        // Raising the advance during an edit books the difference as a top-up.
        if trip.advance_amount > previous_advance {
            let difference = trip.advance_amount - previous_advance;
            let advance = Advance {
                id: Uuid::new_v4().to_string(),
                vehicle_number: trip.vehicle_number.clone(),
                trip_id: Some(trip.id.clone()),
                trip_date: trip.date,
                amount: difference,
                kind: Some(AdvanceKind::Additional),
                note: "Additional advance added while editing the trip".to_string(),
                is_settled: false,
                created_at: trip.updated_at,
            };
            if let Err(e) = self.advances.store_advance(&advance).await {
                error!(
                    "failed to record additional advance for trip {}: {e:#}",
                    trip.id
                );
            }
        }

        Ok(trip)
    }

    pub async fn set_str_status(
        &self,
        trip_id: &str,
        request: SetStrStatusRequest,
    ) -> Result<Trip> {
        let mut trip = self
            .trips
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| DomainError::not_found("trip"))?;
        trip.str_status = request.str_status;
        trip.updated_at = Utc::now();
        self.trips.update_trip(&trip).await?;
        Ok(trip)
    }

    pub async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>> {
        self.trips.get_trip(trip_id).await
    }

    pub async fn delete_trip(&self, trip_id: &str) -> Result<bool> {
        self.trips.delete_trip(trip_id).await
    }

    pub async fn list_trips(&self) -> Result<Vec<Trip>> {
        let mut trips = self.trips.list_trips().await?;
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }

    pub async fn trips_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Trip>> {
        let mut trips = self.trips.trips_by_date_range(from, to).await?;
        trips.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(trips)
    }

    pub async fn trips_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Trip>> {
        let mut trips = self.trips.trips_by_vehicle(vehicle_number).await?;
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }

    async fn record_village_usage(&self, names: &[String]) {
        let now = Utc::now();
        for name in names {
            match self.villages.find_village_by_name(name).await {
                Ok(Some(village)) => {
                    if let Err(e) = self.villages.record_usage(&village.id, now).await {
                        warn!("failed to record usage for village {name}: {e:#}");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("village lookup failed for {name}: {e:#}"),
            }
        }
    }
}
