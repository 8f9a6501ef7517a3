//! Storage abstraction: one repository trait per entity plus a `Connection`
//! factory trait, so the domain services stay agnostic of which backing
//! (SQLite or CSV files) the startup probe selected.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::{Advance, Trip, Vehicle, Village};

#[async_trait]
pub trait TripStore: Send + Sync {
    async fn store_trip(&self, trip: &Trip) -> Result<()>;
    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>>;
    /// All trips, unordered; callers sort by creation time.
    async fn list_trips(&self) -> Result<Vec<Trip>>;
    /// Trips whose `date` falls within the inclusive range, unordered.
    async fn trips_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Trip>>;
    async fn trips_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Trip>>;
    async fn update_trip(&self, trip: &Trip) -> Result<()>;
    /// Returns false when no trip with that id existed.
    async fn delete_trip(&self, trip_id: &str) -> Result<bool>;
    /// Highest serial number on record, 0 when there are no trips.
    async fn max_sl_number(&self) -> Result<u32>;
}

#[async_trait]
pub trait AdvanceStore: Send + Sync {
    async fn store_advance(&self, advance: &Advance) -> Result<()>;
    /// Advances referencing the given trip, unordered.
    async fn advances_by_trip(&self, trip_id: &str) -> Result<Vec<Advance>>;
    /// Advances with no trip reference whose vehicle number matches; the
    /// recovery path for records written before trips were linked.
    async fn orphaned_advances_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Advance>>;
    async fn advances_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Advance>>;
    async fn all_advances(&self) -> Result<Vec<Advance>>;
    /// Advances created within the inclusive instant range.
    async fn advances_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Advance>>;
}

#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Insert-or-replace keyed by vehicle number.
    async fn store_vehicle(&self, vehicle: &Vehicle) -> Result<()>;
    async fn get_vehicle(&self, vehicle_number: &str) -> Result<Option<Vehicle>>;
    async fn list_active_vehicles(&self) -> Result<Vec<Vehicle>>;
    /// Returns false when no vehicle with that number existed.
    async fn deactivate_vehicle(&self, vehicle_number: &str) -> Result<bool>;
}

#[async_trait]
pub trait VillageStore: Send + Sync {
    async fn store_village(&self, village: &Village) -> Result<()>;
    async fn list_active_villages(&self) -> Result<Vec<Village>>;
    async fn find_village_by_name(&self, name: &str) -> Result<Option<Village>>;
    /// Bump the usage counter and stamp `last_used`; false when the id is
    /// unknown.
    async fn record_usage(&self, village_id: &str, now: DateTime<Utc>) -> Result<bool>;
}

/// Factory trait implemented by each backing. Associated types keep the
/// services monomorphic over a single backing chosen at startup.
pub trait Connection: Clone + Send + Sync + 'static {
    type TripRepository: TripStore + Clone + Send + Sync + 'static;
    type AdvanceRepository: AdvanceStore + Clone + Send + Sync + 'static;
    type VehicleRepository: VehicleStore + Clone + Send + Sync + 'static;
    type VillageRepository: VillageStore + Clone + Send + Sync + 'static;

    fn create_trip_repository(&self) -> Self::TripRepository;
    fn create_advance_repository(&self) -> Self::AdvanceRepository;
    fn create_vehicle_repository(&self) -> Self::VehicleRepository;
    fn create_village_repository(&self) -> Self::VillageRepository;
}
