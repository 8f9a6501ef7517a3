use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::warn;

use shared::DashboardMetrics;

use crate::storage::traits::{AdvanceStore, Connection, TripStore, VehicleStore};

use super::advance_service::day_bounds;

/// How long metric collection may take before the dashboard gives up and
/// renders zeros.
const METRICS_TIMEOUT: Duration = Duration::from_secs(5);

const RECENT_LIMIT: usize = 5;

/// Today-centric landing-page numbers. Never fails: a slow or broken store
/// yields default (all-zero) metrics.
#[derive(Clone)]
pub struct DashboardService<C: Connection> {
    trips: C::TripRepository,
    advances: C::AdvanceRepository,
    vehicles: C::VehicleRepository,
}

impl<C: Connection> DashboardService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            trips: connection.create_trip_repository(),
            advances: connection.create_advance_repository(),
            vehicles: connection.create_vehicle_repository(),
        }
    }

    pub async fn today_metrics(&self) -> DashboardMetrics {
        match tokio::time::timeout(METRICS_TIMEOUT, self.collect_metrics()).await {
            Ok(Ok(metrics)) => metrics,
            Ok(Err(e)) => {
                warn!("dashboard metric collection failed, showing zeros: {e:#}");
                DashboardMetrics::default()
            }
            Err(_) => {
                warn!(
                    "dashboard metric collection timed out after {METRICS_TIMEOUT:?}, showing zeros"
                );
                DashboardMetrics::default()
            }
        }
    }

    async fn collect_metrics(&self) -> Result<DashboardMetrics> {
        let today = Utc::now().date_naive();
        let (day_start, day_end) = day_bounds(today, today);

        let today_trips = self.trips.trips_by_date_range(today, today).await?;
        let today_advances = self
            .advances
            .advances_created_between(day_start, day_end)
            .await?;
        let active_vehicles = self.vehicles.list_active_vehicles().await?;

        let mut recent_trips = self.trips.list_trips().await?;
        recent_trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_trips.truncate(RECENT_LIMIT);

        let mut recent_advances = self.advances.all_advances().await?;
        recent_advances.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_advances.truncate(RECENT_LIMIT);

        Ok(DashboardMetrics {
            today_trips_count: today_trips.len(),
            today_advances_total: today_advances.iter().map(|a| a.amount).sum(),
            total_vehicles: active_vehicles.len(),
            recent_trips,
            recent_advances,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use shared::{CreateAdvanceRequest, CreateTripRequest, CreateVehicleRequest, VehicleType};

    use super::*;
    use crate::domain::advance_service::AdvanceService;
    use crate::domain::trip_service::TripService;
    use crate::domain::vehicle_service::VehicleService;
    use crate::storage::sqlite::SqliteConnection;

    fn trip_request(vehicle: &str, date: NaiveDate) -> CreateTripRequest {
        CreateTripRequest {
            date,
            vehicle_number: vehicle.to_string(),
            str_number: "STR-1".to_string(),
            villages: vec![],
            quantity: 10.0,
            driver_name: "Ravi".to_string(),
            mobile_number: "9876543210".to_string(),
            vehicle_type: VehicleType::Lorry,
            advance_amount: 0.0,
        }
    }

    #[tokio::test]
    async fn metrics_count_todays_activity() {
        let conn = SqliteConnection::connect_test().await.unwrap();
        let today = Utc::now().date_naive();

        let trips = TripService::new(&conn);
        trips.create_trip(trip_request("KA01AB1234", today)).await.unwrap();
        trips
            .create_trip(trip_request(
                "KA02CD5678",
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            ))
            .await
            .unwrap();

        let advances = AdvanceService::new(&conn);
        advances
            .add_advance(CreateAdvanceRequest {
                vehicle_number: "KA01AB1234".to_string(),
                trip_id: None,
                trip_date: today,
                amount: 300.0,
                note: String::new(),
                kind: None,
            })
            .await
            .unwrap();

        let vehicles = VehicleService::new(&conn);
        vehicles
            .upsert_vehicle(CreateVehicleRequest {
                vehicle_number: "KA01AB1234".to_string(),
                driver_name: "Ravi".to_string(),
                mobile_number: "9876543210".to_string(),
                vehicle_type: VehicleType::Lorry,
            })
            .await
            .unwrap();

        let metrics = DashboardService::new(&conn).today_metrics().await;
        assert_eq!(metrics.today_trips_count, 1);
        assert_eq!(metrics.today_advances_total, 300.0);
        assert_eq!(metrics.total_vehicles, 1);
        assert_eq!(metrics.recent_trips.len(), 2);
        assert_eq!(metrics.recent_advances.len(), 1);
    }

    #[tokio::test]
    async fn recent_lists_are_capped_at_five() {
        let conn = SqliteConnection::connect_test().await.unwrap();
        let today = Utc::now().date_naive();
        let trips = TripService::new(&conn);
        for i in 0..7 {
            trips
                .create_trip(trip_request(&format!("KA0{i}XX000{i}"), today))
                .await
                .unwrap();
        }

        let metrics = DashboardService::new(&conn).today_metrics().await;
        assert_eq!(metrics.recent_trips.len(), 5);
        assert_eq!(metrics.today_trips_count, 7);
    }

    #[tokio::test]
    async fn empty_store_yields_default_metrics() {
        let conn = SqliteConnection::connect_test().await.unwrap();
        let metrics = DashboardService::new(&conn).today_metrics().await;
        assert_eq!(metrics, DashboardMetrics::default());
    }
}
