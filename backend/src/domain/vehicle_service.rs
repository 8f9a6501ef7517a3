use anyhow::Result;
use chrono::Utc;

use shared::{CreateVehicleRequest, UpdateVehicleRequest, Vehicle};

use crate::error::DomainError;
use crate::storage::traits::{Connection, VehicleStore};

/// Vehicle reference data, keyed by registration number with soft delete.
#[derive(Clone)]
pub struct VehicleService<C: Connection> {
    vehicles: C::VehicleRepository,
}

impl<C: Connection> VehicleService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            vehicles: connection.create_vehicle_repository(),
        }
    }

    /// Register a vehicle or refresh an existing one. Re-registering a
    /// deactivated number reactivates it with its original creation time.
    pub async fn upsert_vehicle(&self, request: CreateVehicleRequest) -> Result<Vehicle> {
        let vehicle_number = request.vehicle_number.trim().to_string();
        if vehicle_number.is_empty() {
            return Err(DomainError::validation("vehicle number is required"));
        }

        let now = Utc::now();
        let created_at = match self.vehicles.get_vehicle(&vehicle_number).await? {
            Some(existing) => existing.created_at,
            None => now,
        };
        let vehicle = Vehicle {
            vehicle_number,
            driver_name: request.driver_name,
            mobile_number: request.mobile_number,
            vehicle_type: request.vehicle_type,
            is_active: true,
            created_at,
            updated_at: now,
        };
        self.vehicles.store_vehicle(&vehicle).await?;
        Ok(vehicle)
    }

    pub async fn update_vehicle(
        &self,
        vehicle_number: &str,
        request: UpdateVehicleRequest,
    ) -> Result<Vehicle> {
        let mut vehicle = self
            .vehicles
            .get_vehicle(vehicle_number)
            .await?
            .ok_or_else(|| DomainError::not_found("vehicle"))?;

        if let Some(driver_name) = request.driver_name {
            vehicle.driver_name = driver_name;
        }
        if let Some(mobile_number) = request.mobile_number {
            vehicle.mobile_number = mobile_number;
        }
        if let Some(vehicle_type) = request.vehicle_type {
            vehicle.vehicle_type = vehicle_type;
        }
        vehicle.updated_at = Utc::now();
        self.vehicles.store_vehicle(&vehicle).await?;
        Ok(vehicle)
    }

    pub async fn get_vehicle(&self, vehicle_number: &str) -> Result<Option<Vehicle>> {
        self.vehicles.get_vehicle(vehicle_number).await
    }

    /// Active vehicles, newest registrations first.
    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        let mut vehicles = self.vehicles.list_active_vehicles().await?;
        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vehicles)
    }

    pub async fn deactivate_vehicle(&self, vehicle_number: &str) -> Result<bool> {
        self.vehicles.deactivate_vehicle(vehicle_number).await
    }
}

#[cfg(test)]
mod tests {
    use shared::VehicleType;

    use super::*;
    use crate::storage::sqlite::SqliteConnection;

    fn request(number: &str, driver: &str) -> CreateVehicleRequest {
        CreateVehicleRequest {
            vehicle_number: number.to_string(),
            driver_name: driver.to_string(),
            mobile_number: "9876543210".to_string(),
            vehicle_type: VehicleType::Lorry,
        }
    }

    #[tokio::test]
    async fn upsert_registers_and_refreshes() {
        let conn = SqliteConnection::connect_test().await.unwrap();
        let service = VehicleService::new(&conn);

        let first = service.upsert_vehicle(request("KA01AB1234", "Ravi")).await.unwrap();
        let second = service
            .upsert_vehicle(request("KA01AB1234", "Suresh"))
            .await
            .unwrap();

        assert_eq!(second.driver_name, "Suresh");
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(service.list_vehicles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_reactivates_a_deactivated_vehicle() {
        let conn = SqliteConnection::connect_test().await.unwrap();
        let service = VehicleService::new(&conn);

        service.upsert_vehicle(request("KA01AB1234", "Ravi")).await.unwrap();
        assert!(service.deactivate_vehicle("KA01AB1234").await.unwrap());
        assert!(service.list_vehicles().await.unwrap().is_empty());

        service.upsert_vehicle(request("KA01AB1234", "Ravi")).await.unwrap();
        assert_eq!(service.list_vehicles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_patches_only_provided_fields() {
        let conn = SqliteConnection::connect_test().await.unwrap();
        let service = VehicleService::new(&conn);

        service.upsert_vehicle(request("KA01AB1234", "Ravi")).await.unwrap();
        let updated = service
            .update_vehicle(
                "KA01AB1234",
                UpdateVehicleRequest {
                    mobile_number: Some("9000000000".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.mobile_number, "9000000000");
        assert_eq!(updated.driver_name, "Ravi");
    }

    #[tokio::test]
    async fn update_of_unknown_vehicle_fails() {
        let conn = SqliteConnection::connect_test().await.unwrap();
        let service = VehicleService::new(&conn);
        let result = service
            .update_vehicle("missing", UpdateVehicleRequest::default())
            .await;
        assert!(result.is_err());
    }
}
