use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use shared::Vehicle;

use crate::storage::traits::VehicleStore;
use crate::storage::{decode_instant, decode_vehicle_type, encode_instant};

#[derive(Clone)]
pub struct VehicleRepository {
    pool: SqlitePool,
}

impl VehicleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_vehicle(row: &SqliteRow) -> Vehicle {
        let vehicle_type_raw: String = row.get("vehicle_type");
        let created_raw: String = row.get("created_at");
        let updated_raw: String = row.get("updated_at");

        Vehicle {
            vehicle_number: row.get("vehicle_number"),
            driver_name: row.get("driver_name"),
            mobile_number: row.get("mobile_number"),
            vehicle_type: decode_vehicle_type(&vehicle_type_raw),
            is_active: row.get::<i64, _>("is_active") != 0,
            created_at: decode_instant(&created_raw),
            updated_at: decode_instant(&updated_raw),
        }
    }
}

#[async_trait]
impl VehicleStore for VehicleRepository {
    async fn store_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO vehicles
                (vehicle_number, driver_name, mobile_number, vehicle_type,
                 is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&vehicle.vehicle_number)
        .bind(&vehicle.driver_name)
        .bind(&vehicle.mobile_number)
        .bind(vehicle.vehicle_type.to_string())
        .bind(vehicle.is_active as i64)
        .bind(encode_instant(vehicle.created_at))
        .bind(encode_instant(vehicle.updated_at))
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store vehicle {}", vehicle.vehicle_number))?;
        Ok(())
    }

    async fn get_vehicle(&self, vehicle_number: &str) -> Result<Option<Vehicle>> {
        let row = sqlx::query("SELECT * FROM vehicles WHERE vehicle_number = ?")
            .bind(vehicle_number)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load vehicle {vehicle_number}"))?;
        Ok(row.as_ref().map(Self::row_to_vehicle))
    }

    async fn list_active_vehicles(&self) -> Result<Vec<Vehicle>> {
        let rows = sqlx::query("SELECT * FROM vehicles WHERE is_active = 1")
            .fetch_all(&self.pool)
            .await
            .context("failed to list vehicles")?;
        Ok(rows.iter().map(Self::row_to_vehicle).collect())
    }

    async fn deactivate_vehicle(&self, vehicle_number: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE vehicles SET is_active = 0, updated_at = ? WHERE vehicle_number = ?",
        )
        .bind(encode_instant(chrono::Utc::now()))
        .bind(vehicle_number)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to deactivate vehicle {vehicle_number}"))?;
        Ok(result.rows_affected() > 0)
    }
}
