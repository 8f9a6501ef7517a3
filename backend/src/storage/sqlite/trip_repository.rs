use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use shared::Trip;

use crate::storage::traits::TripStore;
use crate::storage::{
    decode_date, decode_instant, decode_str_status, decode_vehicle_type, encode_date,
    encode_instant,
};

#[derive(Clone)]
pub struct TripRepository {
    pool: SqlitePool,
}

impl TripRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_trip(row: &SqliteRow) -> Trip {
        let villages_raw: String = row.get("villages");
        let date_raw: String = row.get("date");
        let status_raw: String = row.get("str_status");
        let vehicle_type_raw: String = row.get("vehicle_type");
        let created_raw: String = row.get("created_at");
        let updated_raw: String = row.get("updated_at");

        Trip {
            id: row.get("id"),
            sl_number: row.get::<i64, _>("sl_number").max(0) as u32,
            date: decode_date(&date_raw),
            vehicle_number: row.get("vehicle_number"),
            str_number: row.get("str_number"),
            str_status: decode_str_status(&status_raw),
            villages: serde_json::from_str(&villages_raw).unwrap_or_default(),
            quantity: row.get("quantity"),
            driver_name: row.get("driver_name"),
            mobile_number: row.get("mobile_number"),
            vehicle_type: decode_vehicle_type(&vehicle_type_raw),
            advance_amount: row.get("advance_amount"),
            created_at: decode_instant(&created_raw),
            updated_at: decode_instant(&updated_raw),
        }
    }

    fn bind_fields(trip: &Trip) -> Result<(String, String, String, String, String)> {
        let villages =
            serde_json::to_string(&trip.villages).context("failed to encode village list")?;
        Ok((
            encode_date(trip.date),
            trip.str_status.to_string(),
            villages,
            encode_instant(trip.created_at),
            encode_instant(trip.updated_at),
        ))
    }
}

#[async_trait]
impl TripStore for TripRepository {
    async fn store_trip(&self, trip: &Trip) -> Result<()> {
        let (date, status, villages, created_at, updated_at) = Self::bind_fields(trip)?;
        sqlx::query(
            r#"
            INSERT INTO trips
                (id, sl_number, date, vehicle_number, str_number, str_status, villages,
                 quantity, driver_name, mobile_number, vehicle_type, advance_amount,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&trip.id)
        .bind(trip.sl_number as i64)
        .bind(date)
        .bind(&trip.vehicle_number)
        .bind(&trip.str_number)
        .bind(status)
        .bind(villages)
        .bind(trip.quantity)
        .bind(&trip.driver_name)
        .bind(&trip.mobile_number)
        .bind(trip.vehicle_type.to_string())
        .bind(trip.advance_amount)
        .bind(created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store trip {}", trip.id))?;
        Ok(())
    }

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>> {
        let row = sqlx::query("SELECT * FROM trips WHERE id = ?")
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load trip {trip_id}"))?;
        Ok(row.as_ref().map(Self::row_to_trip))
    }

    async fn list_trips(&self) -> Result<Vec<Trip>> {
        let rows = sqlx::query("SELECT * FROM trips")
            .fetch_all(&self.pool)
            .await
            .context("failed to list trips")?;
        Ok(rows.iter().map(Self::row_to_trip).collect())
    }

    async fn trips_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Trip>> {
        let rows = sqlx::query("SELECT * FROM trips WHERE date >= ? AND date <= ?")
            .bind(encode_date(from))
            .bind(encode_date(to))
            .fetch_all(&self.pool)
            .await
            .context("failed to query trips by date range")?;
        Ok(rows.iter().map(Self::row_to_trip).collect())
    }

    async fn trips_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Trip>> {
        let rows = sqlx::query("SELECT * FROM trips WHERE vehicle_number = ?")
            .bind(vehicle_number)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to query trips for vehicle {vehicle_number}"))?;
        Ok(rows.iter().map(Self::row_to_trip).collect())
    }

    async fn update_trip(&self, trip: &Trip) -> Result<()> {
        let (date, status, villages, _, updated_at) = Self::bind_fields(trip)?;
        sqlx::query(
            r#"
            UPDATE trips SET
                sl_number = ?, date = ?, vehicle_number = ?, str_number = ?,
                str_status = ?, villages = ?, quantity = ?, driver_name = ?,
                mobile_number = ?, vehicle_type = ?, advance_amount = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(trip.sl_number as i64)
        .bind(date)
        .bind(&trip.vehicle_number)
        .bind(&trip.str_number)
        .bind(status)
        .bind(villages)
        .bind(trip.quantity)
        .bind(&trip.driver_name)
        .bind(&trip.mobile_number)
        .bind(trip.vehicle_type.to_string())
        .bind(trip.advance_amount)
        .bind(updated_at)
        .bind(&trip.id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update trip {}", trip.id))?;
        Ok(())
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM trips WHERE id = ?")
            .bind(trip_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete trip {trip_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn max_sl_number(&self) -> Result<u32> {
        let row = sqlx::query("SELECT COALESCE(MAX(sl_number), 0) AS max_sl FROM trips")
            .fetch_one(&self.pool)
            .await
            .context("failed to read max serial number")?;
        Ok(row.get::<i64, _>("max_sl").max(0) as u32)
    }
}
