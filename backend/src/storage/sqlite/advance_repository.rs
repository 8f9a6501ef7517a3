use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use shared::Advance;

use crate::storage::traits::AdvanceStore;
use crate::storage::{
    decode_advance_kind, decode_date, decode_instant, decode_trip_ref, encode_advance_kind,
    encode_date, encode_instant, encode_trip_ref,
};

#[derive(Clone)]
pub struct AdvanceRepository {
    pool: SqlitePool,
}

impl AdvanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_advance(row: &SqliteRow) -> Advance {
        let trip_id_raw: String = row.get("trip_id");
        let trip_date_raw: String = row.get("trip_date");
        let kind_raw: Option<String> = row.get("kind");
        let created_raw: String = row.get("created_at");

        Advance {
            id: row.get("id"),
            vehicle_number: row.get("vehicle_number"),
            trip_id: decode_trip_ref(&trip_id_raw),
            trip_date: decode_date(&trip_date_raw),
            amount: row.get("amount"),
            kind: kind_raw.as_deref().and_then(decode_advance_kind),
            note: row.get("note"),
            is_settled: row.get::<i64, _>("is_settled") != 0,
            created_at: decode_instant(&created_raw),
        }
    }
}

#[async_trait]
impl AdvanceStore for AdvanceRepository {
    async fn store_advance(&self, advance: &Advance) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO advances
                (id, vehicle_number, trip_id, trip_date, amount, kind, note,
                 is_settled, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&advance.id)
        .bind(&advance.vehicle_number)
        .bind(encode_trip_ref(&advance.trip_id))
        .bind(encode_date(advance.trip_date))
        .bind(advance.amount)
        .bind(encode_advance_kind(advance.kind))
        .bind(&advance.note)
        .bind(advance.is_settled as i64)
        .bind(encode_instant(advance.created_at))
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store advance {}", advance.id))?;
        Ok(())
    }

    async fn advances_by_trip(&self, trip_id: &str) -> Result<Vec<Advance>> {
        let rows = sqlx::query("SELECT * FROM advances WHERE trip_id = ?")
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to query advances for trip {trip_id}"))?;
        Ok(rows.iter().map(Self::row_to_advance).collect())
    }

    async fn orphaned_advances_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Advance>> {
        let rows = sqlx::query("SELECT * FROM advances WHERE trip_id = '' AND vehicle_number = ?")
            .bind(vehicle_number)
            .fetch_all(&self.pool)
            .await
            .with_context(|| {
                format!("failed to query orphaned advances for vehicle {vehicle_number}")
            })?;
        Ok(rows.iter().map(Self::row_to_advance).collect())
    }

    async fn advances_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Advance>> {
        let rows = sqlx::query("SELECT * FROM advances WHERE vehicle_number = ?")
            .bind(vehicle_number)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to query advances for vehicle {vehicle_number}"))?;
        Ok(rows.iter().map(Self::row_to_advance).collect())
    }

    async fn all_advances(&self) -> Result<Vec<Advance>> {
        let rows = sqlx::query("SELECT * FROM advances")
            .fetch_all(&self.pool)
            .await
            .context("failed to list advances")?;
        Ok(rows.iter().map(Self::row_to_advance).collect())
    }

    async fn advances_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Advance>> {
        let rows = sqlx::query("SELECT * FROM advances WHERE created_at >= ? AND created_at <= ?")
            .bind(encode_instant(start))
            .bind(encode_instant(end))
            .fetch_all(&self.pool)
            .await
            .context("failed to query advances by creation range")?;
        Ok(rows.iter().map(Self::row_to_advance).collect())
    }
}
