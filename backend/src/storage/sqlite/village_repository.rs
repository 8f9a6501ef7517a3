use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use shared::Village;

use crate::storage::traits::VillageStore;
use crate::storage::{decode_instant, encode_instant};

#[derive(Clone)]
pub struct VillageRepository {
    pool: SqlitePool,
}

impl VillageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_village(row: &SqliteRow) -> Village {
        let last_used_raw: String = row.get("last_used");
        Village {
            id: row.get("id"),
            name: row.get("name"),
            is_active: row.get::<i64, _>("is_active") != 0,
            usage_count: row.get::<i64, _>("usage_count").max(0) as u32,
            last_used: decode_instant(&last_used_raw),
        }
    }
}

#[async_trait]
impl VillageStore for VillageRepository {
    async fn store_village(&self, village: &Village) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO villages (id, name, is_active, usage_count, last_used)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&village.id)
        .bind(&village.name)
        .bind(village.is_active as i64)
        .bind(village.usage_count as i64)
        .bind(encode_instant(village.last_used))
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store village {}", village.name))?;
        Ok(())
    }

    async fn list_active_villages(&self) -> Result<Vec<Village>> {
        let rows = sqlx::query("SELECT * FROM villages WHERE is_active = 1")
            .fetch_all(&self.pool)
            .await
            .context("failed to list villages")?;
        Ok(rows.iter().map(Self::row_to_village).collect())
    }

    async fn find_village_by_name(&self, name: &str) -> Result<Option<Village>> {
        let row = sqlx::query("SELECT * FROM villages WHERE name = ? AND is_active = 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to look up village {name}"))?;
        Ok(row.as_ref().map(Self::row_to_village))
    }

    async fn record_usage(&self, village_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE villages SET usage_count = usage_count + 1, last_used = ? WHERE id = ?",
        )
        .bind(encode_instant(now))
        .bind(village_id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to record usage for village {village_id}"))?;
        Ok(result.rows_affected() > 0)
    }
}
