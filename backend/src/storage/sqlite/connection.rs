use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::storage::traits::Connection;

use super::advance_repository::AdvanceRepository;
use super::trip_repository::TripRepository;
use super::vehicle_repository::VehicleRepository;
use super::village_repository::VillageRepository;

/// Primary backing: a pooled SQLite database. Instants are stored as
/// fixed-width RFC 3339 text so range queries can compare lexicographically.
#[derive(Clone)]
pub struct SqliteConnection {
    pool: SqlitePool,
}

impl SqliteConnection {
    /// Connect and run schema setup. Failure here is what sends startup down
    /// the CSV fallback path.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url {database_url}"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("failed to open sqlite database")?;

        let connection = Self { pool };
        connection.setup_schema().await?;
        info!("sqlite storage ready at {database_url}");
        Ok(connection)
    }

    /// Fresh uniquely named in-memory database for tests.
    pub async fn connect_test() -> Result<Self> {
        let url = format!(
            "sqlite:file:testdb-{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4()
        );
        Self::connect(&url).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn setup_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trips (
                id TEXT PRIMARY KEY,
                sl_number INTEGER NOT NULL,
                date TEXT NOT NULL,
                vehicle_number TEXT NOT NULL,
                str_number TEXT NOT NULL,
                str_status TEXT NOT NULL,
                villages TEXT NOT NULL,
                quantity REAL NOT NULL,
                driver_name TEXT NOT NULL,
                mobile_number TEXT NOT NULL,
                vehicle_type TEXT NOT NULL,
                advance_amount REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create trips table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS advances (
                id TEXT PRIMARY KEY,
                vehicle_number TEXT NOT NULL,
                trip_id TEXT NOT NULL DEFAULT '',
                trip_date TEXT NOT NULL,
                amount REAL NOT NULL,
                kind TEXT,
                note TEXT NOT NULL,
                is_settled INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create advances table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vehicles (
                vehicle_number TEXT PRIMARY KEY,
                driver_name TEXT NOT NULL,
                mobile_number TEXT NOT NULL,
                vehicle_type TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create vehicles table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS villages (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                usage_count INTEGER NOT NULL DEFAULT 0,
                last_used TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to create villages table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_advances_trip ON advances (trip_id)")
            .execute(&self.pool)
            .await
            .context("failed to create advance trip index")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trips_date ON trips (date)")
            .execute(&self.pool)
            .await
            .context("failed to create trip date index")?;

        Ok(())
    }
}

impl Connection for SqliteConnection {
    type TripRepository = TripRepository;
    type AdvanceRepository = AdvanceRepository;
    type VehicleRepository = VehicleRepository;
    type VillageRepository = VillageRepository;

    fn create_trip_repository(&self) -> TripRepository {
        TripRepository::new(self.pool.clone())
    }

    fn create_advance_repository(&self) -> AdvanceRepository {
        AdvanceRepository::new(self.pool.clone())
    }

    fn create_vehicle_repository(&self) -> VehicleRepository {
        VehicleRepository::new(self.pool.clone())
    }

    fn create_village_repository(&self) -> VillageRepository {
        VillageRepository::new(self.pool.clone())
    }
}
