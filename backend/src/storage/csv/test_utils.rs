//! RAII test scaffolding for the CSV backing: each test gets a temporary
//! directory that is removed when the helper is dropped, even on panic.

use anyhow::Result;
use tempfile::TempDir;

use crate::storage::traits::Connection;

use super::advance_repository::AdvanceRepository;
use super::connection::CsvConnection;
use super::trip_repository::TripRepository;
use super::vehicle_repository::VehicleRepository;
use super::village_repository::VillageRepository;

pub struct TestEnvironment {
    pub connection: CsvConnection,
    pub base_path: std::path::PathBuf,
    _temp_dir: TempDir, // keep alive until drop
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }
}

pub struct TestHelper {
    pub env: TestEnvironment,
    pub trip_repo: TripRepository,
    pub advance_repo: AdvanceRepository,
    pub vehicle_repo: VehicleRepository,
    pub village_repo: VillageRepository,
}

impl TestHelper {
    pub fn new() -> Result<Self> {
        let env = TestEnvironment::new()?;
        let trip_repo = env.connection.create_trip_repository();
        let advance_repo = env.connection.create_advance_repository();
        let vehicle_repo = env.connection.create_vehicle_repository();
        let village_repo = env.connection.create_village_repository();
        Ok(Self {
            env,
            trip_repo,
            advance_repo,
            vehicle_repo,
            village_repo,
        })
    }
}
