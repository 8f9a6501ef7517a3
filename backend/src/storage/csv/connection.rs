use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::storage::traits::Connection;

use super::advance_repository::AdvanceRepository;
use super::trip_repository::TripRepository;
use super::vehicle_repository::VehicleRepository;
use super::village_repository::VillageRepository;

/// Fallback backing: one CSV file per entity under a data directory. Writes
/// rewrite the whole file, which is fine at this dataset size.
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    pub fn new(base_directory: impl AsRef<Path>) -> Result<Self> {
        let base_directory = base_directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_directory).with_context(|| {
            format!(
                "failed to create csv data directory {}",
                base_directory.display()
            )
        })?;
        info!("csv storage ready at {}", base_directory.display());
        Ok(Self { base_directory })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub(super) fn entity_file(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(file_name)
    }

    /// Create the file with its header row if it does not exist yet.
    pub(super) fn ensure_file(&self, file_name: &str, headers: &[&str]) -> Result<PathBuf> {
        let path = self.entity_file(file_name);
        if !path.exists() {
            let mut writer = csv::Writer::from_path(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            writer.write_record(headers)?;
            writer.flush()?;
        }
        Ok(path)
    }
}

impl Connection for CsvConnection {
    type TripRepository = TripRepository;
    type AdvanceRepository = AdvanceRepository;
    type VehicleRepository = VehicleRepository;
    type VillageRepository = VillageRepository;

    fn create_trip_repository(&self) -> TripRepository {
        TripRepository::new(self.clone())
    }

    fn create_advance_repository(&self) -> AdvanceRepository {
        AdvanceRepository::new(self.clone())
    }

    fn create_vehicle_repository(&self) -> VehicleRepository {
        VehicleRepository::new(self.clone())
    }

    fn create_village_repository(&self) -> VillageRepository {
        VillageRepository::new(self.clone())
    }
}
