use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use csv::StringRecord;

use shared::Vehicle;

use crate::storage::traits::VehicleStore;
use crate::storage::{decode_instant, decode_vehicle_type, encode_instant};

use super::connection::CsvConnection;

const FILE_NAME: &str = "vehicles.csv";
const HEADERS: &[&str] = &[
    "vehicle_number",
    "driver_name",
    "mobile_number",
    "vehicle_type",
    "is_active",
    "created_at",
    "updated_at",
];

#[derive(Clone)]
pub struct VehicleRepository {
    connection: CsvConnection,
}

impl VehicleRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn field(record: &StringRecord, index: usize) -> String {
        record.get(index).unwrap_or_default().to_string()
    }

    fn record_to_vehicle(record: &StringRecord) -> Vehicle {
        Vehicle {
            vehicle_number: Self::field(record, 0),
            driver_name: Self::field(record, 1),
            mobile_number: Self::field(record, 2),
            vehicle_type: decode_vehicle_type(&Self::field(record, 3)),
            is_active: Self::field(record, 4) == "true",
            created_at: decode_instant(&Self::field(record, 5)),
            updated_at: decode_instant(&Self::field(record, 6)),
        }
    }

    fn vehicle_to_record(vehicle: &Vehicle) -> Vec<String> {
        vec![
            vehicle.vehicle_number.clone(),
            vehicle.driver_name.clone(),
            vehicle.mobile_number.clone(),
            vehicle.vehicle_type.to_string(),
            vehicle.is_active.to_string(),
            encode_instant(vehicle.created_at),
            encode_instant(vehicle.updated_at),
        ]
    }

    fn read_all(&self) -> Result<Vec<Vehicle>> {
        let path = self.connection.ensure_file(FILE_NAME, HEADERS)?;
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut vehicles = Vec::new();
        for record in reader.records() {
            let record = record.context("failed to read vehicle record")?;
            vehicles.push(Self::record_to_vehicle(&record));
        }
        Ok(vehicles)
    }

    fn write_all(&self, vehicles: &[Vehicle]) -> Result<()> {
        let path = self.connection.entity_file(FILE_NAME);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to open {} for writing", path.display()))?;
        writer.write_record(HEADERS)?;
        for vehicle in vehicles {
            writer.write_record(Self::vehicle_to_record(vehicle))?;
        }
        writer.flush().context("failed to flush vehicles file")?;
        Ok(())
    }
}

#[async_trait]
impl VehicleStore for VehicleRepository {
    async fn store_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        let mut vehicles = self.read_all()?;
        match vehicles
            .iter_mut()
            .find(|existing| existing.vehicle_number == vehicle.vehicle_number)
        {
            Some(existing) => *existing = vehicle.clone(),
            None => vehicles.push(vehicle.clone()),
        }
        self.write_all(&vehicles)
    }

    async fn get_vehicle(&self, vehicle_number: &str) -> Result<Option<Vehicle>> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|vehicle| vehicle.vehicle_number == vehicle_number))
    }

    async fn list_active_vehicles(&self) -> Result<Vec<Vehicle>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|vehicle| vehicle.is_active)
            .collect())
    }

    async fn deactivate_vehicle(&self, vehicle_number: &str) -> Result<bool> {
        let mut vehicles = self.read_all()?;
        let mut found = false;
        for vehicle in vehicles.iter_mut() {
            if vehicle.vehicle_number == vehicle_number {
                vehicle.is_active = false;
                vehicle.updated_at = Utc::now();
                found = true;
            }
        }
        if found {
            self.write_all(&vehicles)?;
        }
        Ok(found)
    }
}
