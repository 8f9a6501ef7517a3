use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::StringRecord;

use shared::Trip;

use crate::storage::traits::TripStore;
use crate::storage::{
    decode_date, decode_instant, decode_str_status, decode_vehicle_type, encode_date,
    encode_instant,
};

use super::connection::CsvConnection;

const FILE_NAME: &str = "trips.csv";
const HEADERS: &[&str] = &[
    "id",
    "sl_number",
    "date",
    "vehicle_number",
    "str_number",
    "str_status",
    "villages",
    "quantity",
    "driver_name",
    "mobile_number",
    "vehicle_type",
    "advance_amount",
    "created_at",
    "updated_at",
];

#[derive(Clone)]
pub struct TripRepository {
    connection: CsvConnection,
}

impl TripRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn field(record: &StringRecord, index: usize) -> String {
        record.get(index).unwrap_or_default().to_string()
    }

    fn record_to_trip(record: &StringRecord) -> Trip {
        let villages_raw = Self::field(record, 6);
        let villages = if villages_raw.is_empty() {
            Vec::new()
        } else {
            villages_raw.split(';').map(str::to_string).collect()
        };

        Trip {
            id: Self::field(record, 0),
            sl_number: Self::field(record, 1).parse().unwrap_or(0),
            date: decode_date(&Self::field(record, 2)),
            vehicle_number: Self::field(record, 3),
            str_number: Self::field(record, 4),
            str_status: decode_str_status(&Self::field(record, 5)),
            villages,
            quantity: Self::field(record, 7).parse().unwrap_or(0.0),
            driver_name: Self::field(record, 8),
            mobile_number: Self::field(record, 9),
            vehicle_type: decode_vehicle_type(&Self::field(record, 10)),
            advance_amount: Self::field(record, 11).parse().unwrap_or(0.0),
            created_at: decode_instant(&Self::field(record, 12)),
            updated_at: decode_instant(&Self::field(record, 13)),
        }
    }

    fn trip_to_record(trip: &Trip) -> Vec<String> {
        vec![
            trip.id.clone(),
            trip.sl_number.to_string(),
            encode_date(trip.date),
            trip.vehicle_number.clone(),
            trip.str_number.clone(),
            trip.str_status.to_string(),
            trip.villages.join(";"),
            trip.quantity.to_string(),
            trip.driver_name.clone(),
            trip.mobile_number.clone(),
            trip.vehicle_type.to_string(),
            trip.advance_amount.to_string(),
            encode_instant(trip.created_at),
            encode_instant(trip.updated_at),
        ]
    }

    fn read_all(&self) -> Result<Vec<Trip>> {
        let path = self.connection.ensure_file(FILE_NAME, HEADERS)?;
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut trips = Vec::new();
        for record in reader.records() {
            let record = record.context("failed to read trip record")?;
            trips.push(Self::record_to_trip(&record));
        }
        Ok(trips)
    }

    fn write_all(&self, trips: &[Trip]) -> Result<()> {
        let path = self.connection.entity_file(FILE_NAME);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to open {} for writing", path.display()))?;
        writer.write_record(HEADERS)?;
        for trip in trips {
            writer.write_record(Self::trip_to_record(trip))?;
        }
        writer.flush().context("failed to flush trips file")?;
        Ok(())
    }
}

#[async_trait]
impl TripStore for TripRepository {
    async fn store_trip(&self, trip: &Trip) -> Result<()> {
        let mut trips = self.read_all()?;
        trips.push(trip.clone());
        self.write_all(&trips)
    }

    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>> {
        Ok(self.read_all()?.into_iter().find(|trip| trip.id == trip_id))
    }

    async fn list_trips(&self) -> Result<Vec<Trip>> {
        self.read_all()
    }

    async fn trips_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Trip>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|trip| trip.date >= from && trip.date <= to)
            .collect())
    }

    async fn trips_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Trip>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|trip| trip.vehicle_number == vehicle_number)
            .collect())
    }

    async fn update_trip(&self, trip: &Trip) -> Result<()> {
        let mut trips = self.read_all()?;
        for existing in trips.iter_mut() {
            if existing.id == trip.id {
                *existing = trip.clone();
            }
        }
        self.write_all(&trips)
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<bool> {
        let mut trips = self.read_all()?;
        let before = trips.len();
        trips.retain(|trip| trip.id != trip_id);
        let removed = trips.len() != before;
        if removed {
            self.write_all(&trips)?;
        }
        Ok(removed)
    }

    async fn max_sl_number(&self) -> Result<u32> {
        Ok(self
            .read_all()?
            .iter()
            .map(|trip| trip.sl_number)
            .max()
            .unwrap_or(0))
    }
}
