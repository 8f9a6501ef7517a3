use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::StringRecord;

use shared::Advance;

use crate::storage::traits::AdvanceStore;
use crate::storage::{
    decode_advance_kind, decode_date, decode_instant, decode_trip_ref, encode_advance_kind,
    encode_date, encode_instant, encode_trip_ref,
};

use super::connection::CsvConnection;

const FILE_NAME: &str = "advances.csv";
const HEADERS: &[&str] = &[
    "id",
    "vehicle_number",
    "trip_id",
    "trip_date",
    "amount",
    "kind",
    "note",
    "is_settled",
    "created_at",
];

#[derive(Clone)]
pub struct AdvanceRepository {
    connection: CsvConnection,
}

impl AdvanceRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn field(record: &StringRecord, index: usize) -> String {
        record.get(index).unwrap_or_default().to_string()
    }

    fn record_to_advance(record: &StringRecord) -> Advance {
        Advance {
            id: Self::field(record, 0),
            vehicle_number: Self::field(record, 1),
            trip_id: decode_trip_ref(&Self::field(record, 2)),
            trip_date: decode_date(&Self::field(record, 3)),
            amount: Self::field(record, 4).parse().unwrap_or(0.0),
            kind: decode_advance_kind(&Self::field(record, 5)),
            note: Self::field(record, 6),
            is_settled: Self::field(record, 7) == "true",
            created_at: decode_instant(&Self::field(record, 8)),
        }
    }

    fn advance_to_record(advance: &Advance) -> Vec<String> {
        vec![
            advance.id.clone(),
            advance.vehicle_number.clone(),
            encode_trip_ref(&advance.trip_id),
            encode_date(advance.trip_date),
            advance.amount.to_string(),
            encode_advance_kind(advance.kind).unwrap_or_default(),
            advance.note.clone(),
            advance.is_settled.to_string(),
            encode_instant(advance.created_at),
        ]
    }

    fn read_all(&self) -> Result<Vec<Advance>> {
        let path = self.connection.ensure_file(FILE_NAME, HEADERS)?;
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut advances = Vec::new();
        for record in reader.records() {
            let record = record.context("failed to read advance record")?;
            advances.push(Self::record_to_advance(&record));
        }
        Ok(advances)
    }

    fn write_all(&self, advances: &[Advance]) -> Result<()> {
        let path = self.connection.entity_file(FILE_NAME);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to open {} for writing", path.display()))?;
        writer.write_record(HEADERS)?;
        for advance in advances {
            writer.write_record(Self::advance_to_record(advance))?;
        }
        writer.flush().context("failed to flush advances file")?;
        Ok(())
    }
}

#[async_trait]
impl AdvanceStore for AdvanceRepository {
    async fn store_advance(&self, advance: &Advance) -> Result<()> {
        let mut advances = self.read_all()?;
        advances.push(advance.clone());
        self.write_all(&advances)
    }

    async fn advances_by_trip(&self, trip_id: &str) -> Result<Vec<Advance>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|advance| advance.trip_id.as_deref() == Some(trip_id))
            .collect())
    }

    async fn orphaned_advances_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Advance>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|advance| {
                advance.trip_id.is_none() && advance.vehicle_number == vehicle_number
            })
            .collect())
    }

    async fn advances_by_vehicle(&self, vehicle_number: &str) -> Result<Vec<Advance>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|advance| advance.vehicle_number == vehicle_number)
            .collect())
    }

    async fn all_advances(&self) -> Result<Vec<Advance>> {
        self.read_all()
    }

    async fn advances_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Advance>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|advance| advance.created_at >= start && advance.created_at <= end)
            .collect())
    }
}
