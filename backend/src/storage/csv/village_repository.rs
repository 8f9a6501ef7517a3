use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::StringRecord;

use shared::Village;

use crate::storage::traits::VillageStore;
use crate::storage::{decode_instant, encode_instant};

use super::connection::CsvConnection;

const FILE_NAME: &str = "villages.csv";
const HEADERS: &[&str] = &["id", "name", "is_active", "usage_count", "last_used"];

#[derive(Clone)]
pub struct VillageRepository {
    connection: CsvConnection,
}

impl VillageRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn field(record: &StringRecord, index: usize) -> String {
        record.get(index).unwrap_or_default().to_string()
    }

    fn record_to_village(record: &StringRecord) -> Village {
        Village {
            id: Self::field(record, 0),
            name: Self::field(record, 1),
            is_active: Self::field(record, 2) == "true",
            usage_count: Self::field(record, 3).parse().unwrap_or(0),
            last_used: decode_instant(&Self::field(record, 4)),
        }
    }

    fn village_to_record(village: &Village) -> Vec<String> {
        vec![
            village.id.clone(),
            village.name.clone(),
            village.is_active.to_string(),
            village.usage_count.to_string(),
            encode_instant(village.last_used),
        ]
    }

    fn read_all(&self) -> Result<Vec<Village>> {
        let path = self.connection.ensure_file(FILE_NAME, HEADERS)?;
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut villages = Vec::new();
        for record in reader.records() {
            let record = record.context("failed to read village record")?;
            villages.push(Self::record_to_village(&record));
        }
        Ok(villages)
    }

    fn write_all(&self, villages: &[Village]) -> Result<()> {
        let path = self.connection.entity_file(FILE_NAME);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to open {} for writing", path.display()))?;
        writer.write_record(HEADERS)?;
        for village in villages {
            writer.write_record(Self::village_to_record(village))?;
        }
        writer.flush().context("failed to flush villages file")?;
        Ok(())
    }
}

#[async_trait]
impl VillageStore for VillageRepository {
    async fn store_village(&self, village: &Village) -> Result<()> {
        let mut villages = self.read_all()?;
        match villages.iter_mut().find(|existing| existing.id == village.id) {
            Some(existing) => *existing = village.clone(),
            None => villages.push(village.clone()),
        }
        self.write_all(&villages)
    }

    async fn list_active_villages(&self) -> Result<Vec<Village>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|village| village.is_active)
            .collect())
    }

    async fn find_village_by_name(&self, name: &str) -> Result<Option<Village>> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|village| village.is_active && village.name == name))
    }

    async fn record_usage(&self, village_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut villages = self.read_all()?;
        let mut found = false;
        for village in villages.iter_mut() {
            if village.id == village_id {
                village.usage_count += 1;
                village.last_used = now;
                found = true;
            }
        }
        if found {
            self.write_all(&villages)?;
        }
        Ok(found)
    }
}
