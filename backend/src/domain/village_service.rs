use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use shared::{CreateVillageRequest, Village};

use crate::error::DomainError;
use crate::storage::traits::{Connection, VillageStore};

/// Destination villages, ranked by how often they are picked so the entry
/// form can suggest frequent destinations first.
#[derive(Clone)]
pub struct VillageService<C: Connection> {
    villages: C::VillageRepository,
}

impl<C: Connection> VillageService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            villages: connection.create_village_repository(),
        }
    }

    /// Add a village; adding an existing active name returns the existing
    /// record instead of a duplicate.
    pub async fn add_village(&self, request: CreateVillageRequest) -> Result<Village> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("village name is required"));
        }

        if let Some(existing) = self.villages.find_village_by_name(&name).await? {
            return Ok(existing);
        }

        let village = Village {
            id: Uuid::new_v4().to_string(),
            name,
            is_active: true,
            usage_count: 0,
            last_used: Utc::now(),
        };
        self.villages.store_village(&village).await?;
        Ok(village)
    }

    /// Active villages, most used first; ties break alphabetically.
    pub async fn list_villages(&self) -> Result<Vec<Village>> {
        let mut villages = self.villages.list_active_villages().await?;
        villages.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(villages)
    }

    /// Case-insensitive substring search over active villages, usage-ranked.
    pub async fn search_villages(&self, query: &str) -> Result<Vec<Village>> {
        let needle = query.trim().to_lowercase();
        let mut villages = self.list_villages().await?;
        if !needle.is_empty() {
            villages.retain(|village| village.name.to_lowercase().contains(&needle));
        }
        Ok(villages)
    }

    pub async fn record_usage(&self, village_id: &str) -> Result<bool> {
        self.villages.record_usage(village_id, Utc::now()).await
    }
}
