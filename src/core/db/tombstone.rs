use std::collections::HashSet;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    core::db::LocalDevice,
    error::{Result, StoreError},
};

/// Per-client record of deleted seed projects. Append-only.
///
/// Always lives on the local device, whichever backend holds the projects.
#[derive(Debug, Clone)]
pub struct TombstoneStore {
    device: LocalDevice,
}

impl TombstoneStore {
    pub fn new(device: LocalDevice) -> Self {
        Self { device }
    }

    pub async fn load(&self) -> Result<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM seed_tombstone")
            .fetch_all(self.device.pool())
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Recording the same id twice keeps the first timestamp.
    pub async fn record(&self, seed_id: &str) -> Result<()> {
        let deleted_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| StoreError::Unknown(e.to_string()))?;
        sqlx::query("INSERT OR IGNORE INTO seed_tombstone (id, deleted_at) VALUES ($1, $2)")
            .bind(seed_id)
            .bind(deleted_at)
            .execute(self.device.pool())
            .await?;
        Ok(())
    }
}
