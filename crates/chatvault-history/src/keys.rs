//! Vendor API keys.

use crate::error::{HistoryError, Result};
use crate::store::HistoryStore;
use chatvault_core::{ApiKeyId, ApiKeyRecord, OwnerId, Platform, SecretString};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Listing view of a key. The key itself is only shown masked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiKeySummary {
    pub id: ApiKeyId,
    pub platform: Platform,
    pub masked_key: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ApiKeyRecord> for ApiKeySummary {
    fn from(record: &ApiKeyRecord) -> Self {
        Self {
            id: record.id,
            platform: record.platform,
            masked_key: record.api_key.masked(),
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl HistoryStore {
    /// Store the key for a platform, replacing and re-activating any existing one.
    pub async fn upsert_api_key(
        &self,
        owner: &OwnerId,
        platform: Platform,
        api_key: SecretString,
    ) -> Result<ApiKeySummary> {
        if api_key.is_empty() {
            return Err(HistoryError::Invalid("API key is required".to_string()));
        }

        let summary = self
            .mutate(|state| {
                let now = Utc::now();
                if let Some(existing) = state
                    .api_keys
                    .values_mut()
                    .find(|k| &k.owner == owner && k.platform == platform)
                {
                    existing.api_key = api_key;
                    existing.is_active = true;
                    existing.updated_at = now;
                    return Ok(ApiKeySummary::from(&*existing));
                }

                let record = ApiKeyRecord {
                    id: state.next_api_key_id(),
                    owner: owner.clone(),
                    platform,
                    api_key,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                let summary = ApiKeySummary::from(&record);
                state.api_keys.insert(record.id, record);
                Ok(summary)
            })
            .await?;

        tracing::info!(platform = %platform, key = %summary.masked_key, "Stored API key");
        Ok(summary)
    }

    pub async fn list_api_keys(&self, owner: &OwnerId) -> Result<Vec<ApiKeySummary>> {
        self.read(|state| {
            Ok(state
                .api_keys
                .values()
                .filter(|k| &k.owner == owner)
                .map(ApiKeySummary::from)
                .collect())
        })
        .await
    }

    pub async fn delete_api_key(&self, owner: &OwnerId, id: ApiKeyId) -> Result<()> {
        self.mutate(|state| {
            match state.api_keys.get(&id) {
                Some(k) if &k.owner == owner => {}
                _ => return Err(HistoryError::not_found("API key", id)),
            }
            state.api_keys.remove(&id);
            Ok(())
        })
        .await
    }

    /// Flip the active flag; returns the new state.
    pub async fn toggle_api_key(&self, owner: &OwnerId, id: ApiKeyId) -> Result<bool> {
        self.mutate(|state| {
            let key = state
                .api_keys
                .get_mut(&id)
                .filter(|k| &k.owner == owner)
                .ok_or_else(|| HistoryError::not_found("API key", id))?;
            key.is_active = !key.is_active;
            key.updated_at = Utc::now();
            Ok(key.is_active)
        })
        .await
    }

    /// The active key for a platform, if one is stored.
    pub async fn active_api_key(
        &self,
        owner: &OwnerId,
        platform: Platform,
    ) -> Result<Option<SecretString>> {
        self.read(|state| {
            Ok(state
                .api_keys
                .values()
                .find(|k| &k.owner == owner && k.platform == platform && k.is_active)
                .map(|k| k.api_key.clone()))
        })
        .await
    }
}
