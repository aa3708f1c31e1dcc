use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{AppError, AppResult, StoreResult};
use crate::models::UserProfile;
use crate::services::store::SharedStore;
use crate::services::tasks::TaskDirectory;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub user: UserProfile,
    pub tasks: serde_json::Value,
    pub export_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Replaced,
    NothingToImport,
}

/// Whole-store export, import and wipe.
#[derive(Clone)]
pub struct DataPortability {
    store: SharedStore,
    tasks: TaskDirectory,
}

impl DataPortability {
    pub fn new(store: SharedStore) -> Self {
        let tasks = TaskDirectory::new(store.clone());
        Self { store, tasks }
    }

    /// Snapshot of the signed-in user and the entire stored task collection.
    pub fn export(&self, user: &UserProfile, now: DateTime<Utc>) -> StoreResult<ExportDocument> {
        let tasks = serde_json::to_value(self.tasks.stored()?)?;
        Ok(ExportDocument {
            user: user.clone(),
            tasks,
            export_date: now,
        })
    }

    pub fn export_json(&self, user: &UserProfile, now: DateTime<Utc>) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.export(user, now)?)?)
    }

    /// Replaces the stored task collection with the document's `tasks` field
    /// as-is. No merge, no per-task checks.
    pub fn import(&self, raw: &[u8]) -> AppResult<ImportOutcome> {
        let document: serde_json::Value = serde_json::from_slice(raw).map_err(|e| {
            tracing::warn!("Rejected import document: {}", e);
            AppError::InvalidImport(e.to_string())
        })?;

        match document.get("tasks") {
            Some(tasks) if !tasks.is_null() => {
                self.tasks.replace_all(tasks)?;
                tracing::info!("Imported task collection");
                Ok(ImportOutcome::Replaced)
            }
            _ => Ok(ImportOutcome::NothingToImport),
        }
    }

    /// Clears every key in the store, accounts and session included.
    pub fn wipe_local_data(&self) -> StoreResult<()> {
        tracing::warn!("Wiping all local data");
        self.store.clear()
    }
}
