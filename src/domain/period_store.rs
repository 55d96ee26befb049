//! # Period State Store
//!
//! Durable persistence for the engine's state: the active period, the
//! archive list, and the raw snapshot backup, each serialized as a JSON blob
//! under its own storage key.
//!
//! ## Key layout
//!
//! | key                | contents                                   |
//! |--------------------|--------------------------------------------|
//! | `current_period`   | the active [`PeriodRecord`]                |
//! | `archived_periods` | newest-first `Vec<PeriodRecord>`, cap 12   |
//! | `records_backup`   | raw `Vec<Record>` from last reconciliation |
//!
//! ## Failure posture
//!
//! Reads are fail-open: a missing or unreadable blob defaults that field to
//! empty, so a corrupt archive never prevents the active period from
//! loading and vice versa. Writes are best-effort: failures are logged and
//! swallowed, keeping the in-memory state consistent at the cost of a
//! possibly stale next startup.

use std::sync::Arc;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::models::period::{EngineState, PeriodRecord};
use crate::domain::models::record::Record;
use crate::storage::Storage;

/// Storage key for the active period blob.
pub const ACTIVE_PERIOD_KEY: &str = "current_period";
/// Storage key for the archive-list blob.
pub const ARCHIVE_KEY: &str = "archived_periods";
/// Storage key for the raw record snapshot used as an offline fallback.
pub const BACKUP_KEY: &str = "records_backup";

/// Durable store for the engine state.
#[derive(Clone)]
pub struct PeriodStore {
    storage: Arc<dyn Storage>,
}

impl PeriodStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Load the persisted engine state.
    ///
    /// Each key is decoded independently and defaults to empty when missing
    /// or unreadable. Never fails.
    pub async fn load(&self) -> EngineState {
        let active: Option<PeriodRecord> = self.read_key(ACTIVE_PERIOD_KEY).await;
        let archive: Vec<PeriodRecord> = self.read_key(ARCHIVE_KEY).await.unwrap_or_default();

        info!(
            "📂 Loaded period state: active={}, archived={}",
            active.as_ref().map(|p| p.id.as_str()).unwrap_or("none"),
            archive.len()
        );

        EngineState {
            active,
            archive,
            initialized: false,
        }
    }

    pub async fn save_active(&self, period: &PeriodRecord) {
        self.write_key(ACTIVE_PERIOD_KEY, period).await;
    }

    pub async fn save_archive(&self, archive: &[PeriodRecord]) {
        self.write_key(ARCHIVE_KEY, archive).await;
    }

    pub async fn save_backup(&self, records: &[Record]) {
        self.write_key(BACKUP_KEY, records).await;
    }

    /// Raw record snapshot from the last reconciliation, for the caller's
    /// offline fallback. The engine itself never reads this back.
    pub async fn load_backup(&self) -> Vec<Record> {
        self.read_key(BACKUP_KEY).await.unwrap_or_default()
    }

    /// Remove every engine key. Safe to call repeatedly.
    pub async fn reset(&self) {
        for key in [ACTIVE_PERIOD_KEY, ARCHIVE_KEY, BACKUP_KEY] {
            if let Err(err) = self.storage.remove(key).await {
                warn!("Failed to clear {}: {:#}", key, err);
            }
        }
    }

    async fn read_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("Failed to read {}: {:#}", key, err);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Discarding unreadable {} blob: {}", key, err);
                None
            }
        }
    }

    async fn write_key<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Failed to serialize {}: {}", key, err);
                return;
            }
        };
        if let Err(err) = self.storage.set(key, &raw).await {
            warn!("Failed to persist {}: {:#}", key, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::record::PeriodAssignment;
    use crate::storage::MemoryStorage;
    use chrono::{NaiveDate, NaiveDateTime};

    fn january() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn setup() -> (PeriodStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (PeriodStore::new(storage.clone()), storage)
    }

    fn sample_record(id: &str, amount: f64) -> Record {
        Record {
            id: id.to_string(),
            amount: Some(amount),
            occurred_at: january(),
            period: PeriodAssignment::InferFromDate,
        }
    }

    #[tokio::test]
    async fn test_load_defaults_to_empty_state() {
        let (store, _storage) = setup();

        let state = store.load().await;
        assert_eq!(state, EngineState::default());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (store, _storage) = setup();

        let mut active = PeriodRecord::open(january());
        active.records.push(sample_record("e1", 50.0));
        active.recompute_total();

        let mut archived = PeriodRecord::open(january());
        archived.close(january());

        store.save_active(&active).await;
        store.save_archive(std::slice::from_ref(&archived)).await;

        let state = store.load().await;
        assert_eq!(state.active, Some(active));
        assert_eq!(state.archive, vec![archived]);
        assert!(!state.initialized);
    }

    #[tokio::test]
    async fn test_corrupt_archive_does_not_take_down_active() {
        let (store, storage) = setup();

        let active = PeriodRecord::open(january());
        store.save_active(&active).await;
        storage.set(ARCHIVE_KEY, "not json at all").await.unwrap();

        let state = store.load().await;
        assert_eq!(state.active, Some(active));
        assert!(state.archive.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_active_does_not_take_down_archive() {
        let (store, storage) = setup();

        let mut archived = PeriodRecord::open(january());
        archived.close(january());
        store.save_archive(std::slice::from_ref(&archived)).await;
        storage.set(ACTIVE_PERIOD_KEY, "{\"id\":").await.unwrap();

        let state = store.load().await;
        assert_eq!(state.active, None);
        assert_eq!(state.archive, vec![archived]);
    }

    #[tokio::test]
    async fn test_write_failures_are_swallowed() {
        let (store, storage) = setup();

        storage.fail_writes(true);
        store.save_active(&PeriodRecord::open(january())).await;
        store.save_archive(&[]).await;
        store.save_backup(&[sample_record("e1", 1.0)]).await;

        storage.fail_writes(false);
        let state = store.load().await;
        assert_eq!(state, EngineState::default());
    }

    #[tokio::test]
    async fn test_backup_round_trip_and_fail_open() {
        let (store, storage) = setup();

        let records = vec![sample_record("e1", 50.0), sample_record("e2", 30.0)];
        store.save_backup(&records).await;
        assert_eq!(store.load_backup().await, records);

        storage.set(BACKUP_KEY, "[{\"broken\"").await.unwrap();
        assert!(store.load_backup().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let (store, storage) = setup();

        store.save_active(&PeriodRecord::open(january())).await;
        store.save_backup(&[sample_record("e1", 1.0)]).await;

        store.reset().await;
        store.reset().await;

        assert_eq!(storage.get(ACTIVE_PERIOD_KEY).await.unwrap(), None);
        assert_eq!(storage.get(ARCHIVE_KEY).await.unwrap(), None);
        assert_eq!(storage.get(BACKUP_KEY).await.unwrap(), None);
        assert_eq!(store.load().await, EngineState::default());
    }
}
