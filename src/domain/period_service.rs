//! # Period Service
//!
//! The monthly period cache and reconciliation engine. Owns the in-memory
//! [`EngineState`], detects calendar rollover lazily at initialization,
//! reconciles the active period against remote snapshots, and applies
//! optimistic single-record upserts between reconciliations.
//!
//! ## Concurrency
//!
//! Operations are async but never run in parallel with each other: callers
//! hold `&mut self`, and a single event loop interleaves them only at
//! storage suspension points. Persistence is read-then-write with no mutual
//! exclusion, so two consumers sharing one storage resolve to
//! last-writer-wins. That is the accepted contract for this single-user
//! local cache and is covered by a test below.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::domain::calendar;
use crate::domain::models::period::{EngineState, PeriodRecord, ARCHIVE_CAP};
use crate::domain::models::record::{PeriodAssignment, Record};
use crate::domain::period_store::PeriodStore;
use crate::storage::{JsonFileStorage, Storage};

/// Point-in-time counts for diagnostics and logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSummary {
    pub active_period: Option<String>,
    pub record_count: usize,
    pub total: f64,
    pub archived_periods: usize,
    pub initialized: bool,
}

/// The period cache engine.
///
/// Constructed with explicit [`Storage`] and [`Clock`] capabilities; there
/// is no process-wide instance.
pub struct PeriodService {
    store: PeriodStore,
    clock: Arc<dyn Clock>,
    state: EngineState,
}

impl PeriodService {
    /// Create an engine over the given storage backend and clock.
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: PeriodStore::new(storage),
            clock,
            state: EngineState::default(),
        }
    }

    /// Convenience constructor: JSON file storage under `data_dir` and the
    /// system clock.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let storage = JsonFileStorage::new(data_dir)?;
        Ok(Self::new(Arc::new(storage), Arc::new(SystemClock)))
    }

    /// Initialize the engine for this session.
    ///
    /// Loads persisted state, performs at most one rollover transition when
    /// the calendar month has changed since the active period was created,
    /// then reconciles against `records`. Calling it again in the same
    /// session is a no-op; calling it again in a later session is always
    /// safe.
    pub async fn initialize(&mut self, records: &[Record]) {
        if self.state.initialized {
            debug!("Period engine already initialized");
            return;
        }

        self.state = self.store.load().await;

        let now = self.clock.now();
        self.roll_over_if_needed(now).await;
        self.reconcile(records).await;
        self.state.initialized = true;

        if let Some(active) = &self.state.active {
            info!("✅ Period engine initialized for {}", active.display_name);
        }
    }

    /// Reconcile the active period against the authoritative snapshot.
    ///
    /// The active record set is fully replaced by the matching subset of
    /// `records` and the total re-derived, so the outcome depends only on
    /// the latest snapshot: reconciling twice with the same input yields the
    /// same period. The raw snapshot is persisted alongside as the offline
    /// fallback for the next startup.
    ///
    /// Returns the updated active period, or `None` when no period has been
    /// opened yet.
    pub async fn reconcile(&mut self, records: &[Record]) -> Option<PeriodRecord> {
        let Some(active) = self.state.active.as_mut() else {
            warn!("Reconcile requested with no active period; call initialize first");
            return None;
        };

        let matching: Vec<Record> = records
            .iter()
            .filter(|record| record_belongs(record, active))
            .cloned()
            .collect();
        debug!(
            "🔄 Reconciling {}: {} of {} records match",
            active.id,
            matching.len(),
            records.len()
        );

        active.records = matching;
        active.recompute_total();
        let updated = active.clone();

        self.store.save_active(&updated).await;
        self.store.save_backup(records).await;
        Some(updated)
    }

    /// Insert or replace a single record in the active period ahead of the
    /// next full reconciliation.
    ///
    /// A record with no period assignment is stamped with the active
    /// period's id so later reconciliations keep classifying it the same
    /// way. If no active period exists yet, one is opened for the current
    /// month first. Returns the record as stored.
    pub async fn upsert(&mut self, mut record: Record) -> Record {
        if self.state.active.is_none() {
            self.open_period(self.clock.now()).await;
        }
        if let Some(active) = self.state.active.as_mut() {
            if record.period == PeriodAssignment::InferFromDate {
                record.period = PeriodAssignment::Explicit(active.id.clone());
            }

            match active.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => active.records.push(record.clone()),
            }
            active.recompute_total();
            debug!(
                "➕ Upserted record {} into {}; {} records, total {}",
                record.id,
                active.id,
                active.records.len(),
                active.total
            );

            let updated = active.clone();
            self.store.save_active(&updated).await;
        }
        record
    }

    /// Drop all engine state, in memory and in storage.
    pub async fn reset(&mut self) {
        self.state = EngineState::default();
        self.store.reset().await;
        info!("♻️ Period engine reset");
    }

    /// The active period, if one has been opened.
    pub fn active_period(&self) -> Option<&PeriodRecord> {
        self.state.active.as_ref()
    }

    /// The active period, or an empty placeholder for the current month when
    /// nothing has been initialized yet. Read-only convenience for screens
    /// that render before the first `initialize` completes.
    pub fn active_period_snapshot(&self) -> PeriodRecord {
        match &self.state.active {
            Some(active) => active.clone(),
            None => PeriodRecord::open(self.clock.now()),
        }
    }

    /// Records of the active period, in snapshot order.
    pub fn current_records(&self) -> &[Record] {
        self.state
            .active
            .as_ref()
            .map(|p| p.records.as_slice())
            .unwrap_or(&[])
    }

    /// Archived periods, newest first.
    pub fn archive(&self) -> &[PeriodRecord] {
        &self.state.archive
    }

    /// Look up an archived period by id.
    pub fn archived_period(&self, period_id: &str) -> Option<&PeriodRecord> {
        self.state.archive.iter().find(|p| p.id == period_id)
    }

    /// Remove a period from the archive. Returns whether anything was
    /// removed.
    pub async fn remove_archived_period(&mut self, period_id: &str) -> bool {
        let before = self.state.archive.len();
        self.state.archive.retain(|p| p.id != period_id);
        let removed = self.state.archive.len() != before;
        if removed {
            self.store.save_archive(&self.state.archive).await;
        }
        removed
    }

    /// Raw snapshot persisted by the last reconciliation; offline fallback
    /// for the remote-sync layer, never consumed by the engine itself.
    pub async fn backup_records(&self) -> Vec<Record> {
        self.store.load_backup().await
    }

    /// Whole days left in the current month, not counting today.
    pub fn remaining_days_in_month(&self) -> i64 {
        calendar::remaining_days(self.clock.now())
    }

    /// True within the last three days of the month.
    pub fn is_end_of_month(&self) -> bool {
        calendar::is_end_of_month(self.clock.now())
    }

    pub fn summary(&self) -> EngineSummary {
        EngineSummary {
            active_period: self.state.active.as_ref().map(|p| p.id.clone()),
            record_count: self.state.active.as_ref().map(|p| p.records.len()).unwrap_or(0),
            total: self.state.active.as_ref().map(|p| p.total).unwrap_or(0.0),
            archived_periods: self.state.archive.len(),
            initialized: self.state.initialized,
        }
    }

    /// Archive the stored active period when `now` has left its month, then
    /// open a fresh period for the current month.
    ///
    /// Rollover is lazy: however long the engine sat unused, exactly one
    /// transition happens — the stored period is archived and the new active
    /// period is opened for the month `now` falls in. Skipped months get no
    /// synthetic periods.
    async fn roll_over_if_needed(&mut self, now: NaiveDateTime) {
        let current_id = calendar::period_id(now);
        match self.state.active.take() {
            None => {
                self.open_period(now).await;
            }
            Some(active) if active.id != current_id => {
                self.archive_period(active, now).await;
                self.open_period(now).await;
            }
            Some(active) => {
                // Still in the stored month; no transition.
                self.state.active = Some(active);
            }
        }
    }

    async fn open_period(&mut self, now: NaiveDateTime) {
        let period = PeriodRecord::open(now);
        info!("📅 Created new period {} ({})", period.id, period.display_name);
        self.store.save_active(&period).await;
        self.state.active = Some(period);
    }

    async fn archive_period(&mut self, mut period: PeriodRecord, now: NaiveDateTime) {
        period.close(now);
        info!(
            "📁 Archived period {} with {} records totalling {}",
            period.id,
            period.records.len(),
            period.total
        );
        self.state.archive.insert(0, period);
        self.state.archive.truncate(ARCHIVE_CAP);
        self.store.save_archive(&self.state.archive).await;
    }
}

/// A record belongs to the active period when it carries that period's id,
/// or carries no id and falls inside the period's date bounds. Records
/// stamped for any other period never match, whatever their date.
fn record_belongs(record: &Record, period: &PeriodRecord) -> bool {
    match &record.period {
        PeriodAssignment::Explicit(id) => *id == period.id,
        PeriodAssignment::InferFromDate => period.contains(record.occurred_at),
    }
}
