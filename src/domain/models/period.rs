//! Domain model for a monthly period and the engine's in-memory state.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::record::Record;
use crate::domain::calendar;

/// Maximum number of archived periods retained, newest first. Inserting
/// beyond the cap evicts the oldest entry.
pub const ARCHIVE_CAP: usize = 12;

/// One calendar month of records, either the active period or an archived one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// Canonical period id, zero-padded `"YYYY-MM"`. Sortable as a string.
    pub id: String,
    /// Human-readable label, e.g. `"January 2024"`.
    pub display_name: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    /// Records from the last reconciliation, in snapshot order.
    pub records: Vec<Record>,
    /// Always derived via [`PeriodRecord::recompute_total`], never mutated on
    /// its own.
    pub total: f64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    /// Set when the period leaves the active slot.
    pub archived_at: Option<NaiveDateTime>,
}

impl PeriodRecord {
    /// Open a fresh, empty active period for the month containing `now`.
    pub fn open(now: NaiveDateTime) -> Self {
        let (start_date, end_date) = calendar::month_bounds(now);
        PeriodRecord {
            id: calendar::period_id(now),
            display_name: calendar::display_name(now),
            start_date,
            end_date,
            records: Vec::new(),
            total: 0.0,
            is_active: true,
            created_at: now,
            archived_at: None,
        }
    }

    /// Inclusive containment check against the period's month bounds.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start_date <= instant && instant <= self.end_date
    }

    /// Re-derive `total` from the current record set.
    pub fn recompute_total(&mut self) {
        self.total = self.records.iter().map(Record::amount_or_zero).sum();
    }

    /// Mark the period as no longer active, stamping the archive time.
    pub fn close(&mut self, archived_at: NaiveDateTime) {
        self.is_active = false;
        self.archived_at = Some(archived_at);
    }
}

/// The engine's full state: the active period plus bounded history.
///
/// Persisted as two independent blobs (active and archive) by the period
/// store; `initialized` is session-local and never written out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    pub active: Option<PeriodRecord>,
    /// Previously active periods, newest first, at most [`ARCHIVE_CAP`].
    pub archive: Vec<PeriodRecord>,
    /// Set once `initialize` has completed for this session.
    pub initialized: bool,
}
