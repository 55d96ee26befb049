//! Domain model for a synced financial record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Assignment of a record to a monthly period.
///
/// The remote snapshot may carry an explicit period id (written when the
/// record was created through the engine), or no assignment at all, in which
/// case the record is classified by its date against the active period's
/// bounds. Modeled as an enum so an explicit id is never confused with a
/// missing one, whatever its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodAssignment {
    /// The record is already stamped with a period id.
    Explicit(String),
    /// No period id known; classify by `occurred_at`.
    #[default]
    InferFromDate,
}

/// A single income or expense record as reported by the remote sync layer.
///
/// The engine never creates or deletes records; it only classifies them into
/// periods and aggregates their amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// Signed amount. Malformed upstream data may omit it.
    #[serde(default)]
    pub amount: Option<f64>,
    pub occurred_at: NaiveDateTime,
    #[serde(default)]
    pub period: PeriodAssignment,
}

impl Record {
    /// Amount used for aggregation; a missing amount contributes zero so one
    /// bad record never poisons the period total.
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }
}
