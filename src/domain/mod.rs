//! Domain layer: models and services for the monthly period cache.

pub mod calendar;
pub mod models;
pub mod period_service;
pub mod period_store;

pub use period_service::{EngineSummary, PeriodService};
pub use period_store::PeriodStore;
