//! # Expense Tracker Engine
//!
//! Monthly period cache and reconciliation engine for the expense tracker:
//! a locally persisted, month-partitioned view of the user's records that
//! rolls over lazily at each initialization, keeps a bounded archive of
//! past months, and reconciles the active month against whatever record
//! set the remote sync layer last returned.
//!
//! The engine owns no network surface. The surrounding app hands it the
//! authoritative `Record` snapshot at startup and after every refresh;
//! screens read the active period and archive back as plain data.
//!
//! ```no_run
//! use expense_tracker_engine::PeriodService;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let mut engine = PeriodService::open("./data")?;
//! engine.initialize(&[]).await;
//! println!("{} records this month", engine.current_records().len());
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod domain;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::models::period::{EngineState, PeriodRecord, ARCHIVE_CAP};
pub use domain::models::record::{PeriodAssignment, Record};
pub use domain::period_service::{EngineSummary, PeriodService};
pub use domain::period_store::PeriodStore;
pub use storage::{JsonFileStorage, MemoryStorage, Storage};
