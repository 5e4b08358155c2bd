pub mod config;
pub mod engine;
pub mod error;
pub mod records;

pub use engine::{DoctorSummary, ReferrerSummary, Statement, Totals};
pub use error::{PayoutError, Result};
pub use records::{BillingRecord, EnrichedRecord, Payout, Snapshot};
