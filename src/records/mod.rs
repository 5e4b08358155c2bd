pub mod export;
pub mod loader;

mod model;

pub use loader::{load, LoadReport};
pub use model::{BillingRecord, EnrichedRecord, Payout, Snapshot};
