pub mod filter;

mod evaluator;
mod flag;
mod statement;
mod summary;
mod totals;

pub use evaluator::{evaluate, evaluate_all};
pub use flag::Flag;
pub use statement::{assemble, Statement, StatementRow, StatementTotals};
pub use summary::{summarize_doctors, summarize_referrers, DoctorSummary, ReferrerSummary};
pub use totals::{compute_totals, Totals};
