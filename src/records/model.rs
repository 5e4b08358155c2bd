use chrono::NaiveDate;
use serde::Serialize;

/// One clinical transaction as loaded from the records source.
///
/// Monetary fields are already coerced to numbers (missing cells are 0);
/// the two flag fields stay as free text because their interpretation is a
/// business rule, not an input-cleaning concern.
#[derive(Debug, Clone, Serialize)]
pub struct BillingRecord {
    pub date: Option<NaiveDate>,
    pub patient: String,
    pub procedure: String,
    pub insurance_payment: f64,
    pub private_payment: f64,
    /// Boolean-ish free text: was this patient referred by another doctor?
    pub referred: String,
    pub lab_cost: f64,
    pub expenses: f64,
    pub doctor: String,
    /// Boolean-ish free text: is the doctor paid a percentage of the total?
    pub percentage_mode: String,
    /// Pay percentage 0-100; None when absent or unparseable.
    pub pay_percentage: Option<f64>,
    pub tariff_amount: f64,
    pub referring_doctor: Option<String>,
}

/// The derived monetary block for one record, produced by the rule
/// evaluator. Every field is non-negative except `clinic_income`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payout {
    pub total_payment: f64,
    pub insurer_surcharge: f64,
    pub referrer_payment: f64,
    pub doctor_payment: f64,
    pub retention: f64,
    pub lab_deduction: f64,
    pub expense_deduction: f64,
    pub costs: f64,
    pub clinic_income: f64,
    pub profitability_pct: f64,
    pub final_payout: f64,
}

/// A record paired with its computed payout.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: BillingRecord,
    #[serde(flatten)]
    pub payout: Payout,
}

/// The loaded record set handed to the engine.
///
/// `has_date_column` distinguishes "the source has no date column at all"
/// (date filtering is a no-op) from "this row's date failed to parse"
/// (the row is excluded by a date filter).
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<BillingRecord>,
    pub has_date_column: bool,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
