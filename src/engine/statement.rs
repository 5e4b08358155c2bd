use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::engine::{evaluate_all, filter};
use crate::records::Snapshot;

/// One detail line of the payout statement: all records for the same
/// patient and procedure, summed.
#[derive(Debug, Clone, Serialize)]
pub struct StatementRow {
    pub patient: String,
    pub procedure: String,
    pub total_payment: f64,
    pub lab_cost: f64,
    pub expenses: f64,
    pub retention: f64,
    pub final_payout: f64,
}

/// The grand-total row over the whole filtered set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatementTotals {
    pub total_payment: f64,
    pub lab_cost: f64,
    pub expenses: f64,
    pub retention: f64,
    pub final_payout: f64,
}

/// Everything a renderer needs for one printable statement.
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    /// None means the statement covers all doctors.
    pub doctor: Option<String>,
    pub rows: Vec<StatementRow>,
    pub totals: StatementTotals,
    pub procedures: usize,
}

/// Build the statement for a doctor (or all) over a date range.
///
/// Returns None when the filtered set is empty — nothing to render.
pub fn assemble(
    snapshot: &Snapshot,
    doctor: Option<&str>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Option<Statement> {
    let filtered = filter::by_date(snapshot, from, to);
    let filtered = match doctor {
        Some(name) => filter::by_doctor(&filtered, name),
        None => filtered,
    };

    if filtered.is_empty() {
        return None;
    }

    let enriched = evaluate_all(&filtered.records);

    let mut groups: BTreeMap<(String, String), StatementTotals> = BTreeMap::new();
    let mut totals = StatementTotals::default();

    for rec in &enriched {
        let key = (rec.record.patient.clone(), rec.record.procedure.clone());
        let group = groups.entry(key).or_default();

        group.total_payment += rec.payout.total_payment;
        group.lab_cost += rec.record.lab_cost;
        group.expenses += rec.record.expenses;
        group.retention += rec.payout.retention;
        group.final_payout += rec.payout.final_payout;

        totals.total_payment += rec.payout.total_payment;
        totals.lab_cost += rec.record.lab_cost;
        totals.expenses += rec.record.expenses;
        totals.retention += rec.payout.retention;
        totals.final_payout += rec.payout.final_payout;
    }

    let rows = groups
        .into_iter()
        .map(|((patient, procedure), sums)| StatementRow {
            patient,
            procedure,
            total_payment: sums.total_payment,
            lab_cost: sums.lab_cost,
            expenses: sums.expenses,
            retention: sums.retention,
            final_payout: sums.final_payout,
        })
        .collect();

    Some(Statement {
        doctor: doctor.map(str::to_string),
        rows,
        totals,
        procedures: enriched.len(),
    })
}
