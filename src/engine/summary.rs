use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::Serialize;

use crate::engine::flag::Flag;
use crate::records::EnrichedRecord;

/// One row of the per-doctor summary table.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorSummary {
    pub doctor: String,
    pub doctor_payments: f64,
    pub retentions: f64,
    /// Unweighted mean of per-record profitability: "how does an average
    /// case for this doctor perform", unlike the volume-weighted figure in
    /// the global totals.
    pub mean_profitability_pct: f64,
    pub clinic_income: f64,
    pub procedures: usize,
    pub payment_per_procedure: f64,
}

/// One row of the per-referrer summary table.
#[derive(Debug, Clone, Serialize)]
pub struct ReferrerSummary {
    pub referring_doctor: String,
    pub referrer_payments: f64,
    pub referred_income: f64,
    pub referrals: usize,
    /// referrer payments / referred income * 100, rounded to 2 decimals.
    pub percentage_paid: f64,
}

#[derive(Default)]
struct DoctorAcc {
    payments: f64,
    retentions: f64,
    profitability_sum: f64,
    clinic_income: f64,
    count: usize,
}

/// Group records by paying doctor, sorted by total payment descending.
///
/// Groups keep first-seen insertion order, so doctors tied on payment stay
/// in their original relative order after the stable sort.
pub fn summarize_doctors(records: &[EnrichedRecord]) -> Vec<DoctorSummary> {
    let mut groups: IndexMap<String, DoctorAcc> = IndexMap::new();

    for rec in records {
        let acc = groups.entry(rec.record.doctor.clone()).or_default();
        acc.payments += rec.payout.doctor_payment;
        acc.retentions += rec.payout.retention;
        acc.profitability_sum += rec.payout.profitability_pct;
        acc.clinic_income += rec.payout.clinic_income;
        acc.count += 1;
    }

    let mut rows: Vec<DoctorSummary> = groups
        .into_iter()
        .map(|(doctor, acc)| {
            // count is always >= 1 here; the max(1) keeps the division
            // total even if an empty group ever slips through.
            let divisor = acc.count.max(1) as f64;
            DoctorSummary {
                doctor,
                doctor_payments: acc.payments,
                retentions: acc.retentions,
                mean_profitability_pct: acc.profitability_sum / divisor,
                clinic_income: acc.clinic_income,
                procedures: acc.count,
                payment_per_procedure: acc.payments / divisor,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.doctor_payments
            .partial_cmp(&a.doctor_payments)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

#[derive(Default)]
struct ReferrerAcc {
    payments: f64,
    income: f64,
    count: usize,
}

/// Group referred records by referring doctor, sorted by payment descending.
///
/// A record only counts when its referred flag is affirmative AND its
/// computed referrer payment is positive AND it names a referring doctor;
/// an empty result is a valid outcome, not an error.
pub fn summarize_referrers(records: &[EnrichedRecord]) -> Vec<ReferrerSummary> {
    let mut groups: IndexMap<String, ReferrerAcc> = IndexMap::new();

    for rec in records {
        if !Flag::parse(&rec.record.referred).is_yes() || rec.payout.referrer_payment <= 0.0 {
            continue;
        }
        let Some(referrer) = rec.record.referring_doctor.as_deref() else {
            continue;
        };
        if referrer.trim().is_empty() {
            continue;
        }

        let acc = groups.entry(referrer.to_string()).or_default();
        acc.payments += rec.payout.referrer_payment;
        acc.income += rec.payout.total_payment;
        acc.count += 1;
    }

    let mut rows: Vec<ReferrerSummary> = groups
        .into_iter()
        .map(|(referring_doctor, acc)| {
            let percentage_paid = if acc.income > 0.0 {
                (acc.payments / acc.income * 100.0 * 100.0).round() / 100.0
            } else {
                0.0
            };
            ReferrerSummary {
                referring_doctor,
                referrer_payments: acc.payments,
                referred_income: acc.income,
                referrals: acc.count,
                percentage_paid,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.referrer_payments
            .partial_cmp(&a.referrer_payments)
            .unwrap_or(Ordering::Equal)
    });
    rows
}
