use std::collections::HashSet;

use serde::Serialize;

use crate::records::EnrichedRecord;

/// The global metric set over a (possibly filtered) record set.
#[derive(Debug, Clone, Serialize)]
pub struct Totals {
    pub total_income: f64,
    pub doctor_payments: f64,
    pub referrer_payments: f64,
    pub retentions: f64,
    pub lab_costs: f64,
    pub expenses: f64,
    pub insurer_surcharges: f64,
    pub costs: f64,
    pub clinic_income: f64,
    /// Volume-weighted: sum(clinic income) / sum(total payment) * 100,
    /// not the mean of per-record percentages.
    pub profitability_pct: f64,
    pub procedures: usize,
    pub distinct_doctors: usize,
}

/// Sum the derived fields into the named totals.
pub fn compute_totals(records: &[EnrichedRecord]) -> Totals {
    let total_income: f64 = records.iter().map(|r| r.payout.total_payment).sum();
    let clinic_income: f64 = records.iter().map(|r| r.payout.clinic_income).sum();

    let profitability_pct = if total_income > 0.0 {
        clinic_income / total_income * 100.0
    } else {
        0.0
    };

    let doctors: HashSet<&str> = records.iter().map(|r| r.record.doctor.as_str()).collect();

    Totals {
        total_income,
        doctor_payments: records.iter().map(|r| r.payout.doctor_payment).sum(),
        referrer_payments: records.iter().map(|r| r.payout.referrer_payment).sum(),
        retentions: records.iter().map(|r| r.payout.retention).sum(),
        lab_costs: records.iter().map(|r| r.record.lab_cost).sum(),
        expenses: records.iter().map(|r| r.record.expenses).sum(),
        insurer_surcharges: records.iter().map(|r| r.payout.insurer_surcharge).sum(),
        costs: records.iter().map(|r| r.payout.costs).sum(),
        clinic_income,
        profitability_pct,
        procedures: records.len(),
        distinct_doctors: doctors.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluate_all;
    use crate::records::BillingRecord;

    fn tariff_record(doctor: &str, private: f64, tariff: f64) -> BillingRecord {
        BillingRecord {
            date: None,
            patient: "Patient".to_string(),
            procedure: "Procedure".to_string(),
            insurance_payment: 0.0,
            private_payment: private,
            referred: String::new(),
            lab_cost: 0.0,
            expenses: 0.0,
            doctor: doctor.to_string(),
            percentage_mode: String::new(),
            pay_percentage: None,
            tariff_amount: tariff,
            referring_doctor: None,
        }
    }

    #[test]
    fn sums_and_counts() {
        let records = vec![
            tariff_record("Dr. A", 100.0, 40.0),
            tariff_record("Dr. A", 200.0, 60.0),
            tariff_record("Dr. B", 300.0, 100.0),
        ];
        let enriched = evaluate_all(&records);
        let totals = compute_totals(&enriched);

        assert_eq!(totals.total_income, 600.0);
        assert_eq!(totals.retentions, 20.0);
        assert_eq!(totals.doctor_payments, 180.0);
        assert_eq!(totals.procedures, 3);
        assert_eq!(totals.distinct_doctors, 2);
    }

    #[test]
    fn empty_set_has_zero_profitability() {
        let totals = compute_totals(&[]);
        assert_eq!(totals.total_income, 0.0);
        assert_eq!(totals.profitability_pct, 0.0);
        assert_eq!(totals.procedures, 0);
    }

    #[test]
    fn weighted_profitability_differs_from_mean_on_skewed_data() {
        // A tiny record with high margin and a huge one with low margin:
        // the unweighted mean overstates the clinic's overall position.
        let records = vec![
            tariff_record("Dr. A", 10.0, 0.0),     // clinic keeps 100%
            tariff_record("Dr. B", 1000.0, 900.0), // clinic keeps 10%
        ];
        let enriched = evaluate_all(&records);
        let totals = compute_totals(&enriched);

        let mean_pct: f64 = enriched
            .iter()
            .map(|r| r.payout.profitability_pct)
            .sum::<f64>()
            / enriched.len() as f64;

        let clinic: f64 = enriched.iter().map(|r| r.payout.clinic_income).sum();
        let income: f64 = enriched.iter().map(|r| r.payout.total_payment).sum();
        assert!((totals.profitability_pct - clinic / income * 100.0).abs() < 1e-9);

        assert!((mean_pct - totals.profitability_pct).abs() > 1.0);
    }
}
