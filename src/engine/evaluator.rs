use crate::engine::flag::Flag;
use crate::records::{BillingRecord, EnrichedRecord, Payout};

/// Flat surcharge applied to the full payment whenever any part of it came
/// through an insurer.
const INSURER_SURCHARGE_RATE: f64 = 0.10;

/// Flat share of the full payment owed to the referring doctor.
const REFERRER_RATE: f64 = 0.10;

/// Withholding applied to the doctor's pre-retention payment in both pay
/// modes.
const RETENTION_RATE: f64 = 0.10;

/// Pay rate assumed when a percentage-mode record carries no usable
/// percentage.
const DEFAULT_PAY_RATE: f64 = 0.5;

/// Compute the full derived block for one record.
///
/// Pure function of the record: no state, no I/O, same output on every
/// call. The three 0.10 rates apply to three different bases (surcharge
/// and referrer share to the total payment, retention to the doctor's
/// post-deduction amount) — that asymmetry is the billing contract, not an
/// accident to normalize.
pub fn evaluate(record: &BillingRecord) -> Payout {
    let total_payment = record.insurance_payment + record.private_payment;

    let insurer_surcharge = if record.insurance_payment > 0.0 {
        total_payment * INSURER_SURCHARGE_RATE
    } else {
        0.0
    };

    let referrer_payment = if Flag::parse(&record.referred).is_yes() {
        total_payment * REFERRER_RATE
    } else {
        0.0
    };

    let (pre_retention, lab_deduction, expense_deduction) =
        if Flag::parse(&record.percentage_mode).is_yes() {
            let rate = record
                .pay_percentage
                .map(|pct| pct / 100.0)
                .unwrap_or(DEFAULT_PAY_RATE);
            let gross = total_payment * rate;
            let pre = (gross - record.lab_cost - record.expenses - insurer_surcharge).max(0.0);
            (pre, record.lab_cost, record.expenses)
        } else {
            // Tariff mode pays a fixed schedule amount; lab and expense
            // costs are not deducted from the doctor in this mode.
            let pre = (record.tariff_amount - insurer_surcharge).max(0.0);
            (pre, 0.0, 0.0)
        };

    let retention = pre_retention * RETENTION_RATE;
    let doctor_payment = pre_retention - retention;

    let costs = retention + lab_deduction + expense_deduction + insurer_surcharge;
    let clinic_income = total_payment - (doctor_payment + costs + referrer_payment);
    let profitability_pct = if total_payment > 0.0 {
        clinic_income / total_payment * 100.0
    } else {
        0.0
    };

    Payout {
        total_payment,
        insurer_surcharge,
        referrer_payment,
        doctor_payment,
        retention,
        lab_deduction,
        expense_deduction,
        costs,
        clinic_income,
        profitability_pct,
        final_payout: doctor_payment,
    }
}

/// Evaluate every record in order, pairing each with its payout.
pub fn evaluate_all(records: &[BillingRecord]) -> Vec<EnrichedRecord> {
    records
        .iter()
        .map(|record| EnrichedRecord {
            record: record.clone(),
            payout: evaluate(record),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BillingRecord {
        BillingRecord {
            date: None,
            patient: "Patient".to_string(),
            procedure: "Procedure".to_string(),
            insurance_payment: 0.0,
            private_payment: 0.0,
            referred: String::new(),
            lab_cost: 0.0,
            expenses: 0.0,
            doctor: "Dr. Test".to_string(),
            percentage_mode: String::new(),
            pay_percentage: None,
            tariff_amount: 0.0,
            referring_doctor: None,
        }
    }

    #[test]
    fn percentage_mode_with_deductions() {
        let mut rec = record();
        rec.insurance_payment = 100.0;
        rec.percentage_mode = "si".to_string();
        rec.pay_percentage = Some(50.0);
        rec.lab_cost = 10.0;
        rec.expenses = 5.0;

        let payout = evaluate(&rec);
        assert_eq!(payout.total_payment, 100.0);
        assert_eq!(payout.insurer_surcharge, 10.0);
        // gross 50, minus lab 10, expenses 5, surcharge 10 -> 25
        assert_eq!(payout.retention, 2.5);
        assert_eq!(payout.doctor_payment, 22.5);
        assert_eq!(payout.lab_deduction, 10.0);
        assert_eq!(payout.expense_deduction, 5.0);
        assert_eq!(payout.final_payout, 22.5);
    }

    #[test]
    fn tariff_mode_ignores_lab_and_expenses() {
        let mut rec = record();
        rec.private_payment = 300.0;
        rec.tariff_amount = 200.0;
        rec.lab_cost = 50.0;
        rec.expenses = 25.0;

        let payout = evaluate(&rec);
        assert_eq!(payout.insurer_surcharge, 0.0);
        assert_eq!(payout.retention, 20.0);
        assert_eq!(payout.doctor_payment, 180.0);
        assert_eq!(payout.lab_deduction, 0.0);
        assert_eq!(payout.expense_deduction, 0.0);
    }

    #[test]
    fn surcharge_only_when_insurance_paid() {
        let mut rec = record();
        rec.private_payment = 500.0;
        rec.tariff_amount = 100.0;
        assert_eq!(evaluate(&rec).insurer_surcharge, 0.0);

        rec.insurance_payment = 1.0;
        let payout = evaluate(&rec);
        assert!((payout.insurer_surcharge - 50.1).abs() < 1e-9);
    }

    #[test]
    fn referrer_share_requires_affirmative_flag() {
        let mut rec = record();
        rec.private_payment = 200.0;
        rec.referred = "sí".to_string();
        assert_eq!(evaluate(&rec).referrer_payment, 20.0);

        rec.referred = "no".to_string();
        assert_eq!(evaluate(&rec).referrer_payment, 0.0);

        rec.referred = "si claro".to_string();
        assert_eq!(evaluate(&rec).referrer_payment, 0.0);
    }

    #[test]
    fn missing_percentage_defaults_to_half() {
        let mut rec = record();
        rec.private_payment = 100.0;
        rec.percentage_mode = "yes".to_string();
        rec.pay_percentage = None;

        let payout = evaluate(&rec);
        // gross 50, no deductions, retention 5
        assert_eq!(payout.doctor_payment, 45.0);
    }

    #[test]
    fn deductions_floor_pre_retention_at_zero() {
        let mut rec = record();
        rec.private_payment = 100.0;
        rec.percentage_mode = "si".to_string();
        rec.pay_percentage = Some(10.0);
        rec.lab_cost = 40.0;

        let payout = evaluate(&rec);
        assert_eq!(payout.retention, 0.0);
        assert_eq!(payout.doctor_payment, 0.0);
        // deduction fields still report the raw costs
        assert_eq!(payout.lab_deduction, 40.0);
        // clinic income is total minus the recorded costs
        assert_eq!(payout.clinic_income, 60.0);
    }

    #[test]
    fn zero_total_has_zero_profitability() {
        let payout = evaluate(&record());
        assert_eq!(payout.total_payment, 0.0);
        assert_eq!(payout.profitability_pct, 0.0);
        assert!(payout.profitability_pct.is_finite());
    }

    #[test]
    fn total_is_sum_of_insurance_and_private() {
        let mut rec = record();
        rec.insurance_payment = 123.45;
        rec.private_payment = 76.55;
        assert!((evaluate(&rec).total_payment - 200.0).abs() < 1e-9);
    }

    #[test]
    fn retention_is_tenth_of_pre_retention() {
        let mut rec = record();
        rec.private_payment = 80.0;
        rec.percentage_mode = "si".to_string();

        let payout = evaluate(&rec);
        let pre_retention = payout.doctor_payment + payout.retention;
        assert!((payout.retention - pre_retention * 0.10).abs() < 1e-9);
        assert!(payout.retention <= pre_retention);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let mut rec = record();
        rec.insurance_payment = 150.0;
        rec.private_payment = 50.0;
        rec.referred = "si".to_string();
        rec.percentage_mode = "si".to_string();
        rec.pay_percentage = Some(60.0);
        rec.lab_cost = 12.0;

        assert_eq!(evaluate(&rec), evaluate(&rec));
    }
}
