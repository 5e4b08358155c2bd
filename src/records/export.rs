use std::path::Path;

use crate::error::{PayoutError, Result};
use crate::records::EnrichedRecord;

/// Column order of the CSV export. Raw fields first, derived fields after,
/// named exactly like the record fields so downstream tooling can rely on
/// stable identifiers.
pub const EXPORT_COLUMNS: [&str; 24] = [
    "date",
    "patient",
    "procedure",
    "insurance_payment",
    "private_payment",
    "referred",
    "lab_cost",
    "expenses",
    "doctor",
    "percentage_mode",
    "pay_percentage",
    "tariff_amount",
    "referring_doctor",
    "total_payment",
    "insurer_surcharge",
    "referrer_payment",
    "lab_deduction",
    "expense_deduction",
    "retention",
    "costs",
    "doctor_payment",
    "clinic_income",
    "profitability_pct",
    "final_payout",
];

/// Write enriched records to `path`; a `.json` extension selects JSON,
/// anything else gets the delimited export.
pub fn export(records: &[EnrichedRecord], path: &Path) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => write_json(records, path),
        _ => write_csv(records, path),
    }
}

fn export_err(path: &Path) -> impl Fn(csv::Error) -> PayoutError + '_ {
    move |e| PayoutError::Export {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// CSV with the stable header row; money cells carry two decimals.
pub fn write_csv(records: &[EnrichedRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(export_err(path))?;

    writer
        .write_record(EXPORT_COLUMNS)
        .map_err(export_err(path))?;

    for rec in records {
        let r = &rec.record;
        let p = &rec.payout;
        writer
            .write_record(&[
                r.date.map(|d| d.to_string()).unwrap_or_default(),
                r.patient.clone(),
                r.procedure.clone(),
                format!("{:.2}", r.insurance_payment),
                format!("{:.2}", r.private_payment),
                r.referred.clone(),
                format!("{:.2}", r.lab_cost),
                format!("{:.2}", r.expenses),
                r.doctor.clone(),
                r.percentage_mode.clone(),
                r.pay_percentage.map(|v| v.to_string()).unwrap_or_default(),
                format!("{:.2}", r.tariff_amount),
                r.referring_doctor.clone().unwrap_or_default(),
                format!("{:.2}", p.total_payment),
                format!("{:.2}", p.insurer_surcharge),
                format!("{:.2}", p.referrer_payment),
                format!("{:.2}", p.lab_deduction),
                format!("{:.2}", p.expense_deduction),
                format!("{:.2}", p.retention),
                format!("{:.2}", p.costs),
                format!("{:.2}", p.doctor_payment),
                format!("{:.2}", p.clinic_income),
                format!("{:.2}", p.profitability_pct),
                format!("{:.2}", p.final_payout),
            ])
            .map_err(export_err(path))?;
    }

    writer.flush()?;
    Ok(())
}

/// JSON array of enriched records, pretty-printed.
pub fn write_json(records: &[EnrichedRecord], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(records).map_err(|e| PayoutError::Export {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluate_all;
    use crate::records::loader::parse_records;

    fn sample() -> Vec<EnrichedRecord> {
        let csv = "date,patient,procedure,insurance_payment,private_payment,referred,lab_cost,expenses,doctor,percentage_mode,pay_percentage,tariff_amount,referring_doctor\n\
                   2026-01-10,Ana,Cleaning,100,0,si,10,5,Dr. A,si,50,0,Dr. B\n";
        let report = parse_records(csv, "test.csv").unwrap();
        evaluate_all(&report.snapshot.records)
    }

    #[test]
    fn csv_round_trips_with_stable_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_csv(&sample(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next().unwrap(), EXPORT_COLUMNS.join(","));

        let row = lines.next().unwrap();
        assert!(row.contains("22.50"), "doctor payment missing: {row}");
        assert!(row.contains("2.50"), "retention missing: {row}");
    }

    #[test]
    fn json_export_carries_derived_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_json(&sample(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed[0]["doctor_payment"], 22.5);
        assert_eq!(parsed[0]["patient"], "Ana");
    }
}
