use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use csv::ReaderBuilder;

use crate::config::expand_path;
use crate::error::{PayoutError, Result};
use crate::records::{BillingRecord, Snapshot};

/// Accepted date layouts, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// A loaded snapshot plus the per-cell warnings produced while coercing
/// malformed values. A bad cell downgrades to the documented default and
/// is reported here; it never aborts the load.
#[derive(Debug)]
pub struct LoadReport {
    pub snapshot: Snapshot,
    pub warnings: Vec<String>,
}

/// Load billing records from the configured source: a local CSV path
/// (with `~` expansion) or an `http(s)://` URL such as a published
/// spreadsheet's CSV export.
pub fn load(source: &str) -> Result<LoadReport> {
    let raw = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_remote(source)?
    } else {
        let path = expand_path(source);
        if !path.exists() {
            return Err(PayoutError::DataFileNotFound(path));
        }
        std::fs::read_to_string(&path)?
    };

    parse_records(&raw, source)
}

/// Fetch a remote CSV body with a bounded timeout.
fn fetch_remote(url: &str) -> Result<String> {
    use ureq::Agent;

    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(10)))
        .build()
        .into();

    let mut response = agent.get(url).call().map_err(|e| PayoutError::DataFetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    response
        .body_mut()
        .read_to_string()
        .map_err(|e| PayoutError::DataFetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Parse CSV text into a snapshot.
///
/// Headers are normalized (trimmed, lowercased, spaces to underscores)
/// before matching, so "Insurance Payment" and "insurance_payment" are the
/// same column. Missing columns degrade to defaults rather than failing.
pub fn parse_records(raw: &str, source: &str) -> Result<LoadReport> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers = reader.headers().map_err(|e| PayoutError::CsvParse {
        path: source.to_string(),
        source: e,
    })?;

    let columns: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header(name), idx))
        .collect();

    let has_date_column = columns.contains_key("date");

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (idx, row) in reader.records().enumerate() {
        // Data rows start at line 2, after the header.
        let line = idx + 2;

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warnings.push(format!("line {line}: skipped unreadable row ({e})"));
                continue;
            }
        };

        let insurance_payment = parse_money(
            cell(&columns, &row, "insurance_payment"),
            "insurance_payment",
            line,
            &mut warnings,
        );
        let private_payment = parse_money(
            cell(&columns, &row, "private_payment"),
            "private_payment",
            line,
            &mut warnings,
        );
        let lab_cost = parse_money(cell(&columns, &row, "lab_cost"), "lab_cost", line, &mut warnings);
        let expenses = parse_money(cell(&columns, &row, "expenses"), "expenses", line, &mut warnings);
        let tariff_amount = parse_money(
            cell(&columns, &row, "tariff_amount"),
            "tariff_amount",
            line,
            &mut warnings,
        );

        let pay_percentage =
            parse_percentage(cell(&columns, &row, "pay_percentage"), line, &mut warnings);
        let date = parse_date(cell(&columns, &row, "date"), line, &mut warnings);

        let referring_doctor = match cell(&columns, &row, "referring_doctor") {
            "" => None,
            name => Some(name.to_string()),
        };

        records.push(BillingRecord {
            date,
            patient: cell(&columns, &row, "patient").to_string(),
            procedure: cell(&columns, &row, "procedure").to_string(),
            insurance_payment,
            private_payment,
            referred: cell(&columns, &row, "referred").to_string(),
            lab_cost,
            expenses,
            doctor: cell(&columns, &row, "doctor").to_string(),
            percentage_mode: cell(&columns, &row, "percentage_mode").to_string(),
            pay_percentage,
            tariff_amount,
            referring_doctor,
        });
    }

    Ok(LoadReport {
        snapshot: Snapshot {
            records,
            has_date_column,
        },
        warnings,
    })
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Trimmed cell value for a named column; empty when the column is absent
/// or the row is short.
fn cell<'r>(columns: &HashMap<String, usize>, row: &'r csv::StringRecord, name: &str) -> &'r str {
    columns
        .get(name)
        .and_then(|&col| row.get(col))
        .unwrap_or("")
        .trim()
}

/// Coerce a currency cell: `$` and thousands separators stripped, empty
/// means 0, anything unparseable means 0 with a warning.
fn parse_money(cell: &str, column: &str, line: usize, warnings: &mut Vec<String>) -> f64 {
    let cleaned = cell.replace('$', "").replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            warnings.push(format!("line {line}: unreadable {column} '{cell}', using 0"));
            0.0
        }
    }
}

/// Coerce a pay-percentage cell ("50", "50%", blank). None when absent or
/// unparseable; the evaluator then applies its 50% default.
fn parse_percentage(cell: &str, line: usize, warnings: &mut Vec<String>) -> Option<f64> {
    let cleaned = cell.replace('%', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warnings.push(format!(
                "line {line}: unreadable pay_percentage '{cell}', using the 50% default"
            ));
            None
        }
    }
}

fn parse_date(cell: &str, line: usize, warnings: &mut Vec<String>) -> Option<NaiveDate> {
    if cell.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cell, format) {
            return Some(date);
        }
    }
    warnings.push(format!("line {line}: unreadable date '{cell}'"));
    None
}
