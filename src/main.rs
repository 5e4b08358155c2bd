mod config;
mod engine;
mod error;
mod records;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use crate::config::{config_dir, load_config, resolve_source, Clinic, CONFIG_TEMPLATE, RECORDS_TEMPLATE};
use crate::engine::{
    assemble, compute_totals, evaluate_all, filter, summarize_doctors, summarize_referrers,
};
use crate::error::{PayoutError, Result};
use crate::records::{export, load, EnrichedRecord, Snapshot};

#[derive(Parser)]
#[command(name = "docpay")]
#[command(version, about = "CLI payout calculator for clinic billing records", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.docpay or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Records source (CSV path or URL), overriding the configured one
    #[arg(short, long, global = true)]
    input: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template and sample records
    Init,

    /// Show configuration and a summary of the loaded records
    Status,

    /// Show global payout totals
    Totals {
        /// Only records on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only records on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only records paid to this doctor
        #[arg(short, long)]
        doctor: Option<String>,
    },

    /// Summarize payouts per doctor
    Doctors {
        /// Only records on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only records on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Summarize payouts per referring doctor
    Referrers {
        /// Only records on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only records on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// List enriched records, optionally exporting them
    Records {
        /// Only records on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only records on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only records paid to this doctor
        #[arg(short, long)]
        doctor: Option<String>,

        /// Write the enriched records to this file (.csv or .json)
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Print a payout statement grouped by patient and procedure
    Report {
        /// Doctor to report on, or "all"
        #[arg(short, long, default_value = "all")]
        doctor: String,

        /// Only records on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only records on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir, cli.input.as_deref()),
        Commands::Totals { from, to, doctor } => {
            cmd_totals(&cfg_dir, cli.input.as_deref(), from, to, doctor)
        }
        Commands::Doctors { from, to } => cmd_doctors(&cfg_dir, cli.input.as_deref(), from, to),
        Commands::Referrers { from, to } => {
            cmd_referrers(&cfg_dir, cli.input.as_deref(), from, to)
        }
        Commands::Records {
            from,
            to,
            doctor,
            export,
        } => cmd_records(&cfg_dir, cli.input.as_deref(), from, to, doctor, export),
        Commands::Report { doctor, from, to } => {
            cmd_report(&cfg_dir, cli.input.as_deref(), &doctor, from, to)
        }
    }
}

/// Initialize config directory with a template and sample records
fn cmd_init(cfg_dir: &PathBuf) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(PayoutError::AlreadyInitialized(cfg_dir.clone()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(cfg_dir.join("records.csv"), RECORDS_TEMPLATE)?;

    println!("Initialized docpay config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your clinic details:   $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Point [data].source at your records CSV or spreadsheet URL"
    );
    println!();
    println!("Then try it on the bundled sample data:");
    println!("  docpay totals");
    println!("  docpay report --doctor \"Dr. Smith\"");

    Ok(())
}

/// The clinic settings plus the loaded snapshot every reporting command
/// starts from. Load warnings go to stderr so tables stay clean.
fn load_context(cfg_dir: &PathBuf, input: Option<&str>) -> Result<(Clinic, Snapshot)> {
    let (clinic, source) = match input {
        Some(source) => {
            // An explicit --input works without an initialized config.
            let clinic = match load_config(cfg_dir) {
                Ok(config) => config.clinic,
                Err(_) => Clinic {
                    name: "Clinic".to_string(),
                    currency_symbol: "$".to_string(),
                },
            };
            (clinic, source.to_string())
        }
        None => {
            if !cfg_dir.exists() {
                return Err(PayoutError::ConfigNotFound(cfg_dir.clone()));
            }
            let config = load_config(cfg_dir)?;
            let source = resolve_source(&config.data.source, cfg_dir);
            (config.clinic, source)
        }
    };

    let report = load(&source)?;
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }

    Ok((clinic, report.snapshot))
}

fn parse_date_arg(flag: &str, value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| PayoutError::InvalidDate {
                flag: flag.to_string(),
                value: s,
            })
        })
        .transpose()
}

/// Date-filter a snapshot, then drop records for other doctors if one was
/// requested.
fn filter_snapshot(
    snapshot: &Snapshot,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    doctor: Option<&str>,
) -> Snapshot {
    let filtered = filter::by_date(snapshot, from, to);
    match doctor {
        Some(name) => filter::by_doctor(&filtered, name),
        None => filtered,
    }
}

// Table row structs for tabled
#[derive(Tabled)]
struct DoctorRow {
    #[tabled(rename = "DOCTOR")]
    doctor: String,
    #[tabled(rename = "TO PAY")]
    to_pay: String,
    #[tabled(rename = "RETAINED")]
    retained: String,
    #[tabled(rename = "AVG PROFIT")]
    avg_profit: String,
    #[tabled(rename = "CLINIC INCOME")]
    clinic_income: String,
    #[tabled(rename = "PROCEDURES")]
    procedures: usize,
    #[tabled(rename = "PER PROCEDURE")]
    per_procedure: String,
}

#[derive(Tabled)]
struct ReferrerRow {
    #[tabled(rename = "REFERRER")]
    referrer: String,
    #[tabled(rename = "TO PAY")]
    to_pay: String,
    #[tabled(rename = "REFERRED INCOME")]
    referred_income: String,
    #[tabled(rename = "REFERRALS")]
    referrals: usize,
    #[tabled(rename = "% PAID")]
    pct_paid: String,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "PATIENT")]
    patient: String,
    #[tabled(rename = "PROCEDURE")]
    procedure: String,
    #[tabled(rename = "DOCTOR")]
    doctor: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "DOCTOR PAY")]
    doctor_pay: String,
    #[tabled(rename = "CLINIC")]
    clinic: String,
    #[tabled(rename = "PROFIT")]
    profit: String,
}

#[derive(Tabled)]
struct StatementDisplayRow {
    #[tabled(rename = "PATIENT")]
    patient: String,
    #[tabled(rename = "PROCEDURE")]
    procedure: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "LAB")]
    lab: String,
    #[tabled(rename = "EXPENSES")]
    expenses: String,
    #[tabled(rename = "RETENTION")]
    retention: String,
    #[tabled(rename = "TO PAY")]
    to_pay: String,
}

fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Format a money amount with two decimal places and thousands separators
fn format_amount(value: f64) -> String {
    let rounded = format!("{:.2}", value);
    let parts: Vec<&str> = rounded.split('.').collect();
    let whole = parts[0];
    let frac = parts[1];

    // Group digits in the whole part
    let negative = whole.starts_with('-');
    let digits = if negative { &whole[1..] } else { whole };
    let grouped = format_grouped_int(digits.parse::<i64>().unwrap_or(0));

    if negative {
        format!("-{}.{}", grouped, frac)
    } else {
        format!("{}.{}", grouped, frac)
    }
}

fn money(symbol: &str, value: f64) -> String {
    format!("{symbol}{}", format_amount(value))
}

/// Show configuration and a summary of the loaded records
fn cmd_status(cfg_dir: &PathBuf, input: Option<&str>) -> Result<()> {
    if input.is_none() && !cfg_dir.exists() {
        return Err(PayoutError::ConfigNotFound(cfg_dir.clone()));
    }

    println!("Docpay Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());

    let (clinic, snapshot) = load_context(cfg_dir, input)?;
    println!("Clinic:           {}", clinic.name);
    println!("Records:          {}", snapshot.len());

    let enriched = evaluate_all(&snapshot.records);
    let totals = compute_totals(&enriched);
    println!("Doctors:          {}", totals.distinct_doctors);

    if snapshot.has_date_column && !snapshot.is_empty() {
        let (min, max) = filter::date_bounds(&snapshot);
        println!("Date span:        {} to {}", min, max);
    }

    Ok(())
}

/// Show global payout totals
fn cmd_totals(
    cfg_dir: &PathBuf,
    input: Option<&str>,
    from: Option<String>,
    to: Option<String>,
    doctor: Option<String>,
) -> Result<()> {
    let from = parse_date_arg("--from", from)?;
    let to = parse_date_arg("--to", to)?;

    let (clinic, snapshot) = load_context(cfg_dir, input)?;
    let filtered = filter_snapshot(&snapshot, from, to, doctor.as_deref());
    let enriched = evaluate_all(&filtered.records);
    let totals = compute_totals(&enriched);

    let sym = &clinic.currency_symbol;

    println!("Payout Totals");
    println!("{}", "-".repeat(50));
    println!("Total income:       {}", money(sym, totals.total_income));
    println!("Doctor payments:    {}", money(sym, totals.doctor_payments));
    println!("Referrer payments:  {}", money(sym, totals.referrer_payments));
    println!("Retentions:         {}", money(sym, totals.retentions));
    println!("Lab costs:          {}", money(sym, totals.lab_costs));
    println!("Expenses:           {}", money(sym, totals.expenses));
    println!("Insurer surcharges: {}", money(sym, totals.insurer_surcharges));
    println!("Total costs:        {}", money(sym, totals.costs));
    println!("Clinic income:      {}", money(sym, totals.clinic_income));
    println!("Profitability:      {:.2}%", totals.profitability_pct);
    println!("Procedures:         {}", totals.procedures);
    println!("Doctors:            {}", totals.distinct_doctors);

    Ok(())
}

/// Summarize payouts per doctor
fn cmd_doctors(
    cfg_dir: &PathBuf,
    input: Option<&str>,
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let from = parse_date_arg("--from", from)?;
    let to = parse_date_arg("--to", to)?;

    let (clinic, snapshot) = load_context(cfg_dir, input)?;
    let filtered = filter_snapshot(&snapshot, from, to, None);
    let enriched = evaluate_all(&filtered.records);
    let summaries = summarize_doctors(&enriched);

    if summaries.is_empty() {
        println!("No records in the selected range.");
        return Ok(());
    }

    let sym = &clinic.currency_symbol;
    let rows: Vec<DoctorRow> = summaries
        .iter()
        .map(|s| DoctorRow {
            doctor: s.doctor.clone(),
            to_pay: money(sym, s.doctor_payments),
            retained: money(sym, s.retentions),
            avg_profit: format!("{:.2}%", s.mean_profitability_pct),
            clinic_income: money(sym, s.clinic_income),
            procedures: s.procedures,
            per_procedure: money(sym, s.payment_per_procedure),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// Summarize payouts per referring doctor
fn cmd_referrers(
    cfg_dir: &PathBuf,
    input: Option<&str>,
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let from = parse_date_arg("--from", from)?;
    let to = parse_date_arg("--to", to)?;

    let (clinic, snapshot) = load_context(cfg_dir, input)?;
    let filtered = filter_snapshot(&snapshot, from, to, None);
    let enriched = evaluate_all(&filtered.records);
    let summaries = summarize_referrers(&enriched);

    if summaries.is_empty() {
        println!("No referred patients in the selected range.");
        return Ok(());
    }

    let sym = &clinic.currency_symbol;
    let rows: Vec<ReferrerRow> = summaries
        .iter()
        .map(|s| ReferrerRow {
            referrer: s.referring_doctor.clone(),
            to_pay: money(sym, s.referrer_payments),
            referred_income: money(sym, s.referred_income),
            referrals: s.referrals,
            pct_paid: format!("{:.2}%", s.percentage_paid),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// List enriched records, optionally exporting them
fn cmd_records(
    cfg_dir: &PathBuf,
    input: Option<&str>,
    from: Option<String>,
    to: Option<String>,
    doctor: Option<String>,
    export_path: Option<PathBuf>,
) -> Result<()> {
    let from = parse_date_arg("--from", from)?;
    let to = parse_date_arg("--to", to)?;

    let (clinic, snapshot) = load_context(cfg_dir, input)?;
    let filtered = filter_snapshot(&snapshot, from, to, doctor.as_deref());
    let enriched = evaluate_all(&filtered.records);

    if enriched.is_empty() {
        println!("No records in the selected range.");
        return Ok(());
    }

    let sym = &clinic.currency_symbol;
    let rows: Vec<RecordRow> = enriched.iter().map(|r| record_row(r, sym)).collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!();
    println!("Total: {} records", enriched.len());

    if let Some(path) = export_path {
        export::export(&enriched, &path)?;
        println!("Exported {} records to {}", enriched.len(), path.display());
    }

    Ok(())
}

fn record_row(rec: &EnrichedRecord, sym: &str) -> RecordRow {
    RecordRow {
        date: rec
            .record
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        patient: rec.record.patient.clone(),
        procedure: rec.record.procedure.clone(),
        doctor: rec.record.doctor.clone(),
        total: money(sym, rec.payout.total_payment),
        doctor_pay: money(sym, rec.payout.doctor_payment),
        clinic: money(sym, rec.payout.clinic_income),
        profit: format!("{:.2}%", rec.payout.profitability_pct),
    }
}

/// Print a payout statement grouped by patient and procedure
fn cmd_report(
    cfg_dir: &PathBuf,
    input: Option<&str>,
    doctor: &str,
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let from = parse_date_arg("--from", from)?;
    let to = parse_date_arg("--to", to)?;

    let (clinic, snapshot) = load_context(cfg_dir, input)?;

    let doctor_filter = if doctor.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(doctor)
    };

    let Some(statement) = assemble(&snapshot, doctor_filter, from, to) else {
        println!("No records found for the given filters.");
        return Ok(());
    };

    // Header period defaults to the span of the data itself.
    let (min, max) = filter::date_bounds(&snapshot);
    let period_from = from.unwrap_or(min);
    let period_to = to.unwrap_or(max);

    println!("Payout statement - {}", clinic.name);
    println!(
        "Doctor: {}",
        statement.doctor.as_deref().unwrap_or("all doctors")
    );
    println!("Period: {} to {}", period_from, period_to);
    println!();

    let sym = &clinic.currency_symbol;
    let mut rows: Vec<StatementDisplayRow> = statement
        .rows
        .iter()
        .map(|r| StatementDisplayRow {
            patient: r.patient.clone(),
            procedure: r.procedure.clone(),
            total: money(sym, r.total_payment),
            lab: money(sym, r.lab_cost),
            expenses: money(sym, r.expenses),
            retention: money(sym, r.retention),
            to_pay: money(sym, r.final_payout),
        })
        .collect();

    rows.push(StatementDisplayRow {
        patient: "TOTAL".to_string(),
        procedure: String::new(),
        total: money(sym, statement.totals.total_payment),
        lab: money(sym, statement.totals.lab_cost),
        expenses: money(sym, statement.totals.expenses),
        retention: money(sym, statement.totals.retention),
        to_pay: money(sym, statement.totals.final_payout),
    });

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    println!();
    println!("Procedures: {}", statement.procedures);
    println!(
        "Total to pay: {}",
        money(sym, statement.totals.final_payout)
    );

    Ok(())
}
