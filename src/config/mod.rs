mod settings;

pub use settings::{Clinic, Config, DataSettings};

use crate::error::{PayoutError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.docpay/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "docpay") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.docpay/
    let home = dirs_home().ok_or_else(|| {
        PayoutError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".docpay"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs_home() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Resolve the configured records source. URLs pass through; relative
/// paths are taken from the config directory.
pub fn resolve_source(source: &str, config_dir: &Path) -> String {
    if source.starts_with("http://") || source.starts_with("https://") {
        return source.to_string();
    }
    let path = expand_path(source);
    if path.is_absolute() {
        path.display().to_string()
    } else {
        config_dir.join(path).display().to_string()
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &PathBuf) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(PayoutError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| PayoutError::ConfigParse { path, source: e })
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[clinic]
name = "Your Clinic Name"
currency_symbol = "$"

[data]
# Where billing records come from: a CSV file (absolute, ~/ or relative
# to this directory) or a published spreadsheet CSV URL, e.g.
#   https://docs.google.com/spreadsheets/d/<sheet-id>/export?format=csv
source = "records.csv"
"#;

/// Sample records written by 'docpay init' so every command works before a
/// real source is configured.
pub const RECORDS_TEMPLATE: &str = "\
date,patient,procedure,insurance_payment,private_payment,referred,lab_cost,expenses,doctor,percentage_mode,pay_percentage,tariff_amount,referring_doctor
2026-01-10,Maria Gomez,Cleaning,100,0,si,10,5,Dr. Smith,si,50,0,Dr. Jones
2026-01-15,Juan Perez,Extraction,0,200,no,0,0,Dr. Smith,no,,80,
2026-02-01,Ana Diaz,Whitening,150,50,si,20,0,Dr. Lee,si,,0,Dr. Jones
";
