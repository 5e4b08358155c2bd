use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("Config directory not found at {0}. Run 'docpay init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Records file not found: {0}")]
    DataFileNotFound(PathBuf),

    #[error("Failed to fetch records from {url}: {reason}")]
    DataFetch { url: String, reason: String },

    #[error("Failed to read records from {path}: {source}")]
    CsvParse {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid {flag} date '{value}'. Expected YYYY-MM-DD.")]
    InvalidDate { flag: String, value: String },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Failed to export records to {path}: {reason}")]
    Export { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PayoutError>;
