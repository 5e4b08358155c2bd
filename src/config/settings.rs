use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub clinic: Clinic,
    pub data: DataSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Clinic {
    pub name: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DataSettings {
    /// Local CSV path (absolute, `~`-prefixed, or relative to the config
    /// directory) or an http(s) URL of a published CSV.
    pub source: String,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}
