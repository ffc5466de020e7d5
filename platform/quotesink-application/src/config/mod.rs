use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com/api/v3";
pub const DEFAULT_TABLE: &str = "binance_24hr_ticker_data";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a run needs, injected at construction time. There are no
/// module-level connection constants; stages only see what the caller
/// resolved here, so tests can swap in fakes freely.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub api: ApiConfig,
    pub db: DbConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base path of the exchange REST API, e.g. `https://api.binance.com/api/v3`.
    pub base_url: Option<String>,
    /// Outbound request timeout. Always finite; unbounded hangs are not an option.
    pub timeout_secs: Option<u64>,
    /// Optional pause between per-symbol requests, in milliseconds.
    pub request_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    pub url: String,
    pub table: Option<String>,
}

impl PipelineConfig {
    pub fn base_url(&self) -> &str {
        self.api.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn request_delay_ms(&self) -> u64 {
        self.api.request_delay_ms.unwrap_or(0)
    }

    pub fn table(&self) -> &str {
        self.db.table.as_deref().unwrap_or(DEFAULT_TABLE)
    }
}

pub fn load_config(path: &Path) -> Result<PipelineConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))
}
