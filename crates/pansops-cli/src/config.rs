//! CLI configuration from environment.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// CSV holding the "OAS constants" section, used when a request carries none.
    pub oas_table: Option<PathBuf>,
    pub pretty: bool,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            oas_table: lookup("PANSOPS_OAS_TABLE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            pretty: lookup("PANSOPS_PRETTY").map(|s| flag(&s)).unwrap_or(false),
            log_json: lookup("PANSOPS_LOG_JSON").map(|s| flag(&s)).unwrap_or(false),
        }
    }
}

fn flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
