//! Runtime configuration, read from the environment (and `.env`, if present).

use std::env;

const DEFAULT_STORE_BUFFER: usize = 32;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the store's request channel.
    pub store_buffer: usize,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_buffer: DEFAULT_STORE_BUFFER,
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Loads `.env` and reads `INVENTORY_STORE_BUFFER` and
    /// `INVENTORY_LOG_LEVEL`. Absent or unparsable values fall back to the
    /// defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            store_buffer: lookup("INVENTORY_STORE_BUFFER")
                .and_then(|v| v.trim().parse().ok())
                .filter(|buffer: &usize| *buffer > 0)
                .unwrap_or(DEFAULT_STORE_BUFFER),
            log: LogConfig {
                default_filter: lookup("INVENTORY_LOG_LEVEL")
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            },
        }
    }
}
