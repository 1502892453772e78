use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{Result, SentinelError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Payment service endpoints
    pub api_base: String,
    pub events_url: String,
    pub request_timeout_ms: u64,

    // Risk pipeline
    pub debounce_ms: u64,
    pub risk_block_threshold: u8,

    // Transaction flow
    pub min_processing_ms: u64,

    // Monitor feed
    pub monitor_poll_interval_ms: u64,

    // Reconciliation stream
    pub reconnect_delay_ms: u64,

    // Local state
    pub state_dir: String,

    // Geolocation probe (unset means the platform has no location source)
    pub geo_probe_url: Option<String>,
    pub geo_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: "http://localhost:8000".to_string(),
            events_url: "ws://localhost:8000/events".to_string(),
            request_timeout_ms: 5_000,
            debounce_ms: 800,
            risk_block_threshold: 80,
            min_processing_ms: 1_500,
            monitor_poll_interval_ms: 2_000,
            reconnect_delay_ms: 5_000,
            state_dir: ".pay-sentinel".to_string(),
            geo_probe_url: None,
            geo_timeout_ms: 3_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        Ok(Config {
            api_base: env::var("PAY_API_BASE").unwrap_or(defaults.api_base),

            events_url: env::var("PAY_EVENTS_URL").unwrap_or(defaults.events_url),

            request_timeout_ms: parse_env("PAY_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms)?,

            debounce_ms: parse_env("PAY_RISK_DEBOUNCE_MS", defaults.debounce_ms)?,

            risk_block_threshold: parse_env(
                "PAY_RISK_BLOCK_THRESHOLD",
                defaults.risk_block_threshold,
            )?,

            min_processing_ms: parse_env("PAY_MIN_PROCESSING_MS", defaults.min_processing_ms)?,

            monitor_poll_interval_ms: parse_env(
                "PAY_MONITOR_POLL_INTERVAL_MS",
                defaults.monitor_poll_interval_ms,
            )?,

            reconnect_delay_ms: parse_env("PAY_RECONNECT_DELAY_MS", defaults.reconnect_delay_ms)?,

            state_dir: env::var("PAY_STATE_DIR").unwrap_or(defaults.state_dir),

            geo_probe_url: env::var("PAY_GEO_PROBE_URL").ok(),

            geo_timeout_ms: parse_env("PAY_GEO_TIMEOUT_MS", defaults.geo_timeout_ms)?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| SentinelError::Config(format!("{key}: {e}"))),
        Err(_) => Ok(default),
    }
}
