//! Client configuration and dashboard defaults

use crate::error::{ForecastError, Result};
use crate::window::TimeRange;
use std::time::Duration;

/// Environment variable holding the API origin
pub const ENV_API_DOMAIN: &str = "FORECAST_API_DOMAIN";
/// Environment variable holding the API path prefix
pub const ENV_API_PREFIX: &str = "FORECAST_API_PREFIX";
/// Environment variable holding the request timeout in seconds
pub const ENV_API_TIMEOUT_SECS: &str = "FORECAST_API_TIMEOUT_SECS";

/// Where and how to reach the dashboard API
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Origin, e.g. `http://localhost:8000`
    pub api_domain: String,
    /// Path prefix shared by every route
    pub api_prefix: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_domain: "http://localhost:8000".to_string(),
            api_prefix: "/levelsliving/app/api/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by whichever `FORECAST_API_*` variables are set
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(domain) = lookup(ENV_API_DOMAIN) {
            config.api_domain = domain.trim_end_matches('/').to_string();
        }
        if let Some(prefix) = lookup(ENV_API_PREFIX) {
            config.api_prefix = prefix;
        }
        if let Some(secs) = lookup(ENV_API_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ForecastError::InvalidParameter(format!(
                    "{ENV_API_TIMEOUT_SECS} must be a whole number of seconds, got '{secs}'"
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Absolute URL for a route below the prefix
    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.api_domain, self.api_prefix, path)
    }
}

/// Initial control values of the forecast charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardDefaults {
    /// Months forecast when a chart opens
    pub horizon: usize,
    /// Largest horizon the controls offer
    pub max_horizon: usize,
    /// Window shown when a chart opens
    pub time_range: TimeRange,
}

impl Default for DashboardDefaults {
    fn default() -> Self {
        Self {
            horizon: 2,
            max_horizon: 12,
            time_range: TimeRange::SixMonths,
        }
    }
}

impl DashboardDefaults {
    /// Keep a requested horizon inside `1..=max_horizon`; 0 stays 0
    pub fn clamp_horizon(&self, horizon: usize) -> usize {
        horizon.min(self.max_horizon)
    }
}
