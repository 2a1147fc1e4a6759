//! Client configuration: timeouts, retry budget, backoff and the optional cache dir.
//!
//! Environment overrides:
//! - `MACROPANEL_TIMEOUT_SECS`
//! - `MACROPANEL_MAX_RETRIES`
//! - `MACROPANEL_BACKOFF_FACTOR`
//! - `MACROPANEL_CACHE_DIR`

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings for one [`Client`](crate::Client).
///
/// Each client owns its configuration; two clients with different timeouts or cache
/// directories can live side by side.
///
/// ```
/// # use macropanel_rs::ClientConfig;
/// let cfg = ClientConfig::default()
///     .with_max_retries(5)
///     .with_backoff_factor(2.0)
///     .with_cache_dir(".cache/eurostat");
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Total per-attempt request timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Attempts in total, including the first one.
    pub max_retries: u32,
    pub backoff_factor: f64,
    /// Length of one backoff "time unit" (the first delay).
    pub backoff_unit: Duration,
    /// Enables the disk cache when set.
    pub cache_dir: Option<PathBuf>,
    pub user_agent: String,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_factor: 1.5,
            backoff_unit: Duration::from_secs(1),
            cache_dir: None,
            user_agent: concat!("macropanel_rs/", env!("CARGO_PKG_VERSION")).into(),
            headers: vec![(
                "Accept".into(),
                "application/json, text/csv, text/plain, */*".into(),
            )],
        }
    }
}

// Environment variables understood by `from_env`.
pub const ENV_TIMEOUT_SECS: &str = "MACROPANEL_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "MACROPANEL_MAX_RETRIES";
pub const ENV_BACKOFF_FACTOR: &str = "MACROPANEL_BACKOFF_FACTOR";
pub const ENV_CACHE_DIR: &str = "MACROPANEL_CACHE_DIR";

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_dir = None;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Defaults overridden by `MACROPANEL_*` environment variables.
    ///
    /// ### Errors
    /// [`Error::Config`] when a variable does not parse or the result fails
    /// [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = v
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("{ENV_TIMEOUT_SECS}={v} is not a number")))?;
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(v) = lookup(ENV_MAX_RETRIES) {
            cfg.max_retries = v
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("{ENV_MAX_RETRIES}={v} is not a number")))?;
        }
        if let Some(v) = lookup(ENV_BACKOFF_FACTOR) {
            cfg.backoff_factor = v.trim().parse().map_err(|_| {
                Error::config(format!("{ENV_BACKOFF_FACTOR}={v} is not a number"))
            })?;
        }
        if let Some(v) = lookup(ENV_CACHE_DIR) {
            if !v.trim().is_empty() {
                cfg.cache_dir = Some(PathBuf::from(v.trim()));
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the retry loop cannot honour.
    ///
    /// ### Errors
    /// [`Error::Config`] for `max_retries == 0`, a negative or non-finite backoff
    /// factor, or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::config("max_retries must be at least 1"));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            return Err(Error::config(format!(
                "backoff_factor must be a finite, non-negative number (got {})",
                self.backoff_factor
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than zero"));
        }
        Ok(())
    }
}
