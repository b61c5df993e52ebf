//! Configuration of the time entries demo.
//!
//! Loaded from environment variables with defaults for every setting.

use chrono::NaiveDate;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by an environment variable that is set but invalid
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The value could not be parsed
    #[error("Invalid value {value:?} for {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Demo configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    /// How long the stub loader takes per load
    pub load_delay: Duration,
    /// Bound on a single load
    pub load_timeout: Duration,
    /// Entries returned per load
    pub entries_per_load: usize,
    /// Probability that a stub load fails
    pub failure_rate: f64,
    /// Date shown at startup; `None` means today
    pub start_date: Option<NaiveDate>,
    /// `tracing` filter directives
    pub log_filter: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            load_delay: Duration::from_millis(300),
            load_timeout: Duration::from_secs(5),
            entries_per_load: 3,
            failure_rate: 0.0,
            start_date: None,
            log_filter: "time_entries=debug,reflux_runtime=debug".to_string(),
        }
    }
}

impl DemoConfig {
    /// Load configuration from environment variables
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `TIME_ENTRIES_LOAD_DELAY_MS` | 300 |
    /// | `TIME_ENTRIES_LOAD_TIMEOUT_MS` | 5000 |
    /// | `TIME_ENTRIES_PER_LOAD` | 3 |
    /// | `TIME_ENTRIES_FAILURE_RATE` | 0.0 |
    /// | `TIME_ENTRIES_START_DATE` (`YYYY-MM-DD`) | today |
    /// | `TIME_ENTRIES_LOG` | `RUST_LOG`, else `time_entries=debug,reflux_runtime=debug` |
    ///
    /// `TIME_ENTRIES_LOG` takes precedence over `RUST_LOG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is set to a value that
    /// doesn't parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup` instead of the process environment
    ///
    /// # Errors
    ///
    /// Same as [`DemoConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            load_delay: parse(&lookup, "TIME_ENTRIES_LOAD_DELAY_MS")?
                .map_or(defaults.load_delay, Duration::from_millis),
            load_timeout: parse(&lookup, "TIME_ENTRIES_LOAD_TIMEOUT_MS")?
                .map_or(defaults.load_timeout, Duration::from_millis),
            entries_per_load: parse(&lookup, "TIME_ENTRIES_PER_LOAD")?
                .unwrap_or(defaults.entries_per_load),
            failure_rate: parse_rate(&lookup, "TIME_ENTRIES_FAILURE_RATE")?
                .unwrap_or(defaults.failure_rate),
            start_date: parse(&lookup, "TIME_ENTRIES_START_DATE")?.or(defaults.start_date),
            log_filter: lookup("TIME_ENTRIES_LOG")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_filter),
        })
    }
}

fn parse<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            value.trim().parse().map_err(|error: T::Err| ConfigError::Invalid {
                name,
                reason: error.to_string(),
                value,
            })
        })
        .transpose()
}

fn parse_rate<F>(lookup: &F, name: &'static str) -> Result<Option<f64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse::<f64, F>(lookup, name)? {
        Some(rate) if !(0.0..=1.0).contains(&rate) => Err(ConfigError::Invalid {
            name,
            value: rate.to_string(),
            reason: "must be between 0 and 1".to_string(),
        }),
        rate => Ok(rate),
    }
}
