//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The SMS auth token is loaded from the TWILIO_AUTH_TOKEN env var or
//! auth_token_file, never stored in the TOML directly to avoid leaking
//! secrets. Every numeric range is validated here so a bad config fails the
//! process before any polling begins.

use common::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub poll: PollConfig,
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    pub sms: SmsConfig,
}

/// Upstream availability API settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub endpoint: String,
    /// Keys in priority order; the first unfrozen key is used each cycle
    pub keys: Vec<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// How long a key stays frozen after a 429
    #[serde(default = "default_freeze")]
    pub freeze_secs: u64,
}

/// Poll cadence settings. Each cycle draws a fresh delay uniformly from
/// `[min_interval_secs, max_interval_secs]`.
#[derive(Debug, Deserialize)]
pub struct PollConfig {
    pub min_interval_secs: u64,
    pub max_interval_secs: u64,
    /// Send one "service started" SMS before the loop begins
    #[serde(default = "default_true")]
    pub startup_notification: bool,
}

/// Quiet-hours window in a fixed reference offset from UTC.
///
/// Polling is suppressed while the local hour is in
/// `[quiet_start_hour, quiet_end_hour)`. Equal start and end means no quiet
/// window.
#[derive(Debug, Deserialize)]
pub struct ScheduleConfig {
    pub utc_offset_hours: i8,
    pub quiet_start_hour: u8,
    pub quiet_end_hour: u8,
}

/// Match criteria for polled records
#[derive(Debug, Default, Deserialize)]
pub struct FilterConfig {
    /// Case-insensitive substring of the location label; absent matches all
    #[serde(default)]
    pub location_contains: Option<String>,
    /// Only records starting strictly before this date match; absent disables
    /// the date bound
    #[serde(default)]
    pub before_date: Option<chrono::NaiveDate>,
}

/// SMS provider settings. The auth token never lives in the TOML.
#[derive(Debug, Deserialize)]
pub struct SmsConfig {
    pub account_sid: String,
    pub from: String,
    pub to: String,
    #[serde(skip)]
    pub auth_token: Option<Secret<String>>,
    /// Path to a file containing the auth token (alternative to the
    /// TWILIO_AUTH_TOKEN env var)
    #[serde(default)]
    pub auth_token_file: Option<PathBuf>,
}

fn default_timeout() -> u64 {
    30
}

fn default_freeze() -> u64 {
    3 * 60 * 60
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Auth token resolution order:
    /// 1. TWILIO_AUTH_TOKEN env var
    /// 2. auth_token_file path from config
    ///
    /// A config that passes this function is safe to run with; anything
    /// invalid aborts startup with a message naming the offending field.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.api.endpoint.starts_with("http://")
            && !config.api.endpoint.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "api.endpoint must start with http:// or https://, got: {}",
                config.api.endpoint
            )));
        }

        if config.api.keys.is_empty() {
            return Err(common::Error::Config(
                "api.keys must list at least one key".into(),
            ));
        }
        if config.api.keys.iter().any(|k| k.trim().is_empty()) {
            return Err(common::Error::Config(
                "api.keys must not contain empty entries".into(),
            ));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        if config.poll.min_interval_secs == 0 {
            return Err(common::Error::Config(
                "poll.min_interval_secs must be greater than 0".into(),
            ));
        }
        if config.poll.min_interval_secs > config.poll.max_interval_secs {
            return Err(common::Error::Config(format!(
                "poll.min_interval_secs ({}) must not exceed poll.max_interval_secs ({})",
                config.poll.min_interval_secs, config.poll.max_interval_secs
            )));
        }

        if !(-12..=14).contains(&config.schedule.utc_offset_hours) {
            return Err(common::Error::Config(format!(
                "schedule.utc_offset_hours must be between -12 and 14, got: {}",
                config.schedule.utc_offset_hours
            )));
        }
        if config.schedule.quiet_start_hour >= 24 || config.schedule.quiet_end_hour >= 24 {
            return Err(common::Error::Config(
                "schedule quiet hours must be between 0 and 23".into(),
            ));
        }

        for (field, value) in [
            ("sms.account_sid", &config.sms.account_sid),
            ("sms.from", &config.sms.from),
            ("sms.to", &config.sms.to),
        ] {
            if value.trim().is_empty() {
                return Err(common::Error::Config(format!("{field} must not be empty")));
            }
        }

        // Resolve auth token: env var takes precedence over file
        if let Ok(token) = std::env::var("TWILIO_AUTH_TOKEN") {
            config.sms.auth_token = Some(Secret::new(token));
        } else if let Some(ref token_file) = config.sms.auth_token_file {
            let token = std::fs::read_to_string(token_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read auth_token_file {}: {e}",
                    token_file.display()
                ))
            })?;
            let token = token.trim().to_owned();
            if !token.is_empty() {
                config.sms.auth_token = Some(Secret::new(token));
            }
        }

        if config.sms.auth_token.is_none() {
            return Err(common::Error::Config(
                "SMS auth token missing — set TWILIO_AUTH_TOKEN or sms.auth_token_file".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("slot-watcher.toml")
    }
}
