//! Configuration management for the vigia monitor
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Configuration is loaded once before the monitor
//! starts and never reloaded during the run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{Applicant, Target};

/// Default portal origin; the workflow entry path lives in the navigator
pub const DEFAULT_PORTAL_URL: &str = "https://icp.administracionelectronica.gob.es";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Monitoring loop configuration
    pub monitor: MonitorSettings,

    /// HTTP/portal configuration
    pub http: HttpSettings,

    /// Telegram channel configuration
    pub telegram: TelegramSettings,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Monitored provinces with their applicant data
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// Monitoring loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Seconds between ticks
    pub check_interval_secs: u64,

    /// Pause between consecutive targets within a tick
    pub pause_between_targets_secs: u64,

    /// Send a liveness status message every N ticks (0 disables)
    pub status_every_ticks: u32,
}

/// HTTP/portal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Portal origin URL
    pub portal_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Rate limit (requests per second against the portal)
    pub rate_limit: u32,

    /// Retry delay schedule in seconds; treated as calibrated configuration
    pub retry_delays_secs: Vec<u64>,
}

/// Telegram channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    /// Bot API token
    pub bot_token: String,

    /// Destination chat ID
    pub chat_id: String,

    /// Delivery request timeout in seconds
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u64,

    /// Maximum delivery retry attempts
    #[serde(default = "default_telegram_retries")]
    pub max_retries: u32,
}

fn default_telegram_timeout() -> u64 {
    10
}

fn default_telegram_retries() -> u32 {
    3
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,

    /// Optional append-mode log file
    pub file: Option<PathBuf>,
}

/// One monitored province with its applicant data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub province: String,
    pub passport_number: String,
    pub full_name: String,
    pub birth_year: String,
    pub nationality: String,
}

impl TargetConfig {
    /// Convert into the immutable runtime target
    pub fn to_target(&self) -> Target {
        Target::new(
            self.province.clone(),
            Applicant {
                passport_number: self.passport_number.clone(),
                full_name: self.full_name.clone(),
                birth_year: self.birth_year.clone(),
                nationality: self.nationality.clone(),
            },
        )
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Provinces come from `VIGIA_PROVINCES` (comma-separated) and share the
    /// applicant data given in `VIGIA_PASSPORT_NUMBER`, `VIGIA_FULL_NAME`,
    /// `VIGIA_BIRTH_YEAR` and `VIGIA_NATIONALITY`. Telegram credentials come
    /// from `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.
    pub fn from_env() -> Result<Self> {
        let check_interval_secs = std::env::var("VIGIA_CHECK_INTERVAL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300);

        let pause_between_targets_secs = std::env::var("VIGIA_TARGET_PAUSE")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(2);

        let status_every_ticks = std::env::var("VIGIA_STATUS_EVERY_TICKS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(12);

        let portal_url =
            std::env::var("VIGIA_PORTAL_URL").unwrap_or_else(|_| DEFAULT_PORTAL_URL.to_string());

        let request_timeout_secs = std::env::var("VIGIA_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let rate_limit = std::env::var("VIGIA_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let retry_delays_secs = std::env::var("VIGIA_RETRY_DELAYS")
            .ok()
            .map(|v| {
                v.split(',')
                    .filter_map(|s| s.trim().parse::<u64>().ok())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec![1, 3, 6]);

        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").unwrap_or_default();

        let level = std::env::var("VIGIA_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));
        let format = std::env::var("VIGIA_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));
        let file = std::env::var("VIGIA_LOG_FILE").ok().map(PathBuf::from);

        let provinces = std::env::var("VIGIA_PROVINCES")
            .unwrap_or_else(|_| String::from("Almería,Cádiz,Albacete"));

        let passport_number = std::env::var("VIGIA_PASSPORT_NUMBER").unwrap_or_default();
        let full_name = std::env::var("VIGIA_FULL_NAME").unwrap_or_default();
        let birth_year = std::env::var("VIGIA_BIRTH_YEAR").unwrap_or_default();
        let nationality = std::env::var("VIGIA_NATIONALITY").unwrap_or_default();

        let targets = provinces
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|province| TargetConfig {
                province: province.to_string(),
                passport_number: passport_number.clone(),
                full_name: full_name.clone(),
                birth_year: birth_year.clone(),
                nationality: nationality.clone(),
            })
            .collect();

        Ok(Self {
            monitor: MonitorSettings {
                check_interval_secs,
                pause_between_targets_secs,
                status_every_ticks,
            },
            http: HttpSettings {
                portal_url,
                request_timeout_secs,
                rate_limit,
                retry_delays_secs,
            },
            telegram: TelegramSettings {
                bot_token,
                chat_id,
                timeout_secs: default_telegram_timeout(),
                max_retries: default_telegram_retries(),
            },
            logging: LoggingConfig { level, format, file },
            targets,
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.monitor.check_interval_secs == 0 {
            anyhow::bail!("check_interval_secs must be greater than 0");
        }

        if self.http.rate_limit == 0 {
            anyhow::bail!("rate_limit must be greater than 0");
        }

        if self.http.retry_delays_secs.is_empty() {
            anyhow::bail!("retry_delays_secs must contain at least one delay");
        }

        if self.targets.is_empty() {
            anyhow::bail!("at least one target province must be configured");
        }

        for target in &self.targets {
            if !target.to_target().applicant.is_complete() {
                anyhow::bail!(
                    "incomplete applicant data for province {}",
                    target.province
                );
            }
        }

        if self.telegram.bot_token.is_empty() || self.telegram.chat_id.is_empty() {
            anyhow::bail!("Telegram credentials not configured (TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID)");
        }

        Ok(())
    }

    /// Get check interval as Duration
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.check_interval_secs)
    }

    /// Get pause between targets as Duration
    #[must_use]
    pub fn pause_between_targets(&self) -> Duration {
        Duration::from_secs(self.monitor.pause_between_targets_secs)
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }

    /// Build the immutable runtime target list
    pub fn targets(&self) -> Vec<Target> {
        self.targets.iter().map(TargetConfig::to_target).collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: MonitorSettings {
                check_interval_secs: 300,
                pause_between_targets_secs: 2,
                status_every_ticks: 12,
            },
            http: HttpSettings {
                portal_url: DEFAULT_PORTAL_URL.to_string(),
                request_timeout_secs: 60,
                rate_limit: 1,
                retry_delays_secs: vec![1, 3, 6],
            },
            telegram: TelegramSettings {
                bot_token: String::new(),
                chat_id: String::new(),
                timeout_secs: default_telegram_timeout(),
                max_retries: default_telegram_retries(),
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
                file: None,
            },
            targets: Vec::new(),
        }
    }
}
