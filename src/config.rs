/// Service configuration.
///
/// Loaded from a TOML file; every field has a default so a missing section
/// (or no file at all, via `Config::default()`) still yields a working setup.
/// Secrets stay out of the file: `DATABASE_URL` comes from the environment,
/// optionally via `.env`.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;

use crate::logging::LogLevel;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    /// ASOS station polled for pressure, e.g. "KPIA".
    pub station_id: String,
    pub refresh_minutes: u64,
    pub lookback_hours: i64,
    /// Maximum gap between the lookback instant and the reading used.
    pub history_tolerance_minutes: i64,
    /// Samples older than this are skipped.
    pub max_sample_age_minutes: u64,
    /// Seed history from IEM's recent observations at start-up.
    pub seed_history: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            enabled: true,
            station_id: "KPIA".to_string(),
            refresh_minutes: 5,
            lookback_hours: 3,
            history_tolerance_minutes: 30,
            max_sample_age_minutes: 90,
            seed_history: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Append deltas here; stdout when absent.
    pub delta_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: "info".to_string(), file: None, timestamps: true }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    /// Filled from `DATABASE_URL`, never from the file.
    #[serde(skip)]
    pub database_url: Option<String>,
}

/// Upper limits on the interval settings; the poll loop and the history
/// window do plain arithmetic on them.
pub const MAX_REFRESH_MINUTES: i64 = 24 * 60;
pub const MAX_LOOKBACK_HOURS: i64 = 48;
pub const MAX_HISTORY_TOLERANCE_MINUTES: i64 = 24 * 60;
pub const MAX_SAMPLE_AGE_MINUTES: i64 = 7 * 24 * 60;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "Cannot read {}: {}", path, source),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Reads and validates a TOML file, then picks up `DATABASE_URL`.
    pub fn load(path: &str) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
        let mut config = Config::from_toml(&text)?;
        config.database_url = database_url_from_env();
        Ok(config)
    }

    /// Parses and validates TOML text. Does not touch the environment.
    pub fn from_toml(text: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.monitor;
        if m.station_id.trim().is_empty() {
            return Err(ConfigError::Invalid("monitor.station_id is empty".to_string()));
        }
        check_range("monitor.refresh_minutes", as_i64(m.refresh_minutes), 1, MAX_REFRESH_MINUTES)?;
        check_range("monitor.lookback_hours", m.lookback_hours, 1, MAX_LOOKBACK_HOURS)?;
        check_range(
            "monitor.history_tolerance_minutes",
            m.history_tolerance_minutes,
            0,
            MAX_HISTORY_TOLERANCE_MINUTES,
        )?;
        check_range("monitor.max_sample_age_minutes", as_i64(m.max_sample_age_minutes), 0, MAX_SAMPLE_AGE_MINUTES)?;
        self.log_level()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.logging.level.parse().map_err(ConfigError::Invalid)
    }
}

fn as_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn check_range(name: &str, value: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be between {} and {}, got {}", name, min, max, value)))
    }
}

/// `DATABASE_URL` from the environment or `.env`; empty counts as unset.
pub fn database_url_from_env() -> Option<String> {
    dotenv::dotenv().ok();
    env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty())
}
