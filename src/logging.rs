/// Structured logging for the barometric storm alarm
///
/// Provides context-rich logging with station identifiers, timestamps,
/// and severity levels. Supports both console output and file-based
/// logging for daemon operations.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use crate::model::{EvaluationError, HistoryError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Log Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Iem,
    History,
    Monitor,
    Publisher,
    System,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Iem => write!(f, "IEM"),
            Source::History => write!(f, "HIST"),
            Source::Monitor => write!(f, "MON"),
            Source::Publisher => write!(f, "PUB"),
            Source::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        match LOGGER.lock() {
            Ok(mut slot) => *slot = Some(logger),
            Err(poisoned) => *poisoned.into_inner() = Some(logger),
        }
    }

    fn format_entry(level: LogLevel, source: &Source, context: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let context_part = context.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, source, context_part, message)
    }

    /// Log a message with the global logger
    fn log(&self, level: LogLevel, source: &Source, context: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, source, context, message);
        let context_part = context.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, context_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, context_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn log(level: LogLevel, source: Source, context: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &source, context, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: Source, context: Option<&str>, message: &str) {
    log(LogLevel::Info, source, context, message);
}

/// Log a warning message
pub fn warn(source: Source, context: Option<&str>, message: &str) {
    log(LogLevel::Warning, source, context, message);
}

/// Log an error message
pub fn error(source: Source, context: Option<&str>, message: &str) {
    log(LogLevel::Error, source, context, message);
}

/// Log a debug message
pub fn debug(source: Source, context: Option<&str>, message: &str) {
    log(LogLevel::Debug, source, context, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify an evaluation failure.
///
/// A missing 3-hour-old reading is normal while history warms up but also
/// follows a feed outage mid-run; the two look the same from here, so it is
/// unknown and still reaches the log. Backend errors point at the database
/// or configuration.
pub fn classify_evaluation_failure(err: &EvaluationError) -> FailureType {
    match err {
        EvaluationError::HistoryUnavailable(HistoryError::NotFound { .. }) => FailureType::Unknown,
        EvaluationError::HistoryUnavailable(HistoryError::Backend(_)) => FailureType::Unexpected,
        EvaluationError::MalformedSample { .. } => FailureType::Unknown,
    }
}

/// Classify an IEM fetch failure from its message
pub fn classify_iem_failure(error_message: &str) -> FailureType {
    if error_message.contains("HTTP") || error_message.contains("timeout") {
        FailureType::Unexpected
    } else if error_message.contains("Parse error") {
        // API format changes or bugs
        FailureType::Unexpected
    } else {
        // No observation / no pressure field: station may be offline
        FailureType::Unknown
    }
}

/// Level a classified failure is logged at
pub fn failure_log_level(failure_type: &FailureType) -> LogLevel {
    match failure_type {
        FailureType::Unexpected => LogLevel::Error,
        FailureType::Unknown => LogLevel::Warning,
    }
}

fn log_classified(source: Source, context: &str, failure_type: FailureType, message: &str) {
    log(failure_log_level(&failure_type), source, Some(context), message);
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log an abandoned evaluation with automatic classification
pub fn log_evaluation_failure(station_id: &str, err: &EvaluationError) {
    let failure_type = classify_evaluation_failure(err);
    let source = match err {
        EvaluationError::HistoryUnavailable(_) => Source::History,
        EvaluationError::MalformedSample { .. } => Source::Monitor,
    };
    let message = format!("Evaluation skipped [{}]: {}", failure_type, err);
    log_classified(source, station_id, failure_type, &message);
}

/// Log an IEM fetch failure with classification
pub fn log_iem_failure(station_id: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_iem_failure(&error_msg);
    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);
    log_classified(Source::Iem, station_id, failure_type, &message);
}
