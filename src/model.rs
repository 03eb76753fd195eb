/// PressureSample, ClassificationResult, NotificationRecord, EvaluationError
/// core data structures and error handling
///
/// Core data types for the barometric storm alarm.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic beyond small conversions, and no I/O.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Physical limits
// ---------------------------------------------------------------------------

/// Lowest pressure accepted as a real reading, in hPa.
///
/// The lowest sea-level pressure ever recorded is ~870 hPa (Typhoon Tip).
pub const MIN_PLAUSIBLE_HPA: f64 = 850.0;

/// Highest pressure accepted as a real reading, in hPa.
///
/// The highest sea-level pressure ever recorded is ~1084 hPa (Siberia).
pub const MAX_PLAUSIBLE_HPA: f64 = 1100.0;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single barometric pressure reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureSample {
    pub value_hpa: f64,
    pub timestamp: DateTime<Utc>,
}

impl PressureSample {
    pub fn new(value_hpa: f64, timestamp: DateTime<Utc>) -> Self {
        Self { value_hpa, timestamp }
    }
}

/// Returns `true` when a pressure value could come from a working barometer.
pub fn is_plausible_hpa(value_hpa: f64) -> bool {
    value_hpa.is_finite() && (MIN_PLAUSIBLE_HPA..=MAX_PLAUSIBLE_HPA).contains(&value_hpa)
}

// ---------------------------------------------------------------------------
// Classification types
// ---------------------------------------------------------------------------

/// Severity tier of a classification, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Alert,
    Alarm,
}

impl AlertLevel {
    /// The notification state an alert level maps to, if it warrants one.
    pub fn notification_state(self) -> Option<NotificationState> {
        match self {
            AlertLevel::None => None,
            AlertLevel::Alert => Some(NotificationState::Alert),
            AlertLevel::Alarm => Some(NotificationState::Alarm),
        }
    }
}

/// Absolute pressure ranges, each with its own tendency rules.
///
///   Low < 1009 <= Normal < 1019 <= Elevated < 1023 <= High
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureBand {
    Low,
    Normal,
    Elevated,
    High,
}

/// Outcome of comparing the current reading with the one from three hours ago.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: &'static str,
    pub alert_level: AlertLevel,
    pub band: PressureBand,
    pub current_value: f64,
    pub past_value: f64,
    /// `past_value - current_value`; positive when pressure has fallen.
    pub difference: f64,
}

// ---------------------------------------------------------------------------
// Notification types
// ---------------------------------------------------------------------------

/// State carried by an active notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    Alert,
    Alarm,
}

/// How an operator is told about a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMethod {
    Visual,
    Sound,
}

/// Every active notification is both shown and sounded.
pub const NOTIFICATION_METHODS: [NotificationMethod; 2] =
    [NotificationMethod::Visual, NotificationMethod::Sound];

/// The single outstanding storm notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub state: NotificationState,
    #[serde(rename = "method")]
    pub methods: [NotificationMethod; 2],
    pub past_value: f64,
    pub current_value: f64,
    pub difference: f64,
}

impl NotificationRecord {
    /// Snapshots a classification into a notification, or `None` when the
    /// classification carries no alert.
    pub fn from_classification(result: &ClassificationResult) -> Option<Self> {
        let state = result.alert_level.notification_state()?;
        Some(NotificationRecord {
            state,
            methods: NOTIFICATION_METHODS,
            past_value: result.past_value,
            current_value: result.current_value,
            difference: result.difference,
        })
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Which reading of an evaluation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRole {
    Current,
    Past,
}

impl std::fmt::Display for SampleRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleRole::Current => write!(f, "current"),
            SampleRole::Past => write!(f, "past"),
        }
    }
}

/// Errors raised by a history collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// No reading close enough to the requested instant.
    NotFound { at: DateTime<Utc> },
    /// The backing store failed (connection, query, decoding).
    Backend(String),
}

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryError::NotFound { at } => {
                write!(f, "No history was found for {}", at.to_rfc3339())
            }
            HistoryError::Backend(msg) => write!(f, "History backend error: {}", msg),
        }
    }
}

impl std::error::Error for HistoryError {}

/// Per-evaluation failures. None of them are fatal to the service; the
/// evaluation is abandoned and the notification state is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// The comparison reading from the lookback window could not be obtained.
    HistoryUnavailable(HistoryError),
    /// A reading was non-finite or outside the plausible pressure range.
    MalformedSample { role: SampleRole, value: f64 },
}

impl std::fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationError::HistoryUnavailable(e) => write!(f, "History unavailable: {}", e),
            EvaluationError::MalformedSample { role, value } => {
                write!(f, "Malformed {} pressure: {} hPa", role, value)
            }
        }
    }
}

impl std::error::Error for EvaluationError {}

impl From<HistoryError> for EvaluationError {
    fn from(err: HistoryError) -> Self {
        EvaluationError::HistoryUnavailable(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
