//! Trend-label reporting and the Signal K deltas the service publishes.
//!
//! A trend report is produced on every evaluation, whatever the alert
//! level. Notification deltas only follow state-machine transitions.

use serde::Serialize;

use crate::alert::notification::NotificationAction;
use crate::model::{ClassificationResult, NotificationRecord};

/// Source label stamped on every outbound delta.
pub const SOURCE_ID: &str = "signalk-barometric-storm-alarm";

pub const PREDICTION_PATH: &str = "environment.outside.stormAlarm.prediction";
pub const NOTIFICATION_PATH: &str = "notifications.environment.outside.stormAlarm.prediction";

// ---------------------------------------------------------------------------
// Trend report
// ---------------------------------------------------------------------------

/// The externally visible weather-trend label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub label: String,
}

/// Builds the trend report for a classification. Never skipped.
pub fn emit(classification: &ClassificationResult) -> TrendReport {
    TrendReport { label: classification.label.to_string() }
}

// ---------------------------------------------------------------------------
// Delta wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
    pub updates: Vec<Update>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    #[serde(rename = "$source")]
    pub source: &'static str,
    pub values: Vec<PathValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathValue {
    pub path: &'static str,
    pub value: DeltaValue,
}

/// Values carried by this service's deltas. `Null` removes a path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeltaValue {
    Text(String),
    Notification(NotificationRecord),
    Null,
}

impl Delta {
    fn single(path: &'static str, value: DeltaValue) -> Self {
        Delta {
            updates: vec![Update { source: SOURCE_ID, values: vec![PathValue { path, value }] }],
        }
    }
}

/// Delta carrying the trend label on the prediction path.
pub fn prediction_delta(report: &TrendReport) -> Delta {
    Delta::single(PREDICTION_PATH, DeltaValue::Text(report.label.clone()))
}

/// Delta for a notification action; `None` when there is nothing to send.
pub fn notification_delta(action: &NotificationAction) -> Option<Delta> {
    match action {
        NotificationAction::NoOp => None,
        NotificationAction::Publish(record) => {
            Some(Delta::single(NOTIFICATION_PATH, DeltaValue::Notification(record.clone())))
        }
        NotificationAction::Clear => Some(Delta::single(NOTIFICATION_PATH, DeltaValue::Null)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertLevel, PressureBand};
    use serde_json::json;

    fn calm() -> ClassificationResult {
        ClassificationResult {
            label: "No change",
            alert_level: AlertLevel::None,
            band: PressureBand::Normal,
            current_value: 1013.0,
            past_value: 1013.2,
            difference: 0.2,
        }
    }

    #[test]
    fn test_emit_reports_label_even_without_alert() {
        assert_eq!(emit(&calm()).label, "No change");
    }

    #[test]
    fn test_prediction_delta_wire_shape() {
        let delta = prediction_delta(&emit(&calm()));
        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(
            json,
            json!({
                "updates": [{
                    "$source": SOURCE_ID,
                    "values": [{ "path": PREDICTION_PATH, "value": "No change" }]
                }]
            })
        );
    }

    #[test]
    fn test_clear_delta_nulls_notification_path() {
        let delta = notification_delta(&NotificationAction::Clear).expect("clear sends a delta");
        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(json["updates"][0]["values"][0]["path"], NOTIFICATION_PATH);
        assert!(json["updates"][0]["values"][0]["value"].is_null());
    }

    #[test]
    fn test_noop_sends_nothing() {
        assert!(notification_delta(&NotificationAction::NoOp).is_none());
    }

    #[test]
    fn test_publish_delta_carries_record() {
        let mut storm = calm();
        storm.label = "Storm";
        storm.alert_level = AlertLevel::Alarm;
        let record = NotificationRecord::from_classification(&storm).unwrap();
        let delta = notification_delta(&NotificationAction::Publish(record)).unwrap();
        let json = serde_json::to_value(&delta).unwrap();
        let value = &json["updates"][0]["values"][0]["value"];
        assert_eq!(value["state"], "alarm");
        assert_eq!(value["method"], json!(["visual", "sound"]));
        assert_eq!(value["currentValue"], 1013.0);
    }
}
