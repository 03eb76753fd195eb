/// End-to-end evaluation scenarios
///
/// Drives the public orchestrator with an in-memory history and a recording
/// publisher, checking both the returned evaluation and the deltas a
/// downstream Signal K consumer would see.
///
/// No network or database is needed.

use std::sync::{Arc, Mutex};

use baro_storm_service::history::memory::InMemoryHistory;
use baro_storm_service::history::HistoryProvider;
use baro_storm_service::model::{NotificationMethod, NotificationState, SampleRole};
use baro_storm_service::publish::{DeltaPublisher, PublishError};
use baro_storm_service::report::{Delta, NOTIFICATION_PATH, PREDICTION_PATH};
use baro_storm_service::{
    EvaluationError, EvaluationOrchestrator, HistoryError, NotificationAction, NotificationSlot,
    PressureSample,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct SharedRecorder {
    deltas: Arc<Mutex<Vec<Delta>>>,
}

impl SharedRecorder {
    fn json(&self) -> Vec<Value> {
        self.deltas
            .lock()
            .unwrap()
            .iter()
            .map(|d| serde_json::to_value(d).unwrap())
            .collect()
    }
}

impl DeltaPublisher for SharedRecorder {
    fn publish(&mut self, delta: &Delta) -> Result<(), PublishError> {
        self.deltas.lock().unwrap().push(delta.clone());
        Ok(())
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 3, 6, 0, 0).unwrap()
}

fn minutes(m: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(m)
}

fn path_of(delta: &Value) -> &str {
    delta["updates"][0]["values"][0]["path"].as_str().unwrap()
}

fn value_of(delta: &Value) -> &Value {
    &delta["updates"][0]["values"][0]["value"]
}

fn orchestrator_with(
    readings: &[(i64, f64)],
) -> (EvaluationOrchestrator<InMemoryHistory, SharedRecorder>, SharedRecorder) {
    let mut history = InMemoryHistory::default();
    for &(m, hpa) in readings {
        history.record(&PressureSample::new(hpa, minutes(m))).unwrap();
    }
    let recorder = SharedRecorder::default();
    (EvaluationOrchestrator::new("self", history, recorder.clone()), recorder)
}

// ---------------------------------------------------------------------------
// 1. Storm raised from a clear state
// ---------------------------------------------------------------------------

#[test]
fn test_six_hpa_drop_raises_storm_alarm() {
    let (orchestrator, recorder) = orchestrator_with(&[(0, 1011.0)]);

    let evaluation = orchestrator
        .evaluate(&PressureSample::new(1005.0, minutes(180)))
        .expect("3-hour-old reading is in history");

    assert_eq!(evaluation.trend_report.label, "Storm");
    let record = match evaluation.notification_action {
        NotificationAction::Publish(record) => record,
        other => panic!("expected Publish, got {:?}", other),
    };
    assert_eq!(record.state, NotificationState::Alarm);
    assert_eq!(record.methods, [NotificationMethod::Visual, NotificationMethod::Sound]);
    assert_eq!(record.past_value, 1011.0);
    assert_eq!(record.current_value, 1005.0);
    assert_eq!(record.difference, 6.0);

    let deltas = recorder.json();
    assert_eq!(deltas.len(), 2);
    assert_eq!(path_of(&deltas[0]), PREDICTION_PATH);
    assert_eq!(value_of(&deltas[0]), "Storm");
    assert_eq!(path_of(&deltas[1]), NOTIFICATION_PATH);
    assert_eq!(value_of(&deltas[1])["state"], "alarm");
    assert_eq!(value_of(&deltas[1])["difference"], 6.0);
}

// ---------------------------------------------------------------------------
// 2. Missing history
// ---------------------------------------------------------------------------

#[test]
fn test_missing_history_produces_nothing_but_the_error() {
    let (orchestrator, recorder) = orchestrator_with(&[]);

    let err = orchestrator
        .evaluate(&PressureSample::new(1005.0, minutes(180)))
        .unwrap_err();

    assert_eq!(err, EvaluationError::HistoryUnavailable(HistoryError::NotFound { at: t0() }));
    assert!(recorder.json().is_empty(), "no trend report and no notification");
    assert_eq!(orchestrator.notification_slot(), NotificationSlot::Clear);
}

#[test]
fn test_history_failure_leaves_active_alarm_in_place() {
    let (orchestrator, recorder) = orchestrator_with(&[(0, 1011.0)]);
    orchestrator.evaluate(&PressureSample::new(1005.0, minutes(180))).unwrap();

    // Next cycle arrives after a long gap: nothing near t-3h.
    let err = orchestrator
        .evaluate(&PressureSample::new(1013.0, minutes(600)))
        .unwrap_err();
    assert!(matches!(err, EvaluationError::HistoryUnavailable(_)));
    assert!(orchestrator.notification_slot().is_active());
    assert_eq!(recorder.json().len(), 2, "only the first cycle published");
}

#[test]
fn test_negative_sample_is_malformed() {
    let (orchestrator, recorder) = orchestrator_with(&[(0, 1011.0)]);
    let err = orchestrator
        .evaluate(&PressureSample::new(-1005.0, minutes(180)))
        .unwrap_err();
    assert!(matches!(err, EvaluationError::MalformedSample { role: SampleRole::Current, .. }));
    assert!(recorder.json().is_empty());
}

// ---------------------------------------------------------------------------
// 3. Lifecycle over a passing front
// ---------------------------------------------------------------------------

#[test]
fn test_front_passing_raises_refreshes_then_clears() {
    // 5-minute cadence readings falling then recovering.
    let (orchestrator, recorder) = orchestrator_with(&[(0, 1011.0), (5, 1010.8), (10, 1008.0)]);

    let first = orchestrator.evaluate(&PressureSample::new(1005.0, minutes(180))).unwrap();
    let second = orchestrator.evaluate(&PressureSample::new(1004.5, minutes(185))).unwrap();
    let third = orchestrator.evaluate(&PressureSample::new(1009.5, minutes(190))).unwrap();

    assert!(matches!(first.notification_action, NotificationAction::Publish(_)));
    match &second.notification_action {
        NotificationAction::Publish(record) => {
            assert_eq!(record.state, NotificationState::Alarm);
            assert_eq!(record.current_value, 1004.5);
            assert!((record.difference - 6.3).abs() < 1e-9);
        }
        other => panic!("expected refresh, got {:?}", other),
    }
    // 1009.5 vs 1008.0: Normal band, rising 1.5 but not above 1015.
    assert_eq!(third.trend_report.label, "No change");
    assert_eq!(third.notification_action, NotificationAction::Clear);
    assert_eq!(orchestrator.notification_slot(), NotificationSlot::Clear);

    let deltas = recorder.json();
    let paths: Vec<&str> = deltas.iter().map(path_of).collect();
    assert_eq!(
        paths,
        vec![
            PREDICTION_PATH,
            NOTIFICATION_PATH,
            PREDICTION_PATH,
            NOTIFICATION_PATH,
            PREDICTION_PATH,
            NOTIFICATION_PATH,
        ]
    );
    assert!(value_of(&deltas[5]).is_null(), "clear nulls the notification path");
}

#[test]
fn test_calm_day_only_reports_labels() {
    let (orchestrator, recorder) = orchestrator_with(&[(0, 1024.0), (5, 1024.1)]);

    for (m, hpa) in [(180, 1024.3), (185, 1024.2)] {
        let evaluation = orchestrator.evaluate(&PressureSample::new(hpa, minutes(m))).unwrap();
        assert_eq!(evaluation.trend_report.label, "Fair, no marked temperature change");
        assert_eq!(evaluation.notification_action, NotificationAction::NoOp);
    }

    let deltas = recorder.json();
    assert_eq!(deltas.len(), 2);
    assert!(deltas.iter().all(|d| path_of(d) == PREDICTION_PATH));
}

#[test]
fn test_tenth_hpa_rise_of_exactly_1_1_is_poorer_weather() {
    let (orchestrator, recorder) = orchestrator_with(&[(0, 1019.2)]);

    let evaluation = orchestrator.evaluate(&PressureSample::new(1020.3, minutes(180))).unwrap();

    assert_eq!(evaluation.trend_report.label, "Poorer weather to come");
    match evaluation.notification_action {
        NotificationAction::Publish(record) => {
            assert_eq!(record.state, NotificationState::Alert);
            assert_eq!(record.difference, -1.1);
        }
        other => panic!("expected Publish, got {:?}", other),
    }
    assert_eq!(recorder.json().len(), 2);
}

// ---------------------------------------------------------------------------
// 4. Concurrent delivery
// ---------------------------------------------------------------------------

#[test]
fn test_concurrent_evaluations_are_serialized() {
    let (orchestrator, recorder) = orchestrator_with(&[(0, 1011.0)]);

    std::thread::scope(|scope| {
        for i in 0..8 {
            let orchestrator = &orchestrator;
            scope.spawn(move || {
                orchestrator
                    .evaluate(&PressureSample::new(1005.0, minutes(180 + i)))
                    .expect("all lookups land within tolerance of the seed");
            });
        }
    });

    // Every evaluation published its prediction and notification as a pair.
    let deltas = recorder.json();
    assert_eq!(deltas.len(), 16);
    for pair in deltas.chunks(2) {
        assert_eq!(path_of(&pair[0]), PREDICTION_PATH);
        assert_eq!(path_of(&pair[1]), NOTIFICATION_PATH);
    }
    assert!(orchestrator.notification_slot().is_active());
}
