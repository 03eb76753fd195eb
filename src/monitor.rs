//! Evaluation orchestration.
//!
//! One `EvaluationOrchestrator` per monitored context (vessel or station).
//! It owns that context's history provider, publisher and notification state
//! behind a single mutex, so concurrent callers are serialized and each
//! evaluation reads and writes the notification slot exactly once.

use std::sync::{Mutex, MutexGuard};

use chrono::Duration;

use crate::alert::notification::{NotificationAction, NotificationSlot, NotificationStateMachine};
use crate::analysis::trend;
use crate::history::HistoryProvider;
use crate::logging::{self, Source};
use crate::model::{is_plausible_hpa, EvaluationError, PressureSample, SampleRole};
use crate::publish::DeltaPublisher;
use crate::report::{self, TrendReport};

/// Default comparison window.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 3;

/// What one evaluation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub trend_report: TrendReport,
    pub notification_action: NotificationAction,
}

struct Context<H, P> {
    history: H,
    publisher: P,
    notifications: NotificationStateMachine,
}

pub struct EvaluationOrchestrator<H, P> {
    context_id: String,
    lookback: Duration,
    inner: Mutex<Context<H, P>>,
}

impl<H: HistoryProvider, P: DeltaPublisher> EvaluationOrchestrator<H, P> {
    pub fn new(context_id: &str, history: H, publisher: P) -> Self {
        Self {
            context_id: context_id.to_string(),
            lookback: Duration::hours(DEFAULT_LOOKBACK_HOURS),
            inner: Mutex::new(Context {
                history,
                publisher,
                notifications: NotificationStateMachine::new(),
            }),
        }
    }

    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    // The slot is only ever replaced whole, so a panic elsewhere cannot leave
    // it half-written; recover the guard instead of propagating the poison.
    fn lock(&self) -> MutexGuard<'_, Context<H, P>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current notification slot.
    pub fn notification_slot(&self) -> NotificationSlot {
        self.lock().notifications.slot().clone()
    }

    /// Stores a reading without evaluating it, e.g. when seeding history.
    pub fn record_history(&self, sample: &PressureSample) -> Result<(), EvaluationError> {
        validate(sample.value_hpa, SampleRole::Current)?;
        self.lock().history.record(sample)?;
        Ok(())
    }

    /// Evaluates one pressure sample.
    ///
    /// On error nothing is published and the notification slot is left as
    /// it was. Publish failures are logged and do not fail the evaluation;
    /// the next alerting evaluation re-publishes.
    pub fn evaluate(&self, sample: &PressureSample) -> Result<Evaluation, EvaluationError> {
        let mut ctx = self.lock();
        let station = Some(self.context_id.as_str());

        validate(sample.value_hpa, SampleRole::Current)?;

        if let Err(e) = ctx.history.record(sample) {
            logging::warn(Source::History, station, &format!("Could not record sample: {}", e));
        }

        let past = ctx.history.lookup(sample.timestamp - self.lookback)?;
        validate(past.value_hpa, SampleRole::Past)?;
        logging::debug(
            Source::Monitor,
            station,
            &format!("Outside pressure from {} ago: {:.1} hPa", format_lookback(self.lookback), past.value_hpa),
        );

        let classification = trend::classify(sample.value_hpa, past.value_hpa)?;
        logging::debug(
            Source::Monitor,
            station,
            &format!(
                "Barometer {} change: {:+.2} hPa",
                format_lookback(self.lookback),
                -classification.difference
            ),
        );

        let trend_report = report::emit(&classification);
        let notification_action = ctx.notifications.apply(&classification);

        let Context { publisher, .. } = &mut *ctx;
        publish(publisher, &report::prediction_delta(&trend_report), station);
        if let Some(delta) = report::notification_delta(&notification_action) {
            publish(publisher, &delta, station);
        }

        match &notification_action {
            NotificationAction::Publish(record) => logging::warn(
                Source::Monitor,
                station,
                &format!(
                    "{} ({:?}): {:.1} hPa, change {:+.1} hPa over {}",
                    trend_report.label,
                    record.state,
                    record.current_value,
                    -record.difference,
                    format_lookback(self.lookback)
                ),
            ),
            NotificationAction::Clear => {
                logging::info(Source::Monitor, station, "Storm notification cleared")
            }
            NotificationAction::NoOp => logging::info(
                Source::Monitor,
                station,
                &format!("{} ({:.1} hPa)", trend_report.label, sample.value_hpa),
            ),
        }

        Ok(Evaluation { trend_report, notification_action })
    }
}

fn validate(value_hpa: f64, role: SampleRole) -> Result<(), EvaluationError> {
    if is_plausible_hpa(value_hpa) {
        Ok(())
    } else {
        Err(EvaluationError::MalformedSample { role, value: value_hpa })
    }
}

fn publish<P: DeltaPublisher>(publisher: &mut P, delta: &report::Delta, station: Option<&str>) {
    if let Err(e) = publisher.publish(delta) {
        logging::error(Source::Publisher, station, &format!("Publish failed: {}", e));
    }
}

fn format_lookback(lookback: Duration) -> String {
    if lookback.num_minutes() % 60 == 0 {
        format!("{} hours", lookback.num_hours())
    } else {
        format!("{} minutes", lookback.num_minutes())
    }
}
