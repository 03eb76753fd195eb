//! Storm notification lifecycle.
//!
//! At most one storm notification is outstanding at any time. Each
//! classification either raises/refreshes it, clears it, or leaves the
//! service quiet. There are no timers: every transition is driven by the
//! next classification.

use crate::model::{AlertLevel, ClassificationResult, NotificationRecord};

/// The notification slot: empty, or holding the active record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NotificationSlot {
    #[default]
    Clear,
    Active(NotificationRecord),
}

impl NotificationSlot {
    pub fn is_active(&self) -> bool {
        matches!(self, NotificationSlot::Active(_))
    }

    pub fn record(&self) -> Option<&NotificationRecord> {
        match self {
            NotificationSlot::Active(record) => Some(record),
            NotificationSlot::Clear => None,
        }
    }
}

/// What the publisher has to do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationAction {
    /// Nothing was active and nothing needs to be.
    NoOp,
    /// Raise or refresh the notification with this record.
    Publish(NotificationRecord),
    /// Remove the outstanding notification.
    Clear,
}

/// Pure transition function: prior slot + classification → (new slot, action).
///
/// Every alerting classification publishes, including refreshes of an
/// already-active notification. `Clear` is only emitted when something was
/// active.
pub fn step(
    prior: &NotificationSlot,
    classification: &ClassificationResult,
) -> (NotificationSlot, NotificationAction) {
    match NotificationRecord::from_classification(classification) {
        Some(record) => (
            NotificationSlot::Active(record.clone()),
            NotificationAction::Publish(record),
        ),
        None => {
            debug_assert_eq!(classification.alert_level, AlertLevel::None);
            let action = if prior.is_active() {
                NotificationAction::Clear
            } else {
                NotificationAction::NoOp
            };
            (NotificationSlot::Clear, action)
        }
    }
}

/// Owner of the notification slot. The only mutator of it.
#[derive(Debug, Default)]
pub struct NotificationStateMachine {
    slot: NotificationSlot,
}

impl NotificationStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self) -> &NotificationSlot {
        &self.slot
    }

    /// Computes the transition and stores the new slot in one call.
    pub fn apply(&mut self, classification: &ClassificationResult) -> NotificationAction {
        let (next, action) = step(&self.slot, classification);
        self.slot = next;
        action
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotificationMethod, NotificationState, PressureBand};

    fn classification(level: AlertLevel, current: f64, past: f64) -> ClassificationResult {
        ClassificationResult {
            label: "test",
            alert_level: level,
            band: PressureBand::Low,
            current_value: current,
            past_value: past,
            difference: past - current,
        }
    }

    fn publish_state(action: &NotificationAction) -> NotificationState {
        match action {
            NotificationAction::Publish(record) => record.state,
            other => panic!("expected Publish, got {:?}", other),
        }
    }

    // --- Sustained states ---------------------------------------------------

    #[test]
    fn test_sustained_alert_publishes_every_time_and_stays_active() {
        let mut machine = NotificationStateMachine::new();

        let first = machine.apply(&classification(AlertLevel::Alert, 1007.0, 1009.0));
        assert_eq!(publish_state(&first), NotificationState::Alert);
        assert!(machine.slot().is_active());

        let second = machine.apply(&classification(AlertLevel::Alert, 1006.5, 1009.0));
        assert_eq!(publish_state(&second), NotificationState::Alert);
        assert!(machine.slot().is_active(), "sustained alert must not clear");
        assert_eq!(machine.slot().record().map(|r| r.current_value), Some(1006.5));
    }

    #[test]
    fn test_sustained_clear_is_noop() {
        let mut machine = NotificationStateMachine::new();
        let calm = classification(AlertLevel::None, 1013.0, 1013.0);
        assert_eq!(machine.apply(&calm), NotificationAction::NoOp);
        assert_eq!(machine.apply(&calm), NotificationAction::NoOp);
        assert_eq!(machine.slot(), &NotificationSlot::Clear);
    }

    // --- Transitions --------------------------------------------------------

    #[test]
    fn test_alarm_then_calm_publishes_then_clears() {
        let mut machine = NotificationStateMachine::new();

        let raised = machine.apply(&classification(AlertLevel::Alarm, 1005.0, 1011.0));
        match &raised {
            NotificationAction::Publish(record) => {
                assert_eq!(record.state, NotificationState::Alarm);
                assert_eq!(record.methods, [NotificationMethod::Visual, NotificationMethod::Sound]);
                assert_eq!(record.difference, 6.0);
            }
            other => panic!("expected Publish, got {:?}", other),
        }

        let cleared = machine.apply(&classification(AlertLevel::None, 1008.0, 1005.0));
        assert_eq!(cleared, NotificationAction::Clear);
        assert_eq!(machine.slot(), &NotificationSlot::Clear);
    }

    #[test]
    fn test_alert_escalates_to_alarm_in_place() {
        let mut machine = NotificationStateMachine::new();
        machine.apply(&classification(AlertLevel::Alert, 1007.0, 1009.0));
        let escalated = machine.apply(&classification(AlertLevel::Alarm, 1003.0, 1009.0));
        assert_eq!(publish_state(&escalated), NotificationState::Alarm);
        assert_eq!(
            machine.slot().record().map(|r| r.state),
            Some(NotificationState::Alarm)
        );
    }

    #[test]
    fn test_step_is_pure() {
        let prior = NotificationSlot::Clear;
        let alarm = classification(AlertLevel::Alarm, 1005.0, 1011.0);
        assert_eq!(step(&prior, &alarm), step(&prior, &alarm));
        assert_eq!(prior, NotificationSlot::Clear);
    }
}
