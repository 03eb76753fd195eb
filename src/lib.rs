//! Barometric storm alarm.
//!
//! Compares each pressure reading with the one from three hours earlier,
//! labels the weather trend and raises, refreshes or clears a single storm
//! notification.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod history;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod publish;
pub mod report;

pub use alert::notification::{NotificationAction, NotificationSlot, NotificationStateMachine};
pub use analysis::trend::classify;
pub use model::{
    AlertLevel, ClassificationResult, EvaluationError, HistoryError, NotificationRecord,
    PressureSample,
};
pub use monitor::{Evaluation, EvaluationOrchestrator};
