/// Historical pressure lookup.
///
/// The monitor compares each reading with the one from three hours earlier.
/// Where that reading comes from is a collaborator concern:
/// - `memory` — in-process ordered map, for a single long-running daemon.
/// - `database` — `baro.pressure_readings`, survives restarts.

pub mod memory;
pub mod database;

use chrono::{DateTime, Duration, Utc};

use crate::model::{HistoryError, PressureSample};

/// Default maximum gap between the requested instant and the reading used.
pub const DEFAULT_TOLERANCE_MINUTES: i64 = 30;

/// A source of past pressure readings.
pub trait HistoryProvider {
    /// Returns the reading in effect at `at`: the newest one taken at or
    /// before `at`, provided it is within the provider's tolerance.
    fn lookup(&mut self, at: DateTime<Utc>) -> Result<PressureSample, HistoryError>;

    /// Stores a fresh reading so later lookups can find it. Providers backed
    /// by an external recorder keep the default no-op.
    fn record(&mut self, _sample: &PressureSample) -> Result<(), HistoryError> {
        Ok(())
    }
}

impl<H: HistoryProvider + ?Sized> HistoryProvider for Box<H> {
    fn lookup(&mut self, at: DateTime<Utc>) -> Result<PressureSample, HistoryError> {
        (**self).lookup(at)
    }

    fn record(&mut self, sample: &PressureSample) -> Result<(), HistoryError> {
        (**self).record(sample)
    }
}

/// Earliest reading time accepted for a lookup at `at`.
pub fn window_start(at: DateTime<Utc>, tolerance: Duration) -> DateTime<Utc> {
    at - tolerance
}
