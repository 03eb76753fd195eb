//! In-memory pressure history.
//!
//! Samples are kept in timestamp order and pruned to a retention window,
//! so a daemon polling every few minutes holds a few hundred entries at most.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::{DEFAULT_TOLERANCE_MINUTES, HistoryProvider, window_start};
use crate::model::{HistoryError, PressureSample};

#[derive(Debug, Clone)]
pub struct InMemoryHistory {
    samples: BTreeMap<DateTime<Utc>, f64>,
    tolerance: Duration,
    retention: Duration,
}

impl InMemoryHistory {
    /// # Arguments
    /// * `tolerance` - how far before the requested instant a reading may be
    /// * `retention` - readings older than this, relative to the newest, are dropped
    pub fn new(tolerance: Duration, retention: Duration) -> Self {
        Self { samples: BTreeMap::new(), tolerance, retention }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn prune(&mut self) {
        if let Some((&newest, _)) = self.samples.last_key_value() {
            let cutoff = newest - self.retention;
            self.samples = self.samples.split_off(&cutoff);
        }
    }
}

impl Default for InMemoryHistory {
    /// 30-minute tolerance, 6-hour retention (twice the 3-hour lookback).
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_TOLERANCE_MINUTES), Duration::hours(6))
    }
}

impl HistoryProvider for InMemoryHistory {
    fn lookup(&mut self, at: DateTime<Utc>) -> Result<PressureSample, HistoryError> {
        let earliest = window_start(at, self.tolerance);
        self.samples
            .range(earliest..=at)
            .next_back()
            .map(|(&timestamp, &value_hpa)| PressureSample::new(value_hpa, timestamp))
            .ok_or(HistoryError::NotFound { at })
    }

    fn record(&mut self, sample: &PressureSample) -> Result<(), HistoryError> {
        self.samples.insert(sample.timestamp, sample.value_hpa);
        self.prune();
        Ok(())
    }
}
