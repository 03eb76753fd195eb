/// PostgreSQL-backed pressure history.
///
/// Readings live in `baro.pressure_readings` (see
/// `sql/001_pressure_readings.sql`), keyed by station and measurement time,
/// so the three-hour comparison is available straight after a restart.

use chrono::{DateTime, Duration, Utc};
use postgres::{Client, NoTls};

use super::{DEFAULT_TOLERANCE_MINUTES, HistoryProvider, window_start};
use crate::model::{HistoryError, PressureSample};

const LOOKUP_QUERY: &str = "
    SELECT measurement_time, pressure_hpa
    FROM baro.pressure_readings
    WHERE station_id = $1
      AND measurement_time >= $2
      AND measurement_time <= $3
    ORDER BY measurement_time DESC
    LIMIT 1
";

const INSERT_QUERY: &str = "
    INSERT INTO baro.pressure_readings (station_id, measurement_time, pressure_hpa)
    VALUES ($1, $2, $3)
    ON CONFLICT (station_id, measurement_time) DO NOTHING
";

pub struct PostgresHistory {
    client: Client,
    station_id: String,
    tolerance: Duration,
}

impl PostgresHistory {
    /// Wraps an open connection for one station.
    pub fn new(client: Client, station_id: &str, tolerance: Duration) -> Self {
        Self { client, station_id: station_id.to_string(), tolerance }
    }

    /// Connects to `database_url` with the default 30-minute tolerance.
    pub fn connect(database_url: &str, station_id: &str) -> Result<Self, postgres::Error> {
        let client = Client::connect(database_url, NoTls)?;
        Ok(Self::new(client, station_id, Duration::minutes(DEFAULT_TOLERANCE_MINUTES)))
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Available data range for the station, `None` when it has no rows.
    pub fn data_range(&mut self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, postgres::Error> {
        let row = self.client.query_one(
            "SELECT MIN(measurement_time), MAX(measurement_time)
             FROM baro.pressure_readings
             WHERE station_id = $1",
            &[&self.station_id],
        )?;

        let min: Option<DateTime<Utc>> = row.get(0);
        let max: Option<DateTime<Utc>> = row.get(1);

        match (min, max) {
            (Some(start), Some(end)) => Ok(Some((start, end))),
            _ => Ok(None),
        }
    }
}

fn backend(err: postgres::Error) -> HistoryError {
    HistoryError::Backend(err.to_string())
}

impl HistoryProvider for PostgresHistory {
    fn lookup(&mut self, at: DateTime<Utc>) -> Result<PressureSample, HistoryError> {
        let earliest = window_start(at, self.tolerance);
        let row = self
            .client
            .query_opt(LOOKUP_QUERY, &[&self.station_id, &earliest, &at])
            .map_err(backend)?
            .ok_or(HistoryError::NotFound { at })?;

        let timestamp: DateTime<Utc> = row.try_get(0).map_err(backend)?;
        let value_hpa: f64 = row.try_get(1).map_err(backend)?;
        Ok(PressureSample::new(value_hpa, timestamp))
    }

    fn record(&mut self, sample: &PressureSample) -> Result<(), HistoryError> {
        self.client
            .execute(INSERT_QUERY, &[&self.station_id, &sample.timestamp, &sample.value_hpa])
            .map_err(backend)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Integration Tests - live database
// ---------------------------------------------------------------------------
//
// These need a PostgreSQL instance with sql/001_pressure_readings.sql applied
// and DATABASE_URL set (a .env file works). They are marked #[ignore] so they
// don't run during normal builds.
//
//   cargo test -- --ignored pressure_history_db
