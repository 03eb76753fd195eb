/// Pressure trend analysis for the storm alarm.
///
/// Submodules:
/// - `trend` — banded decision table mapping (current, 3-hour-ago) pressure
///   to a weather-trend label and alert level.

pub mod trend;
