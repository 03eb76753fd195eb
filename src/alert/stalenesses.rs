/// Pressure sample staleness detection.
///
/// ASOS stations report roughly hourly, and the IEM current-conditions feed
/// keeps serving the last observation when a station goes quiet. Comparing a
/// frozen reading against a three-hour-old one would report "No change"
/// while a front moves through, so the poll loop drops samples older than
/// the configured age.
///
/// # Clock injection
/// All functions accept a `now: DateTime<Utc>` parameter rather than calling
/// `Utc::now()` internally. This makes staleness purely deterministic in
/// tests without mocking or time manipulation.

use chrono::{DateTime, Utc};

use crate::model::PressureSample;

// ---------------------------------------------------------------------------
// Staleness check
// ---------------------------------------------------------------------------

/// Age of a sample in whole minutes relative to `now`. Samples timestamped
/// in the future count as zero minutes old.
pub fn age_minutes_at(sample: &PressureSample, now: DateTime<Utc>) -> u64 {
    (now - sample.timestamp).num_minutes().max(0) as u64
}

/// Returns `true` if the sample is older than `max_age_minutes` relative
/// to `now`.
///
/// Staleness is defined as strictly greater than the threshold:
///   age > max_age_minutes  →  stale
///   age == max_age_minutes →  not stale
pub fn is_stale_at(sample: &PressureSample, max_age_minutes: u64, now: DateTime<Utc>) -> bool {
    age_minutes_at(sample, now) > max_age_minutes
}

/// Convenience wrapper that uses the real current time.
/// Use `is_stale_at` in tests to keep them deterministic.
pub fn is_stale(sample: &PressureSample, max_age_minutes: u64) -> bool {
    is_stale_at(sample, max_age_minutes, Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    /// A fixed "now" used across all tests: 2024-05-01 13:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn sample_minutes_ago(minutes: i64) -> PressureSample {
        PressureSample::new(1012.4, fixed_now() - Duration::minutes(minutes))
    }

    // --- Not stale ----------------------------------------------------------

    #[test]
    fn test_sample_5_minutes_old_is_not_stale() {
        assert!(!is_stale_at(&sample_minutes_ago(5), 15, fixed_now()));
    }

    #[test]
    fn test_sample_exactly_at_threshold_is_not_stale() {
        // Age == threshold should NOT be considered stale (strictly greater than).
        assert!(
            !is_stale_at(&sample_minutes_ago(90), 90, fixed_now()),
            "sample exactly at threshold should not be stale"
        );
    }

    #[test]
    fn test_sample_from_the_future_is_not_stale() {
        let sample = PressureSample::new(1012.4, fixed_now() + Duration::minutes(3));
        assert_eq!(age_minutes_at(&sample, fixed_now()), 0);
        assert!(!is_stale_at(&sample, 0, fixed_now()));
    }

    // --- Stale --------------------------------------------------------------

    #[test]
    fn test_sample_one_minute_past_threshold_is_stale() {
        assert!(is_stale_at(&sample_minutes_ago(91), 90, fixed_now()));
    }

    #[test]
    fn test_same_sample_stale_under_tight_threshold_not_under_loose() {
        let sample = sample_minutes_ago(70);
        assert!(is_stale_at(&sample, 60, fixed_now()));
        assert!(!is_stale_at(&sample, 90, fixed_now()));
    }
}
