/// Barometric trend classification.
///
/// The current reading picks one of four absolute pressure bands; within the
/// band, the three-hour tendency (`current - past`, negative when falling)
/// picks the first matching rule. Both levels are plain data so that band
/// edges and rule ranges can be checked mechanically.
///
/// Thresholds are fixed domain constants and are not configurable.

use std::ops::{Bound, RangeBounds};

use crate::model::{
    AlertLevel, ClassificationResult, EvaluationError, PressureBand, SampleRole,
};

use Bound::{Excluded, Included, Unbounded};

// ---------------------------------------------------------------------------
// Decision table
// ---------------------------------------------------------------------------

/// One guarded case of a band.
#[derive(Debug)]
pub struct TrendRule {
    /// Range of the three-hour tendency (hPa) this rule covers.
    pub tendency: (Bound<f64>, Bound<f64>),
    /// Extra guard on the current reading: rule only applies strictly above it.
    pub current_above: Option<f64>,
    pub label: &'static str,
    pub alert_level: AlertLevel,
}

impl TrendRule {
    fn matches(&self, current_hpa: f64, tendency_hpa: f64) -> bool {
        let above = self.current_above.is_none_or(|floor| current_hpa > floor);
        above && self.tendency.contains(&tendency_hpa)
    }
}

/// An absolute pressure range with its ordered rules.
#[derive(Debug)]
pub struct Band {
    pub band: PressureBand,
    pub range: (Bound<f64>, Bound<f64>),
    pub rules: &'static [TrendRule],
}

const fn rule(
    lower: Bound<f64>,
    upper: Bound<f64>,
    label: &'static str,
    alert_level: AlertLevel,
) -> TrendRule {
    TrendRule { tendency: (lower, upper), current_above: None, label, alert_level }
}

const POORER_WEATHER: &str = "Poorer weather to come";
const NO_CHANGE: &str = "No change";
const RAIN_AND_WIND: &str = "Rain and Wind";

static LOW_RULES: [TrendRule; 4] = [
    rule(Included(0.0), Unbounded, "Clearing and Colder", AlertLevel::None),
    rule(Excluded(-4.0), Excluded(0.0), RAIN_AND_WIND, AlertLevel::Alert),
    rule(Excluded(-10.0), Included(-4.0), "Storm", AlertLevel::Alarm),
    rule(Unbounded, Included(-10.0), "Storm and Gale", AlertLevel::Alarm),
];

static NORMAL_RULES: [TrendRule; 3] = [
    TrendRule {
        tendency: (Included(1.1), Included(2.7)),
        current_above: Some(1015.0),
        label: POORER_WEATHER,
        alert_level: AlertLevel::Alert,
    },
    rule(Unbounded, Included(-4.0), RAIN_AND_WIND, AlertLevel::Alert),
    rule(Unbounded, Unbounded, NO_CHANGE, AlertLevel::None),
];

static ELEVATED_RULES: [TrendRule; 5] = [
    rule(Excluded(2.7), Unbounded, NO_CHANGE, AlertLevel::None),
    rule(Included(1.1), Included(2.7), POORER_WEATHER, AlertLevel::Alert),
    rule(Excluded(-1.1), Excluded(1.1), "Fair with slight temperature change", AlertLevel::None),
    rule(Excluded(-4.0), Included(-1.1), "No change and rain within 24 hours", AlertLevel::None),
    rule(Unbounded, Included(-4.0), "Rain, increasing wind and temperature", AlertLevel::Alert),
];

static HIGH_RULES: [TrendRule; 5] = [
    rule(Excluded(2.7), Unbounded, "Fair weather", AlertLevel::None),
    rule(Included(1.1), Included(2.7), POORER_WEATHER, AlertLevel::Alert),
    rule(Excluded(-1.1), Excluded(1.1), "Fair, no marked temperature change", AlertLevel::None),
    rule(Excluded(-4.0), Included(-1.1), "Fair and slowly rising temperature", AlertLevel::None),
    rule(Unbounded, Included(-4.0), "Warming trend", AlertLevel::None),
];

/// All bands, ordered from lowest to highest pressure.
pub static BANDS: [Band; 4] = [
    Band { band: PressureBand::Low, range: (Unbounded, Excluded(1009.0)), rules: &LOW_RULES },
    Band {
        band: PressureBand::Normal,
        range: (Included(1009.0), Excluded(1019.0)),
        rules: &NORMAL_RULES,
    },
    Band {
        band: PressureBand::Elevated,
        range: (Included(1019.0), Excluded(1023.0)),
        rules: &ELEVATED_RULES,
    },
    Band { band: PressureBand::High, range: (Included(1023.0), Unbounded), rules: &HIGH_RULES },
];

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Finds the band containing `current_hpa`. `None` only for NaN.
pub fn band_for(current_hpa: f64) -> Option<&'static Band> {
    BANDS.iter().find(|b| b.range.contains(&current_hpa))
}

/// Finds the rule for a current reading and a three-hour tendency.
///
/// Returns `None` only when an input is NaN; for every other pair exactly
/// one band and one rule apply.
pub fn rule_for(current_hpa: f64, tendency_hpa: f64) -> Option<(&'static Band, &'static TrendRule)> {
    let band = band_for(current_hpa)?;
    let rule = band.rules.iter().find(|r| r.matches(current_hpa, tendency_hpa))?;
    Some((band, rule))
}

/// Tendencies are compared in hundredths of a hPa. Readings arrive at
/// 0.1 hPa, so the raw `f64` subtraction can land a hair either side of 1.1
/// or 2.7.
pub const TENDENCY_STEPS_PER_HPA: f64 = 100.0;

// Dividing the rounded step count keeps 110 / 100 equal to the literal 1.1.
fn quantize(hpa: f64) -> f64 {
    (hpa * TENDENCY_STEPS_PER_HPA).round() / TENDENCY_STEPS_PER_HPA
}

/// Classifies the weather trend from the current reading and the reading
/// taken three hours earlier.
///
/// The rules match on the tendency `current - past` while the reported
/// `difference` is `past - current`, so the two have opposite signs: a
/// 6 hPa fall matches rules at `-6` and reports `difference = 6`.
///
/// Pure and deterministic. Fails with `MalformedSample` only for non-finite
/// input, which no row of the table covers.
pub fn classify(current_hpa: f64, past_hpa: f64) -> Result<ClassificationResult, EvaluationError> {
    if !current_hpa.is_finite() {
        return Err(EvaluationError::MalformedSample { role: SampleRole::Current, value: current_hpa });
    }
    if !past_hpa.is_finite() {
        return Err(EvaluationError::MalformedSample { role: SampleRole::Past, value: past_hpa });
    }

    let tendency = quantize(current_hpa - past_hpa);
    let (band, rule) = rule_for(current_hpa, tendency).ok_or(EvaluationError::MalformedSample {
        role: SampleRole::Current,
        value: current_hpa,
    })?;

    Ok(ClassificationResult {
        label: rule.label,
        alert_level: rule.alert_level,
        band: band.band,
        current_value: current_hpa,
        past_value: past_hpa,
        difference: quantize(past_hpa - current_hpa),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
