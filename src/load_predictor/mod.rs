pub mod errors;

use std::collections::HashMap;

use chrono::{DateTime, Datelike, TimeDelta, Timelike, Utc};

use crate::common::models::{LoadHistorySample, SLOTS_PER_DAY};
use crate::diagnostics::SolveDiagnostic;
use crate::load_predictor::errors::LoadPredictorError;

/// Minimum span of usable history required before the bucketed predictor
/// is trusted; below this, §4.3 falls back to a flat mean.
const MIN_USABLE_HOURS: f64 = 24.0;

/// Optional outdoor-temperature sensitivity applied to the raw forecast.
#[derive(Clone, Copy, Debug)]
pub struct TemperatureSensitivity {
    /// Scaling coefficient; zero disables the adjustment entirely.
    pub k: f64,
    pub baseline_c: f64,
}

impl Default for TemperatureSensitivity {
    fn default() -> Self {
        TemperatureSensitivity {
            k: 0.0,
            baseline_c: 18.0,
        }
    }
}

/// Derives a 288-slot household load forecast (kW) from five days of
/// cumulative energy meter history.
///
/// # Arguments
///
/// * `samples` - history samples spanning `[forecast_start - 5 days, forecast_start]`
/// * `forecast_start` - the current tick's `period_start`; forecast slot 0 begins here
/// * `temp_forecast` - per-slot outdoor temperature forecast for the 288 slots ahead, if available
/// * `sensitivity` - temperature scaling; `k == 0.0` disables step 7 entirely
pub fn predict(
    samples: &[LoadHistorySample],
    forecast_start: DateTime<Utc>,
    temp_forecast: Option<&[f64; SLOTS_PER_DAY]>,
    sensitivity: TemperatureSensitivity,
) -> Result<([f64; SLOTS_PER_DAY], Option<SolveDiagnostic>), LoadPredictorError> {
    // Step 1: reject non-numeric samples.
    let mut numeric: Vec<(DateTime<Utc>, f64)> = samples
        .iter()
        .filter_map(|s| s.state_kwh().map(|v| (s.last_changed, v)))
        .collect();

    if numeric.is_empty() {
        return Err(LoadPredictorError::NoUsableSamples);
    }

    // Step 2: sort ascending by last_changed.
    numeric.sort_by_key(|(t, _)| *t);

    let usable_hours = (numeric.last().unwrap().0 - numeric.first().unwrap().0).num_seconds() as f64 / 3600.0;

    if usable_hours < MIN_USABLE_HOURS {
        let mean = numeric.iter().map(|(_, v)| *v).sum::<f64>() / numeric.len() as f64;
        let flat = [mean.max(0.0); SLOTS_PER_DAY];
        return Ok((
            flat,
            Some(SolveDiagnostic::DegradedForecast { usable_hours }),
        ));
    }

    let history_start = forecast_start - TimeDelta::days(5);

    // Steps 3-5: interpolate cumulative energy onto the 5-minute lattice,
    // take deltas, repair midnight resets, convert to kW.
    let deltas_kw = derive_slot_deltas_kw(&numeric, history_start, forecast_start);

    // Step 6: bucket by (weekday, slot-of-day) and average.
    let mut buckets: HashMap<(u32, usize), Vec<f64>> = HashMap::new();
    for (i, &delta_kw) in deltas_kw.iter().enumerate() {
        let t = history_start + TimeDelta::minutes(5 * i as i64);
        let weekday = t.weekday().num_days_from_monday();
        let slot_of_day = slot_of_day(t);
        buckets.entry((weekday, slot_of_day)).or_default().push(delta_kw);
    }
    // Fallback bucket ignoring weekday, for forecast days whose weekday
    // never occurred in the 5-day history window.
    let mut slot_only: HashMap<usize, Vec<f64>> = HashMap::new();
    for (&(_, slot), values) in buckets.iter() {
        slot_only.entry(slot).or_default().extend(values.iter().copied());
    }

    let overall_mean = deltas_kw.iter().sum::<f64>() / deltas_kw.len().max(1) as f64;

    let mut forecast = [0.0; SLOTS_PER_DAY];
    for (i, slot) in forecast.iter_mut().enumerate() {
        let t = forecast_start + TimeDelta::minutes(5 * i as i64);
        let weekday = t.weekday().num_days_from_monday();
        let slot_of_day_idx = slot_of_day(t);

        let mut value = buckets
            .get(&(weekday, slot_of_day_idx))
            .map(|v| mean(v))
            .or_else(|| slot_only.get(&slot_of_day_idx).map(|v| mean(v)))
            .unwrap_or(overall_mean)
            .max(0.0);

        // Step 7: optional temperature adjustment.
        if sensitivity.k != 0.0 {
            if let Some(temps) = temp_forecast {
                value *= 1.0 + sensitivity.k * (temps[i] - sensitivity.baseline_c);
            }
        }

        *slot = value.max(0.0);
    }

    Ok((forecast, None))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn slot_of_day(t: DateTime<Utc>) -> usize {
    (t.hour() * 12 + t.minute() / 5) as usize
}

/// Interpolates cumulative energy onto every 5-minute boundary between
/// `history_start` and `history_end`, differences consecutive boundaries,
/// repairs midnight-reset deltas, and converts kWh/slot to kW.
fn derive_slot_deltas_kw(
    numeric: &[(DateTime<Utc>, f64)],
    history_start: DateTime<Utc>,
    history_end: DateTime<Utc>,
) -> Vec<f64> {
    let total_minutes = (history_end - history_start).num_minutes();
    let boundary_count = (total_minutes / 5 + 1) as usize;

    let cumulative: Vec<f64> = (0..boundary_count)
        .map(|i| {
            let t = history_start + TimeDelta::minutes(5 * i as i64);
            interpolate_cumulative(numeric, t)
        })
        .collect();

    let mut raw_deltas_kwh: Vec<f64> = cumulative.windows(2).map(|w| w[1] - w[0]).collect();

    // Step 4: a negative delta is a midnight reset; substitute the
    // immediately preceding valid (non-reset) delta, never zero.
    let mut last_valid = 0.0;
    let mut first_valid_seen = false;
    for d in raw_deltas_kwh.iter_mut() {
        if *d < 0.0 {
            *d = last_valid;
        } else {
            last_valid = *d;
            first_valid_seen = true;
        }
    }
    if !first_valid_seen {
        raw_deltas_kwh.iter_mut().for_each(|d| *d = 0.0);
    } else if raw_deltas_kwh[0] == 0.0 {
        // The very first boundary has no predecessor to borrow from; backfill
        // from the first slot that did carry a real reading.
        if let Some(first_real) = raw_deltas_kwh.iter().find(|&&d| d != 0.0) {
            let fill = *first_real;
            for d in raw_deltas_kwh.iter_mut() {
                if *d == 0.0 {
                    *d = fill;
                } else {
                    break;
                }
            }
        }
    }

    // Step 5: kWh per 5-minute slot -> kW.
    raw_deltas_kwh.into_iter().map(|kwh| kwh * 12.0).collect()
}

/// Linearly interpolates cumulative energy at `t` between the two
/// flanking raw samples. Clamps to the nearest endpoint outside the
/// sampled range.
fn interpolate_cumulative(numeric: &[(DateTime<Utc>, f64)], t: DateTime<Utc>) -> f64 {
    if t <= numeric[0].0 {
        return numeric[0].1;
    }
    if t >= numeric[numeric.len() - 1].0 {
        return numeric[numeric.len() - 1].1;
    }

    let idx = match numeric.binary_search_by_key(&t, |(ts, _)| *ts) {
        Ok(i) => return numeric[i].1,
        Err(i) => i,
    };

    let (t0, v0) = numeric[idx - 1];
    let (t1, v1) = numeric[idx];
    let span = (t1 - t0).num_milliseconds() as f64;
    let frac = (t - t0).num_milliseconds() as f64 / span;
    v0 + (v1 - v0) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(entity: &str, minutes: i64, kwh: f64, base: DateTime<Utc>) -> LoadHistorySample {
        LoadHistorySample {
            entity_id: entity.to_string(),
            state: kwh.to_string(),
            last_changed: base + TimeDelta::minutes(minutes),
        }
    }

    #[test]
    fn insufficient_history_falls_back_to_flat_mean() {
        let base = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let forecast_start = base + TimeDelta::hours(10);
        let samples = vec![
            sample("m", 0, 1.0, base),
            sample("m", 60, 1.5, base),
            sample("m", 120, 2.0, base),
        ];

        let (forecast, diag) = predict(&samples, forecast_start, None, TemperatureSensitivity::default()).unwrap();
        assert!(matches!(diag, Some(SolveDiagnostic::DegradedForecast { .. })));
        assert!(forecast.iter().all(|&v| (v - forecast[0]).abs() < 1e-9));
    }

    #[test]
    fn non_numeric_samples_are_rejected() {
        let base = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let forecast_start = base + TimeDelta::days(5);
        let mut samples = Vec::new();
        // five days of steady +0.1kWh every 5 minutes, plus garbage entries
        for i in 0..(5 * SLOTS_PER_DAY) {
            samples.push(sample("m", i as i64 * 5, i as f64 * 0.1, base));
        }
        samples.push(LoadHistorySample {
            entity_id: "m".to_string(),
            state: "unavailable".to_string(),
            last_changed: base + TimeDelta::minutes(10),
        });

        let (forecast, diag) = predict(&samples, forecast_start, None, TemperatureSensitivity::default()).unwrap();
        assert!(diag.is_none());
        // Roughly 0.1kWh/5min steady consumption -> 1.2 kW
        assert!((forecast[0] - 1.2).abs() < 0.2);
    }

    #[test]
    fn midnight_reset_delta_borrows_preceding_value_never_zero() {
        let base = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let forecast_start = base + TimeDelta::days(5);

        // Build a monotonic series that resets to 0 once per day (meter rollover),
        // climbing by 0.2 kWh every 5 minutes within a day.
        let mut samples = Vec::new();
        for day in 0..5 {
            for slot in 0..SLOTS_PER_DAY {
                let minutes = day * 24 * 60 + slot as i64 * 5;
                let value = slot as f64 * 0.2;
                samples.push(sample("m", minutes, value, base));
            }
        }

        let deltas = derive_slot_deltas_kw(
            &{
                let mut numeric: Vec<(DateTime<Utc>, f64)> = samples
                    .iter()
                    .filter_map(|s| s.state_kwh().map(|v| (s.last_changed, v)))
                    .collect();
                numeric.sort_by_key(|(t, _)| *t);
                numeric
            },
            base,
            forecast_start,
        );

        // Every day boundary (slot index a multiple of SLOTS_PER_DAY, except the very first)
        // must equal the immediately preceding delta, and never be zero-by-reset.
        for day in 1..5 {
            let reset_idx = day * SLOTS_PER_DAY;
            assert_eq!(deltas[reset_idx], deltas[reset_idx - 1]);
            assert!(deltas[reset_idx] > 0.0);
        }
    }

    #[test]
    fn temperature_sensitivity_scales_forecast_when_enabled() {
        let base = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let forecast_start = base + TimeDelta::days(5);
        let mut samples = Vec::new();
        for i in 0..(5 * SLOTS_PER_DAY) {
            samples.push(sample("m", i as i64 * 5, 1.0, base));
        }

        let hot_temps = [30.0; SLOTS_PER_DAY];
        let (with_sensitivity, _) = predict(
            &samples,
            forecast_start,
            Some(&hot_temps),
            TemperatureSensitivity { k: 0.01, baseline_c: 18.0 },
        )
        .unwrap();
        let (without_sensitivity, _) =
            predict(&samples, forecast_start, Some(&hot_temps), TemperatureSensitivity::default()).unwrap();

        assert!(with_sensitivity[0] > without_sensitivity[0]);
    }
}
