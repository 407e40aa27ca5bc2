use chrono::{DateTime, TimeDelta, Utc};

use crate::common::models::SLOTS_PER_DAY;

/// One half-hour PV energy estimate as reported by a solar forecast
/// provider (Solcast-shaped: accumulated energy, keyed by the end of the
/// window it covers).
#[derive(Clone, Debug)]
pub struct PvEstimate {
    pub period_end: DateTime<Utc>,
    /// Energy produced over the preceding 30 minutes, in kWh.
    pub energy_kwh: f64,
}

const SLOTS_PER_WINDOW: usize = 6;
const WINDOWS_PER_DAY: usize = SLOTS_PER_DAY / SLOTS_PER_WINDOW;

/// Converts half-hour PV energy estimates into per-5-minute average power,
/// in kW.
///
/// Solcast reports accumulated energy, not instantaneous power, so each
/// half-hour's `E` kWh is attributed uniformly across its six slots
/// (`E/6` kWh, i.e. `2E` kW average) rather than ramped linearly --
/// there's no physical basis to prefer a particular ramp shape over
/// another within the window.
///
/// A half-hour window with no matching estimate is left at 0 kW; PV
/// absence (night, or a forecast gap) is physically meaningful and does
/// not fail the tick the way a tariff gap does.
pub fn align(estimates: &[PvEstimate], day_start: DateTime<Utc>) -> [f64; SLOTS_PER_DAY] {
    let mut pv_kw = [0.0; SLOTS_PER_DAY];

    for window in 0..WINDOWS_PER_DAY {
        let window_start = day_start + TimeDelta::minutes(30 * window as i64);
        let window_end = window_start + TimeDelta::minutes(30);

        let energy_kwh = estimates
            .iter()
            .find(|e| e.period_end > window_start && e.period_end <= window_end)
            .map(|e| e.energy_kwh)
            .unwrap_or(0.0);

        let power_kw = 2.0 * energy_kwh;
        let base_slot = window * SLOTS_PER_WINDOW;
        for slot in base_slot..base_slot + SLOTS_PER_WINDOW {
            pv_kw[slot] = power_kw;
        }
    }

    pv_kw
}

/// Recomposes per-5-minute power back into half-hour energy sums, used to
/// check round-trip fidelity against the original provider input.
pub fn recompose_half_hours(pv_kw: &[f64; SLOTS_PER_DAY]) -> [f64; WINDOWS_PER_DAY] {
    let mut energy_kwh = [0.0; WINDOWS_PER_DAY];
    for (window, slots) in pv_kw.chunks(SLOTS_PER_WINDOW).enumerate() {
        energy_kwh[window] = slots.iter().sum::<f64>() * (5.0 / 60.0);
    }
    energy_kwh
}
