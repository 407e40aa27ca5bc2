use chrono::{DateTime, TimeDelta, Utc};

use crate::common::models::{ForecastRow, SLOTS_PER_DAY, SLOT_MINUTES};

/// Zips the tariff, PV, and load series plus a temperature forecast into
/// the 288-row forecast matrix. Purely an assembly step; no series is
/// recomputed here.
///
/// # Arguments
///
/// * `day_start` - slot 0's `period_start`
/// * `import_rate_c`, `export_rate_c` - C1 output
/// * `pv_kw`, `load_kw` - C2/C3 output
/// * `temp_c` - forecast outdoor temperature, matched to each slot's
///   midpoint by nearest neighbor
pub fn build(
    day_start: DateTime<Utc>,
    import_rate_c: &[f64; SLOTS_PER_DAY],
    export_rate_c: &[f64; SLOTS_PER_DAY],
    pv_kw: &[f64; SLOTS_PER_DAY],
    load_kw: &[f64; SLOTS_PER_DAY],
    temp_c: &[(DateTime<Utc>, f64)],
) -> [ForecastRow; SLOTS_PER_DAY] {
    std::array::from_fn(|slot_index| {
        let period_start = day_start + TimeDelta::minutes(SLOT_MINUTES * slot_index as i64);
        let period_end = period_start + TimeDelta::minutes(SLOT_MINUTES);
        let midpoint = period_start + TimeDelta::seconds(SLOT_MINUTES * 30);

        ForecastRow {
            slot_index,
            period_start,
            period_end,
            import_rate_c: import_rate_c[slot_index],
            export_rate_c: export_rate_c[slot_index],
            pv_kw: pv_kw[slot_index],
            load_kw: load_kw[slot_index],
            temp_c: nearest_temperature(temp_c, midpoint),
        }
    })
}

/// Finds the temperature sample whose timestamp is closest to `midpoint`.
/// Falls back to `0.0` if no samples are supplied -- temperature is only
/// ever consumed by an optional sensitivity adjustment upstream, so an
/// absent series should not fail the tick.
fn nearest_temperature(temp_c: &[(DateTime<Utc>, f64)], midpoint: DateTime<Utc>) -> f64 {
    temp_c
        .iter()
        .min_by_key(|(t, _)| (*t - midpoint).num_milliseconds().abs())
        .map(|(_, v)| *v)
        .unwrap_or(0.0)
}
