pub mod errors;

use chrono::{DateTime, TimeDelta, Utc};

use crate::common::models::SLOTS_PER_DAY;
use crate::tariff_aligner::errors::TariffError;

/// One tariff interval as reported by a provider, possibly spanning several
/// 5-minute slots (5- or 30-minute cadence is both expected).
#[derive(Clone, Debug)]
pub struct TariffInterval {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub per_kwh: f64,
}

/// Expands a sequence of possibly heterogeneous-cadence tariff intervals
/// into a dense per-5-minute rate series, in cents/kWh.
///
/// Prices are policy, not physics: a slot whose midpoint isn't covered by
/// any interval fails the whole alignment rather than being interpolated
/// between neighboring, unrelated prices.
///
/// # Arguments
///
/// * `intervals` - provider intervals, in any order
/// * `day_start` - the alignment instant; slot 0's midpoint is `day_start + 2.5min`
pub fn align(
    intervals: &[TariffInterval],
    day_start: DateTime<Utc>,
) -> Result<[f64; SLOTS_PER_DAY], TariffError> {
    let mut rates = [0.0; SLOTS_PER_DAY];

    for (slot_index, rate) in rates.iter_mut().enumerate() {
        let slot_start = day_start + TimeDelta::minutes(5 * slot_index as i64);
        let midpoint = slot_start + TimeDelta::seconds(150);

        let covering = intervals
            .iter()
            .find(|iv| iv.period_start <= midpoint && midpoint < iv.period_end);

        match covering {
            Some(iv) => *rate = iv.per_kwh,
            None => {
                return Err(TariffError::Gap {
                    slot_index,
                    midpoint,
                });
            }
        }
    }

    Ok(rates)
}

/// Aligns the import and export series together, since they must be
/// separable but share the same slot lattice.
pub fn align_import_export(
    import: &[TariffInterval],
    export: &[TariffInterval],
    day_start: DateTime<Utc>,
) -> Result<([f64; SLOTS_PER_DAY], [f64; SLOTS_PER_DAY]), TariffError> {
    let import_rates = align(import, day_start)?;
    let export_rates = align(export, day_start)?;
    Ok((import_rates, export_rates))
}
