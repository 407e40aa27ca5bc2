use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of 5-minute slots in a 24h forecast horizon.
pub const SLOTS_PER_DAY: usize = 288;

/// Length of one slot, in minutes.
pub const SLOT_MINUTES: i64 = 5;

/// One row of the 288-row forecast matrix (C4 output).
///
/// Invariant: a full matrix has exactly `SLOTS_PER_DAY` rows, slot 0's
/// `period_start` equals the alignment instant, and `period_end[i] ==
/// period_start[i + 1]` for every `i`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ForecastRow {
    pub slot_index: usize,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Price per kWh paid for grid energy consumed, in cents.
    pub import_rate_c: f64,
    /// Price per kWh received for grid energy produced, in cents. May be negative.
    pub export_rate_c: f64,
    /// Expected PV generation over the slot, in kW.
    pub pv_kw: f64,
    /// Expected household load over the slot, in kW.
    pub load_kw: f64,
    /// Forecast outdoor temperature at the slot midpoint, in Celsius.
    pub temp_c: f64,
}

/// Sign of a block's net balance. A net balance of exactly zero is its own
/// class -- neither charging nor discharging territory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceSign {
    Deficit,
    Zero,
    Surplus,
}

impl BalanceSign {
    pub fn of(balance_kwh: f64) -> Self {
        if balance_kwh > 0.0 {
            BalanceSign::Deficit
        } else if balance_kwh < 0.0 {
            BalanceSign::Surplus
        } else {
            BalanceSign::Zero
        }
    }
}

/// One compressed interval of the forecast matrix (C5 output).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub block_index: usize,
    pub start_slot: usize,
    /// Non-inclusive.
    pub end_slot_exclusive: usize,
    pub duration_h: f64,
    pub import_rate_c: f64,
    pub export_rate_c: f64,
    /// Signed energy over the block. Positive means the house needs energy.
    pub balance_kwh: f64,
    pub balance_sign: BalanceSign,
}

impl Block {
    pub fn slot_count(&self) -> usize {
        self.end_slot_exclusive - self.start_slot
    }
}

/// Process-wide battery calibration, read-only for the duration of a solve.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BatteryParameters {
    pub capacity_kwh: f64,
    pub max_charge_kw: f64,
    pub max_discharge_kw: f64,
    pub inverter_limit_kw: f64,
    pub soc_min_pct: f64,
    pub soc_max_pct: f64,
    pub soc_grid_pct: f64,
}

impl Default for BatteryParameters {
    fn default() -> Self {
        BatteryParameters {
            capacity_kwh: 27.0,
            max_charge_kw: 6.3,
            max_discharge_kw: 6.3,
            inverter_limit_kw: 10.0,
            soc_min_pct: 0.0,
            soc_max_pct: 100.0,
            soc_grid_pct: 5.0,
        }
    }
}

/// The ordered sequence of target SoCs produced by the DP optimizer.
/// `policy[0]` is the current measured SoC; `policy[b]` is the target SoC
/// at the end of block `b - 1`.
pub type Policy = Vec<f64>;

/// One sample of cumulative energy from the history provider (C3 input).
#[derive(Clone, Debug, Deserialize)]
pub struct LoadHistorySample {
    pub entity_id: String,
    /// Raw state as reported, before numeric parsing/rejection.
    pub state: String,
    pub last_changed: DateTime<Utc>,
}

impl LoadHistorySample {
    /// Parses `state` as cumulative kWh. Rejects non-numeric samples per §4.3 step 1.
    pub fn state_kwh(&self) -> Option<f64> {
        self.state.trim().parse::<f64>().ok()
    }
}
