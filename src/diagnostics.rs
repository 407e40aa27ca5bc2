use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::action_mapper::LogicalState;

/// Non-fatal conditions surfaced alongside an otherwise successful result.
/// None of these propagate past the supervisor as an error (spec.md §7).
#[derive(Clone, Debug, Serialize)]
pub enum SolveDiagnostic {
    /// Fewer than 24h of usable load history remained after filtering;
    /// the forecast fell back to a flat mean.
    DegradedForecast { usable_hours: f64 },
    /// The solve exceeded its time budget and was cancelled.
    SolveTimeout,
    /// The measured SoC fell outside `[soc_min, soc_max]` and was clamped
    /// before solving.
    ClampedSoc { requested_pct: f64, clamped_pct: f64 },
}

/// One row of the §6 diagnostic `plan` table: the 288-row matrix annotated
/// with the policy's per-slot SoC forecast, the mapped FSM state for the
/// block the slot falls in, and running cost totals.
#[derive(Clone, Debug, Serialize)]
pub struct PlanRow {
    pub time: DateTime<Utc>,
    pub import_rate_c: f64,
    pub export_rate_c: f64,
    pub fsm_state: LogicalState,
    pub inverter_limit_kw: f64,
    pub pv_forecast_kw: f64,
    pub load_forecast_kw: f64,
    pub air_temp_forecast_c: f64,
    pub soc_forecast_pct: f64,
    pub interval_cost_c: f64,
    pub cumulative_total_c: f64,
}

/// Scalar current-status surface (spec.md §6).
#[derive(Clone, Debug, Serialize)]
pub struct StatusSnapshot {
    pub state: LogicalState,
    pub reason: String,
    pub current_price_c: f64,
    pub soc_pct: f64,
    pub solar_power_kw: f64,
    pub load_power_kw: f64,
    pub grid_power_kw: f64,
    pub battery_power_kw: f64,
}
