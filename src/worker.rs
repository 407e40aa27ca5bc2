use chrono::{DateTime, TimeDelta, Utc};
use log::info;

use crate::action_mapper::{self, Action};
use crate::block_compressor;
use crate::common::models::{Block, ForecastRow, BatteryParameters, SLOT_MINUTES};
use crate::diagnostics::{PlanRow, StatusSnapshot};
use crate::errors::SchedulingError;
use crate::initialization::Mgr;
use crate::load_predictor::{self, TemperatureSensitivity};
use crate::matrix_builder;
use crate::pv_aligner;
use crate::tariff_aligner;

/// Result of running one control tick end to end.
pub struct TickResult {
    pub action: Action,
    pub plan: Vec<PlanRow>,
    pub status: StatusSnapshot,
}

/// Runs one 5-minute control tick: fetches forecasts from the configured
/// providers, aligns and compresses them, submits a solve, and maps the
/// first step of the resulting policy onto a logical action.
///
/// # Arguments
///
/// * `mgr` - configured providers, battery calibration, and dispatcher
/// * `day_start` - the alignment instant; slot 0 begins here
/// * `current_soc_pct` - the measured state of charge at tick start
/// * `load_entity_id` - entity id to request history for from the history provider
pub async fn run(
    mgr: &Mgr,
    day_start: DateTime<Utc>,
    current_soc_pct: f64,
    load_entity_id: &str,
) -> Result<TickResult, SchedulingError> {
    let import_intervals = mgr.tariff.import_intervals(day_start)?;
    let export_intervals = mgr.tariff.export_intervals(day_start)?;
    let (import_rate_c, export_rate_c) =
        tariff_aligner::align_import_export(&import_intervals, &export_intervals, day_start)?;

    let pv_estimates = mgr.pv.estimates(day_start)?;
    let pv_kw = pv_aligner::align(&pv_estimates, day_start);

    let temps = mgr.weather.temperatures(day_start)?;

    let history_since = day_start - TimeDelta::days(5);
    let samples = mgr.history.samples(load_entity_id, history_since)?;
    let (load_kw, load_diagnostic) =
        load_predictor::predict(&samples, day_start, None, TemperatureSensitivity::default())?;

    let matrix = matrix_builder::build(day_start, &import_rate_c, &export_rate_c, &pv_kw, &load_kw, &temps);
    let blocks = block_compressor::compress(&matrix);

    info!("compressed {} slots into {} blocks", matrix.len(), blocks.len());

    let outcome = mgr
        .dispatcher
        .submit(current_soc_pct, blocks.clone(), mgr.battery)
        .await?;

    let action = action_mapper::map(
        outcome.policy[0],
        outcome.policy[1],
        &blocks[0],
        blocks.get(1..).unwrap_or(&[]),
        outcome.policy.get(2..).unwrap_or(&[]),
        &mgr.battery,
    );

    let plan = build_plan(&matrix, &blocks, &outcome.policy, &mgr.battery);

    let signed_battery_kw = match action.state {
        action_mapper::LogicalState::ChargeGrid | action_mapper::LogicalState::ChargeSolar => action.limit_kw,
        action_mapper::LogicalState::DischargeHome => -action.limit_kw,
        action_mapper::LogicalState::Preserve | action_mapper::LogicalState::Idle => 0.0,
    };

    let reason = match (&load_diagnostic, &outcome.diagnostic) {
        (Some(d), _) => format!("{d:?}"),
        (None, Some(d)) => format!("{d:?}"),
        (None, None) => "nominal".to_string(),
    };

    let status = StatusSnapshot {
        state: action.state,
        reason,
        current_price_c: matrix[0].import_rate_c,
        soc_pct: current_soc_pct,
        solar_power_kw: matrix[0].pv_kw,
        load_power_kw: matrix[0].load_kw,
        grid_power_kw: matrix[0].load_kw - matrix[0].pv_kw + signed_battery_kw,
        battery_power_kw: signed_battery_kw,
    };

    Ok(TickResult { action, plan, status })
}

/// Expands the block-level policy back onto the 288-row matrix for the
/// diagnostic plan table: SoC ramps linearly across each block (matching
/// the solver's constant-rate feasibility model), and each slot's share
/// of the block's cost is apportioned by an even per-slot battery delta.
fn build_plan(matrix: &[ForecastRow], blocks: &[Block], policy: &[f64], battery: &BatteryParameters) -> Vec<PlanRow> {
    let mut plan = Vec::with_capacity(matrix.len());
    let mut cumulative_total_c = 0.0;

    for (b, block) in blocks.iter().enumerate() {
        let soc_start = policy[b];
        let soc_end = policy[b + 1];
        let battery_delta_total_kwh = (soc_end - soc_start) / 100.0 * battery.capacity_kwh;
        let slot_count = block.slot_count();
        let per_slot_delta_kwh = battery_delta_total_kwh / slot_count as f64;

        let block_action = action_mapper::map(
            soc_start,
            soc_end,
            block,
            blocks.get(b + 1..).unwrap_or(&[]),
            policy.get(b + 2..).unwrap_or(&[]),
            battery,
        );

        for (local_index, row) in matrix[block.start_slot..block.end_slot_exclusive].iter().enumerate() {
            let slot_balance_kwh = (row.load_kw - row.pv_kw) * (SLOT_MINUTES as f64 / 60.0);
            let grid_kwh = slot_balance_kwh + per_slot_delta_kwh;
            let interval_cost_c = if grid_kwh >= 0.0 {
                grid_kwh * row.import_rate_c
            } else {
                grid_kwh * row.export_rate_c
            };
            cumulative_total_c += interval_cost_c;

            let soc_forecast_pct = soc_start + (soc_end - soc_start) * (local_index as f64 + 1.0) / slot_count as f64;

            plan.push(PlanRow {
                time: row.period_start,
                import_rate_c: row.import_rate_c,
                export_rate_c: row.export_rate_c,
                fsm_state: block_action.state,
                inverter_limit_kw: battery.inverter_limit_kw,
                pv_forecast_kw: row.pv_kw,
                load_forecast_kw: row.load_kw,
                air_temp_forecast_c: row.temp_c,
                soc_forecast_pct,
                interval_cost_c,
                cumulative_total_c,
            });
        }
    }

    plan
}
