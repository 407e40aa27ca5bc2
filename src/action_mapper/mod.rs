use serde::Serialize;

use crate::common::models::{BatteryParameters, Block};

/// Power threshold below which a battery target is treated as noise rather
/// than an intent to charge or discharge. Suppresses chatter from
/// quantization slack in the DP policy.
const EPSILON_KW: f64 = 0.05;

/// How far ahead `PRESERVE` is allowed to look for an upcoming charge
/// opportunity, in hours.
const PRESERVE_LOOKAHEAD_H: f64 = 1.0;

/// SoC deltas smaller than this are quantization noise, not a real future
/// target above the current SoC.
const PRESERVE_SOC_EPSILON_PCT: f64 = 1e-6;

/// Advisory state handed to the hardware layer; purely a recommendation,
/// never itself a physical command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LogicalState {
    ChargeGrid,
    ChargeSolar,
    DischargeHome,
    Preserve,
    Idle,
}

/// A mapped logical state plus the power limit the hardware layer should
/// honor while acting on it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Action {
    pub state: LogicalState,
    pub limit_kw: f64,
}

/// Maps the first step of a solved policy onto a logical state.
///
/// # Arguments
///
/// * `policy_0` - current measured SoC
/// * `policy_1` - target SoC at the end of `current_block`
/// * `current_block` - block 0 of the compressed schedule
/// * `upcoming_blocks` - blocks strictly after `current_block`, used only
///   to look for a `PRESERVE` opportunity within the next hour
/// * `upcoming_targets` - the DP policy's target SoC at the end of each
///   entry in `upcoming_blocks`, i.e. `policy[2..]` aligned index-for-index
///   with `upcoming_blocks`
/// * `battery` - process-wide calibration
pub fn map(
    policy_0: f64,
    policy_1: f64,
    current_block: &Block,
    upcoming_blocks: &[Block],
    upcoming_targets: &[f64],
    battery: &BatteryParameters,
) -> Action {
    let battery_kw_target =
        (policy_1 - policy_0) / 100.0 * battery.capacity_kwh / current_block.duration_h;

    if battery_kw_target > EPSILON_KW {
        let limit_kw = battery_kw_target.min(battery.max_charge_kw).min(battery.inverter_limit_kw);
        let state = if current_block.balance_sign == crate::common::models::BalanceSign::Surplus {
            LogicalState::ChargeSolar
        } else {
            LogicalState::ChargeGrid
        };
        return Action { state, limit_kw };
    }

    if battery_kw_target < -EPSILON_KW {
        let limit_kw = battery_kw_target.abs().min(battery.max_discharge_kw);
        return Action {
            state: LogicalState::DischargeHome,
            limit_kw,
        };
    }

    if preserve_opportunity_ahead(policy_0, upcoming_blocks, upcoming_targets) {
        return Action {
            state: LogicalState::Preserve,
            limit_kw: 0.0,
        };
    }

    Action {
        state: LogicalState::Idle,
        limit_kw: 0.0,
    }
}

/// `true` if any block starting within the next hour has a DP-solved
/// target SoC above the current one -- i.e. the policy itself (not a
/// guess from balance sign) says there's an imminent reason not to
/// discharge away headroom that's about to be useful.
///
/// `upcoming_targets` must be aligned index-for-index with `upcoming_blocks`
/// (the caller passes `policy[2..]`); entries beyond the shorter of the two
/// slices are ignored.
fn preserve_opportunity_ahead(current_soc: f64, upcoming_blocks: &[Block], upcoming_targets: &[f64]) -> bool {
    let mut elapsed_h = 0.0;
    for (block, &target_soc) in upcoming_blocks.iter().zip(upcoming_targets) {
        if elapsed_h >= PRESERVE_LOOKAHEAD_H {
            break;
        }
        if target_soc > current_soc + PRESERVE_SOC_EPSILON_PCT {
            return true;
        }
        elapsed_h += block.duration_h;
    }
    false
}
