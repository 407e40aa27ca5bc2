use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::common::models::{BatteryParameters, Block, Policy};
use crate::diagnostics::SolveDiagnostic;

/// Successful (or cancelled) result of a single DP solve.
#[derive(Clone, Debug)]
pub struct SolveOutcome {
    pub policy: Policy,
    pub expected_cost_c: f64,
    pub diagnostic: Option<SolveDiagnostic>,
}

/// Floating-point costs within this tolerance are treated as tied for the
/// purpose of the successor tie-break rule.
const COST_EPSILON: f64 = 1e-9;

/// Solves for the least-cost sequence of end-of-block battery SoC targets.
///
/// `soc_pct` is quantized to multiples of `battery.soc_grid_pct`; the state
/// space is `(block_index, soc_state)` where `soc_state` indexes that grid.
/// Idle (`soc' == soc`) is always a candidate regardless of charge/discharge
/// rate limits, per §4.6 -- this is what lets the search notice that
/// refusing free solar is sometimes cheaper than a negative export rate.
///
/// Returns `None` if `cancel` is observed set at a block boundary; the
/// caller falls back to its last emitted action with no state change.
pub fn solve(
    initial_soc_pct: f64,
    blocks: &[Block],
    battery: &BatteryParameters,
    cancel: &AtomicBool,
) -> Option<SolveOutcome> {
    let grid = SocGrid::new(battery);
    let b_count = blocks.len();

    let (clamped_initial, clamp_diagnostic) = clamp_initial_soc(initial_soc_pct, battery);

    // cost[b][i] / best_next[b][i] for b in 0..=b_count, i in 0..grid.states
    let mut cost: Vec<Vec<f64>> = vec![vec![0.0; grid.states]; b_count + 1];
    let mut best_next: Vec<Vec<usize>> = vec![vec![0; grid.states]; b_count + 1];

    for b in (0..b_count).rev() {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }

        let block = &blocks[b];
        let next_cost = &cost[b + 1];

        let results: Vec<(f64, usize)> = (0..grid.states)
            .into_par_iter()
            .map(|i| best_successor(&grid, block, i, next_cost))
            .collect();

        for (i, (c, j)) in results.into_iter().enumerate() {
            cost[b][i] = c;
            best_next[b][i] = j;
        }
    }

    let start_state = grid.nearest_state(clamped_initial);

    let mut policy: Policy = Vec::with_capacity(b_count + 1);
    policy.push(clamped_initial);

    let mut state = start_state;
    for b in 0..b_count {
        let next_state = best_next[b][state];
        policy.push(grid.pct_of(next_state));
        state = next_state;
    }

    let expected_cost_c = cost[0][start_state];

    Some(SolveOutcome {
        policy,
        expected_cost_c,
        diagnostic: clamp_diagnostic,
    })
}

/// Evaluates every candidate successor state for `(block, i)` against the
/// already-solved `next_cost` table and returns `(cost, best_j)`.
fn best_successor(grid: &SocGrid, block: &Block, i: usize, next_cost: &[f64]) -> (f64, usize) {
    let soc = grid.pct_of(i);

    let mut best: Option<(f64, usize)> = None;

    for j in 0..grid.states {
        let soc_prime = grid.pct_of(j);
        if j != i && !grid.feasible(soc, soc_prime, block.duration_h) {
            continue;
        }

        let c = step_cost(block, soc, soc_prime, grid.battery.capacity_kwh) + next_cost[j];

        best = Some(match best {
            None => (c, j),
            Some((best_c, best_j)) => {
                if c < best_c - COST_EPSILON {
                    (c, j)
                } else if c < best_c + COST_EPSILON {
                    // tie: prefer soc' closest to current soc, then lower soc'
                    let cur_dist = (j as i64 - i as i64).abs();
                    let best_dist = (best_j as i64 - i as i64).abs();
                    if cur_dist < best_dist || (cur_dist == best_dist && j < best_j) {
                        (c, j)
                    } else {
                        (best_c, best_j)
                    }
                } else {
                    (best_c, best_j)
                }
            }
        });
    }

    // Idle is always feasible and was already considered at j == i above.
    best.expect("idle candidate guarantees at least one feasible successor")
}

/// The unified signed step-cost formula: import at `import_rate_c`,
/// export at `export_rate_c` (which may itself be negative, turning an
/// apparent credit into a penalty).
fn step_cost(block: &Block, soc: f64, soc_prime: f64, capacity_kwh: f64) -> f64 {
    let battery_delta_kwh = (soc_prime - soc) / 100.0 * capacity_kwh;
    let grid_kwh = block.balance_kwh + battery_delta_kwh;
    if grid_kwh >= 0.0 {
        grid_kwh * block.import_rate_c
    } else {
        grid_kwh * block.export_rate_c
    }
}

fn clamp_initial_soc(initial_soc_pct: f64, battery: &BatteryParameters) -> (f64, Option<SolveDiagnostic>) {
    let clamped = initial_soc_pct.clamp(battery.soc_min_pct, battery.soc_max_pct);
    if (clamped - initial_soc_pct).abs() > f64::EPSILON {
        (
            clamped,
            Some(SolveDiagnostic::ClampedSoc {
                requested_pct: initial_soc_pct,
                clamped_pct: clamped,
            }),
        )
    } else {
        (clamped, None)
    }
}

/// The quantized SoC state space: `states` points spanning
/// `[soc_min_pct, soc_max_pct]` in steps of `soc_grid_pct`.
struct SocGrid<'a> {
    battery: &'a BatteryParameters,
    states: usize,
}

impl<'a> SocGrid<'a> {
    fn new(battery: &'a BatteryParameters) -> Self {
        let span = battery.soc_max_pct - battery.soc_min_pct;
        let states = (span / battery.soc_grid_pct).round() as usize + 1;
        SocGrid { battery, states }
    }

    fn pct_of(&self, index: usize) -> f64 {
        self.battery.soc_min_pct + index as f64 * self.battery.soc_grid_pct
    }

    fn nearest_state(&self, pct: f64) -> usize {
        let raw = (pct - self.battery.soc_min_pct) / self.battery.soc_grid_pct;
        (raw.round() as usize).min(self.states - 1)
    }

    fn feasible(&self, soc: f64, soc_prime: f64, duration_h: f64) -> bool {
        let delta = (soc_prime - soc) / 100.0 * self.battery.capacity_kwh;
        if delta >= 0.0 {
            delta <= self.battery.max_charge_kw * duration_h + 1e-9
        } else {
            delta.abs() <= self.battery.max_discharge_kw * duration_h + 1e-9
        }
    }
}
