pub mod errors;
pub mod fixture;

use chrono::{DateTime, Utc};

use crate::common::models::LoadHistorySample;
use crate::providers::errors::ProviderError;
use crate::tariff_aligner::TariffInterval;

/// Adapter contract for a tariff data source (spec.md §6). Import and
/// export are fetched independently since they can diverge arbitrarily
/// (a negative export rate with a positive import rate is the ordinary
/// case, not an edge case).
pub trait TariffProvider {
    fn import_intervals(&self, day_start: DateTime<Utc>) -> Result<Vec<TariffInterval>, ProviderError>;
    fn export_intervals(&self, day_start: DateTime<Utc>) -> Result<Vec<TariffInterval>, ProviderError>;
}

/// Adapter contract for a solar production forecast source.
pub trait PvProvider {
    fn estimates(&self, day_start: DateTime<Utc>) -> Result<Vec<crate::pv_aligner::PvEstimate>, ProviderError>;
}

/// Adapter contract for an hourly-or-denser outdoor temperature forecast.
pub trait WeatherProvider {
    fn temperatures(&self, day_start: DateTime<Utc>) -> Result<Vec<(DateTime<Utc>, f64)>, ProviderError>;
}

/// Adapter contract for the five-day cumulative energy meter history.
pub trait HistoryProvider {
    fn samples(&self, entity_id: &str, since: DateTime<Utc>) -> Result<Vec<LoadHistorySample>, ProviderError>;
}

/// One of the four hardware trigger points (spec.md §6). Implementations
/// own the actual I/O (a relay, an inverter RPC, a shell hook); this crate
/// only decides *when* to call them.
pub trait HookExecutor {
    fn charge_start(&self, limit_kw: f64);
    fn charge_stop(&self);
    fn discharge_start(&self, limit_kw: f64);
    fn discharge_stop(&self);
}

/// Wraps a `HookExecutor` so that only a logical-state *transition*
/// forwards a call -- an unconfigured hook runs observation-only, and a
/// state that simply repeats tick-to-tick must not re-trigger hardware.
pub struct DedupingHookExecutor<H: HookExecutor> {
    inner: H,
    last_state: std::sync::Mutex<Option<crate::action_mapper::LogicalState>>,
}

impl<H: HookExecutor> DedupingHookExecutor<H> {
    pub fn new(inner: H) -> Self {
        DedupingHookExecutor {
            inner,
            last_state: std::sync::Mutex::new(None),
        }
    }

    /// Forwards to the wrapped executor only if `action.state` differs
    /// from the previously observed state.
    pub fn apply(&self, action: &crate::action_mapper::Action) {
        use crate::action_mapper::LogicalState;

        let mut last = self.last_state.lock().expect("hook executor mutex poisoned");
        if *last == Some(action.state) {
            return;
        }

        match action.state {
            LogicalState::ChargeGrid | LogicalState::ChargeSolar => self.inner.charge_start(action.limit_kw),
            LogicalState::DischargeHome => self.inner.discharge_start(action.limit_kw),
            LogicalState::Preserve | LogicalState::Idle => {
                self.inner.charge_stop();
                self.inner.discharge_stop();
            }
        }

        *last = Some(action.state);
    }
}
