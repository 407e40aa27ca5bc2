pub mod errors;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::common::models::{BatteryParameters, Block};
use crate::dispatcher::errors::DispatchError;
use crate::dp_optimizer::{self, SolveOutcome};

/// Hard ceiling on a single solve, per spec.md §5.
const SOLVE_TIMEOUT: Duration = Duration::from_secs(30);

struct Inflight {
    cancel: Arc<AtomicBool>,
    abort_handle: tokio::task::AbortHandle,
}

/// Offloads the (synchronous, CPU-bound) DP solve to a blocking worker so
/// the supervisory loop never stalls, and enforces single-flight: a new
/// submission cancels and discards whatever solve is still running.
///
/// One dispatcher instance is meant to live for the process's lifetime and
/// be driven by a single supervisory task; the inflight slot is behind a
/// `Mutex` only so `submit` can take `&self` like the rest of the stack.
pub struct Dispatcher {
    inflight: Mutex<Option<Inflight>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            inflight: Mutex::new(None),
        }
    }

    /// Cancels any solve still running from a previous tick, then submits
    /// a new one and awaits it under the 30s budget.
    pub async fn submit(
        &self,
        initial_soc_pct: f64,
        blocks: Vec<Block>,
        battery: BatteryParameters,
    ) -> Result<SolveOutcome, DispatchError> {
        self.cancel_inflight().await;

        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_for_worker = cancel.clone();

        let handle = tokio::task::spawn_blocking(move || {
            dp_optimizer::solve(initial_soc_pct, &blocks, &battery, &cancel_for_worker)
        });
        let abort_handle = handle.abort_handle();

        {
            let mut guard = self.inflight.lock().await;
            *guard = Some(Inflight {
                cancel: cancel.clone(),
                abort_handle,
            });
        }

        let result = tokio::time::timeout(SOLVE_TIMEOUT, handle).await;

        // Whatever we submitted has either finished or timed out: clear the
        // inflight slot so the next submit doesn't try to cancel stale state.
        {
            let mut guard = self.inflight.lock().await;
            *guard = None;
        }

        match result {
            Ok(Ok(Some(outcome))) => Ok(outcome),
            Ok(Ok(None)) => Err(DispatchError::Superseded),
            Ok(Err(join_err)) => Err(DispatchError::WorkerLost(join_err.to_string())),
            Err(_elapsed) => {
                cancel.store(true, Ordering::Relaxed);
                Err(DispatchError::Timeout)
            }
        }
    }

    async fn cancel_inflight(&self) {
        let previous = {
            let mut guard = self.inflight.lock().await;
            guard.take()
        };
        if let Some(inflight) = previous {
            inflight.cancel.store(true, Ordering::Relaxed);
            inflight.abort_handle.abort();
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
