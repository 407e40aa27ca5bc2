use thiserror::Error;

/// Errors raised while dispatching a solve to the worker.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The solve exceeded its 30s budget and was cancelled.
    #[error("solve exceeded its time budget and was cancelled")]
    Timeout,
    /// The worker task itself panicked or was dropped before completing.
    #[error("solve worker failed to return a result: {0}")]
    WorkerLost(String),
    /// A newer tick superseded this solve before it finished (single-flight).
    #[error("solve was superseded by a newer tick")]
    Superseded,
}
