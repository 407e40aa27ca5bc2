use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while aligning tariff intervals onto the 5-minute lattice.
#[derive(Error, Debug)]
pub enum TariffError {
    /// No provider interval covers the slot's midpoint. Non-recoverable for
    /// the tick -- the supervisor should hold the previous action.
    #[error("TariffGapError: no rate covers slot {slot_index} (midpoint {midpoint})")]
    Gap {
        slot_index: usize,
        midpoint: DateTime<Utc>,
    },
}
