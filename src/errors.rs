use std::fmt;
use std::fmt::Formatter;

use crate::config::ConfigError;
use crate::dispatcher::errors::DispatchError;
use crate::load_predictor::errors::LoadPredictorError;
use crate::logging::LoggingError;
use crate::providers::errors::ProviderError;
use crate::tariff_aligner::errors::TariffError;

/// Error depicting errors that occur while producing a schedule for one tick.
///
/// Only the fatal branches of spec.md §7 end up here -- `InsufficientHistory`,
/// `InfeasibleInitialSoC`, and a timed-out solve all recover in place and
/// surface through `SolveDiagnostic` instead.
#[derive(Debug)]
pub struct SchedulingError(pub String);

impl fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "SchedulingError: {}", self.0)
    }
}

impl std::error::Error for SchedulingError {}

impl From<&str> for SchedulingError {
    fn from(e: &str) -> Self {
        SchedulingError(e.to_string())
    }
}
impl From<TariffError> for SchedulingError {
    fn from(e: TariffError) -> Self {
        SchedulingError(e.to_string())
    }
}
impl From<LoadPredictorError> for SchedulingError {
    fn from(e: LoadPredictorError) -> Self {
        SchedulingError(e.to_string())
    }
}
impl From<DispatchError> for SchedulingError {
    fn from(e: DispatchError) -> Self {
        SchedulingError(e.to_string())
    }
}
impl From<ProviderError> for SchedulingError {
    fn from(e: ProviderError) -> Self {
        SchedulingError(e.to_string())
    }
}
impl From<ConfigError> for SchedulingError {
    fn from(e: ConfigError) -> Self {
        SchedulingError(e.to_string())
    }
}
impl From<LoggingError> for SchedulingError {
    fn from(e: LoggingError) -> Self {
        SchedulingError(e.to_string())
    }
}
