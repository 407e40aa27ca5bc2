use thiserror::Error;

/// Errors raised while deriving a load forecast from history samples.
///
/// `InsufficientHistory` from spec.md §4.3/§7 is deliberately **not** a
/// variant here: that case recovers to a flat-mean forecast and is
/// reported as a [`crate::diagnostics::SolveDiagnostic::DegradedForecast`]
/// alongside a successful result, never as an `Err`.
#[derive(Error, Debug)]
pub enum LoadPredictorError {
    /// Every sample was rejected (non-numeric state, or the slice was
    /// empty) -- there is nothing to even compute a flat mean from.
    #[error("no usable load history samples")]
    NoUsableSamples,
}
