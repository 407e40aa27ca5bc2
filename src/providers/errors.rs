use thiserror::Error;

/// Errors a provider adapter may surface. The adapters themselves are out
/// of scope; this is the contract any real implementation must satisfy.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider {0} returned no data for the requested window")]
    NoData(&'static str),
    #[error("provider {0} request failed: {1}")]
    RequestFailed(&'static str, String),
}
