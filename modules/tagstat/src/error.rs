use kommo_client::KommoError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TagStatsError>;

#[derive(Error, Debug)]
pub enum TagStatsError {
    /// Network, timeout, or non-2xx answer from the CRM. Aborts the whole
    /// computation; no partial statistics are produced.
    #[error("Upstream unavailable while {operation}: {source}")]
    UpstreamUnavailable {
        operation: &'static str,
        #[source]
        source: KommoError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TagStatsError {
    pub(crate) fn upstream(operation: &'static str) -> impl FnOnce(KommoError) -> Self {
        move |source| TagStatsError::UpstreamUnavailable { operation, source }
    }
}
