use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The host environment lacks structural-change notification support;
    /// the session runs disabled and produces a degraded result.
    #[error("host environment unsupported: {0}")]
    Unsupported(String),
    /// Scoped-node session saw neither FCP nor FMP within its duration.
    #[error("no content observed within the measurement duration")]
    NoContentObserved,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProbeError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
