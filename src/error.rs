//! Error taxonomy for the alerting pipeline.

use thiserror::Error;

use crate::models::HazardKind;

/// Errors raised while evaluating a hazard cycle.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Feed unreachable or malformed; the cycle for that kind aborts.
    #[error("{kind} feed fetch failed: {message}")]
    UpstreamFetch { kind: HazardKind, message: String },

    /// Advisory collaborator failed. Never fatal.
    #[error("advisory failed: {0}")]
    Advisory(String),

    /// Notification send failed; the alert is not recorded.
    #[error("notification send failed: {0}")]
    Transport(String),

    /// Alert-history lookup failed.
    #[error("alert history read failed: {0}")]
    HistoryRead(String),

    /// Alert-history append failed.
    #[error("alert history write failed: {0}")]
    HistoryWrite(String),

    /// Input that cannot be rendered or evaluated.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl AlertError {
    pub fn upstream(kind: HazardKind, err: impl std::fmt::Display) -> Self {
        AlertError::UpstreamFetch {
            kind,
            message: err.to_string(),
        }
    }

    /// Errors that abort the whole cycle rather than a single event.
    pub fn is_cycle_fatal(&self) -> bool {
        matches!(
            self,
            AlertError::UpstreamFetch { .. } | AlertError::HistoryRead(_)
        )
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, AlertError>;
