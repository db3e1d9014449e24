//! Send flow errors.

use crate::engine::EngineError;
use purse_sdk::amount::AmountError;
use std::fmt;
use thiserror::Error;

/// Engine step of the send flow, used to label timeouts and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpendStep {
    ProtocolInfo,
    MaxSpendable,
    Build,
    Sign,
    Broadcast,
    Save,
}

impl fmt::Display for SpendStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpendStep::ProtocolInfo => "protocol_info",
            SpendStep::MaxSpendable => "max_spendable",
            SpendStep::Build => "build",
            SpendStep::Sign => "sign",
            SpendStep::Broadcast => "broadcast",
            SpendStep::Save => "save",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while building or sending a transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpendError {
    /// Engine refused to build the spend
    #[error("failed to build transaction: {0}")]
    Build(EngineError),

    /// Engine failed to compute the maximum spendable amount
    #[error("failed to compute max spendable: {0}")]
    MaxSpendable(EngineError),

    #[error("failed to sign transaction: {0}")]
    Sign(EngineError),

    #[error("failed to broadcast transaction: {0}")]
    Broadcast(EngineError),

    #[error("failed to save transaction: {0}")]
    Save(EngineError),

    /// Engine step did not resolve within the configured timeout
    #[error("{0} step timed out")]
    Timeout(SpendStep),

    /// Payment request could not be resolved from the merchant
    #[error("payment request unavailable: {0}")]
    StaleProtocolInfo(String),

    /// Intent carries no payment-protocol URI
    #[error("payment request URI missing")]
    MissingProtocolUri,

    /// Send task ended without producing an outcome
    #[error("send attempt was interrupted")]
    Interrupted,

    /// Amount input could not be converted
    #[error("invalid amount: {0}")]
    Amount(#[from] AmountError),

    /// Marker attached to the transaction reported after a failed
    /// sign/broadcast/save attempt. Wraps the step's real error.
    #[error("broadcastError")]
    BroadcastError(Box<SpendError>),
}

impl SpendError {
    pub(crate) fn from_engine(step: SpendStep, error: EngineError) -> Self {
        match step {
            SpendStep::ProtocolInfo => SpendError::StaleProtocolInfo(error.to_string()),
            SpendStep::MaxSpendable => SpendError::MaxSpendable(error),
            SpendStep::Build => SpendError::Build(error),
            SpendStep::Sign => SpendError::Sign(error),
            SpendStep::Broadcast => SpendError::Broadcast(error),
            SpendStep::Save => SpendError::Save(error),
        }
    }

    /// Text shown to the user: the engine's own message where there is one.
    pub fn user_message(&self) -> String {
        match self {
            SpendError::Build(e)
            | SpendError::MaxSpendable(e)
            | SpendError::Sign(e)
            | SpendError::Broadcast(e)
            | SpendError::Save(e) => e.to_string(),
            SpendError::BroadcastError(inner) => inner.user_message(),
            other => other.to_string(),
        }
    }

    /// The real error behind a [`BroadcastError`](Self::BroadcastError) marker.
    pub fn source_error(&self) -> &SpendError {
        match self {
            SpendError::BroadcastError(inner) => inner.source_error(),
            other => other,
        }
    }

    pub fn is_broadcast_marker(&self) -> bool {
        matches!(self, SpendError::BroadcastError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_engine_text() {
        let error = SpendError::Broadcast(EngineError::Rejected("peer refused".to_string()));
        assert_eq!(error.user_message(), "peer refused");
        assert_eq!(
            error.to_string(),
            "failed to broadcast transaction: peer refused"
        );
    }

    #[test]
    fn test_marker_unwraps_to_real_error() {
        let real = SpendError::Timeout(SpendStep::Save);
        let marker = SpendError::BroadcastError(Box::new(real.clone()));

        assert!(marker.is_broadcast_marker());
        assert_eq!(marker.to_string(), "broadcastError");
        assert_eq!(marker.source_error(), &real);
        assert_eq!(marker.user_message(), "save step timed out");
    }
}
