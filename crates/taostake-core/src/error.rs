//! Error types for the stake workflow.

use std::time::Duration;
use thiserror::Error;

/// Failures reported by a signing provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("No injected extensions available")]
    NoProviderAvailable,

    #[error("Address {0} is not managed by any provider")]
    UnknownAddress(String),

    #[error("Signing request rejected: {0}")]
    Rejected(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

/// Every condition the controller can report to the presentation layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeError {
    #[error("No signing provider available")]
    NoProviderAvailable,

    #[error("Unknown address: {0}")]
    UnknownAddress(String),

    #[error("Failed to connect to chain: {0}")]
    Connection(String),

    #[error("Chain query failed: {0}")]
    Query(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Another stake operation is already in progress")]
    ConcurrentOperation,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Transaction failed: {0}")]
    Dispatch(String),

    #[error("Transaction not finalized within {}s", .0.as_secs())]
    FinalizationTimeout(Duration),
}

impl From<WalletError> for StakeError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NoProviderAvailable => StakeError::NoProviderAvailable,
            WalletError::UnknownAddress(address) => StakeError::UnknownAddress(address),
            WalletError::Rejected(msg) | WalletError::Provider(msg) => StakeError::Signing(msg),
        }
    }
}
