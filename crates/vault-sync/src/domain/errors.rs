//! # Domain Errors
//!
//! Error types for vault synchronization.
//!
//! Only `ProviderUnavailable` and `ShutDown` are terminal for a session.
//! Everything else is converted into a transient notification at the call site.

use thiserror::Error;

/// Vault sync error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultSyncError {
    /// No wallet provider detected, or it reports itself disconnected.
    #[error("Wallet provider unavailable")]
    ProviderUnavailable,

    /// The provider is on a chain that is not in the allow-list.
    #[error("Unsupported network: {0}")]
    NetworkInvalid(String),

    /// A provider query (network id, accounts, native balance) failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// A contract call or log query failed.
    #[error("Contract error: {0}")]
    Contract(String),

    /// Malformed or non-positive user input.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// No contract handle or account is currently bound.
    #[error("No contract bound for the current account")]
    NotBound,

    /// The service was shut down and cannot be restarted.
    #[error("Vault sync service has been shut down")]
    ShutDown,
}

impl VaultSyncError {
    /// Whether this error ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VaultSyncError::ProviderUnavailable | VaultSyncError::ShutDown
        )
    }
}
