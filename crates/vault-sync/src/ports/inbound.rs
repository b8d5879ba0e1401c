//! # Inbound Ports
//!
//! What the UI surface can ask of the sync engine.

use crate::domain::{
    BalanceSnapshot, ConnectionState, LedgerEvent, Notification, NotificationKind, Receipt,
    VaultSyncError,
};
use async_trait::async_trait;

/// Vault client API - inbound port.
#[async_trait]
pub trait VaultClientApi: Send + Sync {
    /// Deposit the ETH amount typed into the deposit field.
    async fn deposit(&self, amount: &str) -> Result<Receipt, VaultSyncError>;

    /// Withdraw the ETH amount typed into the withdraw field.
    async fn withdraw(&self, amount: &str) -> Result<Receipt, VaultSyncError>;

    /// Re-fetch the vault balance.
    async fn refresh_vault_balance(&self);

    /// Re-fetch the wallet balance.
    async fn refresh_wallet_balance(&self);

    /// Run one reconciliation tick now.
    async fn refresh_ledger(&self);

    /// Current connection state.
    fn connection(&self) -> ConnectionState;

    /// Current balances.
    fn balances(&self) -> BalanceSnapshot;

    /// Newest ledger events, truncated to the display limit.
    fn recent_events(&self) -> Vec<LedgerEvent>;

    /// Visible notification of one kind, if any.
    fn notification(&self, kind: NotificationKind) -> Option<Notification>;
}
