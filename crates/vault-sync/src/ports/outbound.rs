//! # Outbound Ports
//!
//! The wallet provider and the contract it exposes. Neither pushes
//! notifications; every piece of state has to be polled.

use crate::domain::{
    Address, BlockRange, ContractBinding, EventKind, LedgerEvent, Receipt, TxOptions,
    VaultSyncError,
};
use async_trait::async_trait;
use primitive_types::U256;
use std::sync::Arc;

/// Wallet-injected provider - outbound port.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether the provider currently reports a live connection.
    fn is_connected(&self) -> bool;

    /// Network id string of the chain the wallet is on.
    async fn network_id(&self) -> Result<String, VaultSyncError>;

    /// Accounts exposed by the wallet, selected account first.
    async fn accounts(&self) -> Result<Vec<Address>, VaultSyncError>;

    /// Native balance of an account, in wei.
    async fn native_balance(&self, account: Address) -> Result<U256, VaultSyncError>;
}

/// Deployed vault contract reached through the provider - outbound port.
#[async_trait]
pub trait VaultContract: Send + Sync {
    /// Vault balance held for an account, in wei.
    async fn balance_of(&self, account: Address) -> Result<U256, VaultSyncError>;

    /// Deposit `options.value` from `options.sender`.
    async fn deposit(&self, options: TxOptions) -> Result<Receipt, VaultSyncError>;

    /// Withdraw `amount` to `options.sender`.
    async fn withdraw(&self, amount: U256, options: TxOptions) -> Result<Receipt, VaultSyncError>;

    /// Logs of one event kind within `range`, in no particular order.
    async fn query_events(
        &self,
        kind: EventKind,
        range: BlockRange,
    ) -> Result<Vec<LedgerEvent>, VaultSyncError>;
}

/// Turns a static ABI/address pair into a callable contract - outbound port.
pub trait ContractBinder: Send + Sync {
    /// Bind the deployment through the provider.
    fn bind(&self, binding: &ContractBinding) -> Arc<dyn VaultContract>;
}
