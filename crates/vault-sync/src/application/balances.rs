//! # Balance Synchronizer
//!
//! Vault and wallet balances are fetched independently. Either may complete
//! first; each writes only its own field, and only if the binding it was
//! issued under is still live.

use super::notifications::NotificationChannel;
use super::state::SharedState;
use crate::domain::VaultSyncError;
use crate::ports::WalletProvider;
use primitive_types::U256;
use std::sync::Arc;
use tracing::debug;

/// Result of one balance fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Nothing bound; no request issued.
    Skipped,
    /// Snapshot field updated.
    Updated(U256),
    /// Binding changed while the request was in flight; response dropped.
    Discarded,
    /// Request failed; previous value kept, error notified.
    Failed(VaultSyncError),
}

/// Fetches balances for the bound account.
pub struct BalanceSynchronizer {
    state: SharedState,
    provider: Arc<dyn WalletProvider>,
    notifications: Arc<NotificationChannel>,
}

impl BalanceSynchronizer {
    /// Create a synchronizer over the shared state.
    pub fn new(
        state: SharedState,
        provider: Arc<dyn WalletProvider>,
        notifications: Arc<NotificationChannel>,
    ) -> Self {
        Self {
            state,
            provider,
            notifications,
        }
    }

    /// Query the vault contract for the current account's balance.
    pub async fn fetch_vault_balance(&self) -> FetchOutcome {
        let Some(binding) = self.state.read().binding() else {
            return FetchOutcome::Skipped;
        };

        match binding.contract.balance_of(binding.account).await {
            Ok(balance) => {
                if self.state.write().set_vault_balance(binding.epoch, balance) {
                    debug!("[vault-sync] Vault balance for {:?}: {}", binding.account, balance);
                    FetchOutcome::Updated(balance)
                } else {
                    debug!("[vault-sync] Dropping stale vault balance");
                    FetchOutcome::Discarded
                }
            }
            Err(e) => self.failed("vault", binding.epoch, e),
        }
    }

    /// Query the provider for the current account's native balance.
    pub async fn fetch_wallet_balance(&self) -> FetchOutcome {
        let Some(binding) = self.state.read().binding() else {
            return FetchOutcome::Skipped;
        };

        match self.provider.native_balance(binding.account).await {
            Ok(balance) => {
                if self.state.write().set_wallet_balance(binding.epoch, balance) {
                    debug!("[vault-sync] Wallet balance for {:?}: {}", binding.account, balance);
                    FetchOutcome::Updated(balance)
                } else {
                    debug!("[vault-sync] Dropping stale wallet balance");
                    FetchOutcome::Discarded
                }
            }
            Err(e) => self.failed("wallet", binding.epoch, e),
        }
    }

    /// Fetch both balances concurrently.
    pub async fn refresh_all(&self) -> (FetchOutcome, FetchOutcome) {
        tokio::join!(self.fetch_vault_balance(), self.fetch_wallet_balance())
    }

    fn failed(&self, which: &str, epoch: u64, error: VaultSyncError) -> FetchOutcome {
        if !self.state.read().is_current(epoch) {
            return FetchOutcome::Discarded;
        }
        self.notifications
            .error(format!("Failed to fetch {which} balance: {error}"));
        FetchOutcome::Failed(error)
    }
}
