//! # Network Validator
//!
//! Polls the provider for network id and accounts, decides validity against
//! the allow-list and owns the contract handle lifecycle.
//!
//! The provider offers no change notifications, so this runs on a fixed
//! interval and re-derives the account on every tick. Balance fetches
//! triggered by a transition run as their own task; a poll never waits on
//! them.

use super::balances::BalanceSynchronizer;
use super::state::SharedState;
use crate::config::SyncConfig;
use crate::domain::{ConnectionState, NetworkId, VaultSyncError};
use crate::ports::{ContractBinder, WalletProvider};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What one poll changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Nothing that affects the binding changed.
    Unchanged,
    /// A new contract handle was created.
    Bound(NetworkId),
    /// Same network, different selected account.
    AccountSwitched,
    /// The handle was torn down.
    Invalidated,
    /// Service already shut down; result ignored.
    Ignored,
}

impl ValidationOutcome {
    fn needs_balance_refresh(&self) -> bool {
        matches!(
            self,
            ValidationOutcome::Bound(_) | ValidationOutcome::AccountSwitched
        )
    }
}

/// Network / account validation state machine.
pub struct NetworkValidator {
    config: SyncConfig,
    state: SharedState,
    provider: Arc<dyn WalletProvider>,
    binder: Arc<dyn ContractBinder>,
    balances: Arc<BalanceSynchronizer>,
    connection_tx: watch::Sender<ConnectionState>,
    /// Signalled whenever a new contract handle is bound.
    bound: Arc<Notify>,
    /// Balance refresh started by the latest transition.
    refresh: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkValidator {
    /// Create a validator.
    pub fn new(
        config: SyncConfig,
        state: SharedState,
        provider: Arc<dyn WalletProvider>,
        binder: Arc<dyn ContractBinder>,
        balances: Arc<BalanceSynchronizer>,
    ) -> Self {
        let (connection_tx, _) = watch::channel(ConnectionState::default());
        Self {
            config,
            state,
            provider,
            binder,
            balances,
            connection_tx,
            bound: Arc::new(Notify::new()),
            refresh: Mutex::new(None),
        }
    }

    /// Woken once per new binding.
    pub fn bind_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.bound)
    }

    /// Receiver that sees every published connection state.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.connection_tx.subscribe()
    }

    /// One poll cycle.
    ///
    /// Both provider queries complete before any state is written, so a
    /// failure leaves the previous state intact. On a transition into a
    /// valid binding both balances are fetched once, in a spawned task;
    /// use [`settle`](Self::settle) to wait for it.
    pub async fn poll(&self) -> Result<ValidationOutcome, VaultSyncError> {
        if self.state.read().is_torn_down() {
            return Ok(ValidationOutcome::Ignored);
        }
        if !self.provider.is_connected() {
            return Err(VaultSyncError::ProviderUnavailable);
        }

        let network_id = self.provider.network_id().await?;
        let accounts = self.provider.accounts().await?;
        let account = accounts.first().copied();
        let allowed = NetworkId::from_chain_id(&network_id)
            .filter(|network| self.config.is_allowed(*network));

        let (outcome, published) = {
            let mut state = self.state.write();
            if state.is_torn_down() {
                return Ok(ValidationOutcome::Ignored);
            }
            state.mark_connected();

            let outcome = match (allowed, account) {
                (Some(network), Some(account)) => {
                    let bound_network = state.handle().map(|handle| handle.network);
                    if bound_network != Some(network) {
                        let contract = self.binder.bind(&network.binding());
                        state.bind(network, contract, network_id, account);
                        ValidationOutcome::Bound(network)
                    } else if state.connection().current_account != Some(account) {
                        state.switch_account(account);
                        ValidationOutcome::AccountSwitched
                    } else {
                        state.observe_network_id(network_id);
                        ValidationOutcome::Unchanged
                    }
                }
                _ => {
                    if state.invalidate(network_id, account) {
                        ValidationOutcome::Invalidated
                    } else {
                        ValidationOutcome::Unchanged
                    }
                }
            };
            (outcome, state.connection().clone())
        };

        match outcome {
            ValidationOutcome::Bound(network) => {
                info!(
                    "[vault-sync] Bound vault on network {} for {:?}",
                    network, published.current_account
                );
            }
            ValidationOutcome::AccountSwitched => {
                info!(
                    "[vault-sync] Account switched to {:?}",
                    published.current_account
                );
            }
            ValidationOutcome::Invalidated => {
                warn!(
                    "[vault-sync] Network {:?} is not usable, contract released",
                    published.network_id
                );
            }
            _ => {}
        }

        self.publish(published);

        if let ValidationOutcome::Bound(_) = outcome {
            self.bound.notify_one();
        }
        if outcome.needs_balance_refresh() {
            let balances = Arc::clone(&self.balances);
            let task = tokio::spawn(async move {
                balances.refresh_all().await;
            });
            // A newer transition supersedes the pending fetch.
            let previous = self.refresh.lock().replace(task);
            if let Some(previous) = previous {
                previous.abort();
            }
        }

        Ok(outcome)
    }

    /// Wait for the balance refresh of the latest transition, if any.
    pub async fn settle(&self) {
        let pending = self.refresh.lock().take();
        if let Some(task) = pending {
            let _ = task.await;
        }
    }

    /// Cancel any pending refresh and publish the current (torn-down) state.
    pub fn shutdown(&self) {
        let pending = self.refresh.lock().take();
        if let Some(task) = pending {
            task.abort();
        }
        let published = self.state.read().connection().clone();
        self.publish(published);
    }

    fn publish(&self, published: ConnectionState) {
        self.connection_tx.send_if_modified(|current| {
            if *current != published {
                *current = published;
                true
            } else {
                false
            }
        });
    }

    /// Poll once, logging instead of propagating failures.
    ///
    /// A failed cycle is skipped; the next tick retries.
    pub async fn tick(&self) {
        match self.poll().await {
            Ok(outcome) => debug!("[vault-sync] Validation tick: {:?}", outcome),
            Err(e) => warn!("[vault-sync] Validation poll failed, retrying next tick: {}", e),
        }
    }
}
