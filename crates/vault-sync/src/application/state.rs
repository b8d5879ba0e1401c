//! # Sync State
//!
//! The single owned state every component reads. Shared behind a
//! `parking_lot::RwLock`; the lock is never held across an await.
//!
//! Every request issued to the provider captures the epoch it was issued
//! under. A response is applied only if the epoch is still current, so
//! completions that arrive after an account switch, a network switch or a
//! teardown are dropped.

use crate::domain::{
    invariant_connection_consistent, Address, BalanceSnapshot, ConnectionState, NetworkId,
};
use crate::ports::VaultContract;
use parking_lot::RwLock;
use primitive_types::U256;
use std::sync::Arc;

/// Shared handle to the sync state.
pub type SharedState = Arc<RwLock<SyncState>>;

/// Live contract binding. At most one exists at a time.
#[derive(Clone)]
pub struct ContractHandle {
    /// Network the contract was bound for.
    pub network: NetworkId,
    /// Callable contract.
    pub contract: Arc<dyn VaultContract>,
    /// Epoch at which this handle was created; identifies it.
    pub id: u64,
}

/// Everything a balance fetch or a submission needs, captured at issue time.
#[derive(Clone)]
pub struct Binding {
    /// Callable contract.
    pub contract: Arc<dyn VaultContract>,
    /// Account requests are made for.
    pub account: Address,
    /// Epoch the binding was captured under.
    pub epoch: u64,
}

/// Connection state, contract handle and balances.
#[derive(Default)]
pub struct SyncState {
    connection: ConnectionState,
    handle: Option<ContractHandle>,
    balances: BalanceSnapshot,
    epoch: u64,
    torn_down: bool,
}

impl SyncState {
    /// Fresh state wrapped for sharing.
    pub fn shared() -> SharedState {
        Arc::new(RwLock::new(Self::default()))
    }

    /// Current connection state.
    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    /// Current balances.
    pub fn balances(&self) -> BalanceSnapshot {
        self.balances
    }

    /// The live handle, if any.
    pub fn handle(&self) -> Option<&ContractHandle> {
        self.handle.as_ref()
    }

    /// Capture the contract + account pair, if both are bound.
    pub fn binding(&self) -> Option<Binding> {
        if self.torn_down {
            return None;
        }
        let handle = self.handle.as_ref()?;
        let account = self.connection.current_account?;
        Some(Binding {
            contract: Arc::clone(&handle.contract),
            account,
            epoch: self.epoch,
        })
    }

    /// Whether a binding captured at `epoch` is still the live one.
    pub fn is_current(&self, epoch: u64) -> bool {
        !self.torn_down && self.handle.is_some() && self.epoch == epoch
    }

    /// Whether the live handle is the one with `handle_id`.
    pub fn is_handle_current(&self, handle_id: u64) -> bool {
        !self.torn_down && self.handle.as_ref().map(|h| h.id) == Some(handle_id)
    }

    /// Whether the owning service has been shut down.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub(crate) fn mark_connected(&mut self) {
        self.connection.is_connected = true;
    }

    /// Install a new handle for `network` and mark the network correct.
    pub(crate) fn bind(
        &mut self,
        network: NetworkId,
        contract: Arc<dyn VaultContract>,
        network_id: String,
        account: Address,
    ) {
        self.epoch += 1;
        self.handle = Some(ContractHandle {
            network,
            contract,
            id: self.epoch,
        });
        self.connection.correct_network = true;
        self.connection.network_id = Some(network_id);
        self.connection.current_account = Some(account);
        self.balances = BalanceSnapshot::cleared();
        debug_assert!(invariant_connection_consistent(&self.connection, true));
    }

    /// Same handle, different account. Balances belong to the old account.
    pub(crate) fn switch_account(&mut self, account: Address) {
        self.epoch += 1;
        self.connection.current_account = Some(account);
        self.balances = BalanceSnapshot::cleared();
    }

    /// Refresh the observed network id without touching the binding.
    pub(crate) fn observe_network_id(&mut self, network_id: String) {
        self.connection.network_id = Some(network_id);
    }

    /// Drop the handle and clear balances. Returns true if a handle existed.
    pub(crate) fn invalidate(&mut self, network_id: String, account: Option<Address>) -> bool {
        let had_handle = self.handle.take().is_some();
        if had_handle {
            self.epoch += 1;
        }
        self.connection.correct_network = false;
        self.connection.network_id = Some(network_id);
        self.connection.current_account = account;
        self.balances = BalanceSnapshot::cleared();
        debug_assert!(invariant_connection_consistent(&self.connection, false));
        had_handle
    }

    pub(crate) fn set_vault_balance(&mut self, epoch: u64, balance: U256) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        self.balances.vault_balance = Some(balance);
        true
    }

    pub(crate) fn set_wallet_balance(&mut self, epoch: u64, balance: U256) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        self.balances.wallet_balance = Some(balance);
        true
    }

    /// Final teardown. Nothing is applied afterwards.
    pub(crate) fn tear_down(&mut self) {
        self.torn_down = true;
        self.handle = None;
        self.epoch += 1;
        self.connection.correct_network = false;
        self.balances = BalanceSnapshot::cleared();
    }
}
