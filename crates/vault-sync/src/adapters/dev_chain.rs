//! In-memory development chain.
//!
//! Implements the provider, the vault contract and the binder over one
//! shared ledger. Every state-changing call mines a block and emits a log.
//! Individual calls can be made to fail or to respond late, and every call
//! is counted.

use crate::domain::{
    Address, BlockRange, ContractBinding, EventKind, LedgerEvent, NetworkId, Receipt, TxOptions,
    VaultSyncError,
};
use crate::ports::{ContractBinder, VaultContract, WalletProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::{H256, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Calls that can be counted, failed or delayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DevCall {
    /// `WalletProvider::network_id`
    NetworkId,
    /// `WalletProvider::accounts`
    Accounts,
    /// `WalletProvider::native_balance`
    NativeBalance,
    /// `VaultContract::balance_of`
    BalanceOf,
    /// `VaultContract::deposit`
    Deposit,
    /// `VaultContract::withdraw`
    Withdraw,
    /// `VaultContract::query_events` for one kind
    QueryEvents(EventKind),
}

#[derive(Default)]
struct ChainState {
    connected: bool,
    network_id: String,
    accounts: Vec<Address>,
    native: HashMap<Address, U256>,
    vault: HashMap<Address, U256>,
    logs: Vec<LedgerEvent>,
    block: u64,
    failing: HashSet<DevCall>,
    latency: HashMap<DevCall, Duration>,
    calls: HashMap<DevCall, usize>,
    last_range: HashMap<EventKind, BlockRange>,
    binds: usize,
}

/// Shared in-memory chain. Clones observe the same state.
#[derive(Clone)]
pub struct DevChain {
    inner: Arc<Mutex<ChainState>>,
}

impl DevChain {
    /// Connected chain reporting `network_id`, no accounts.
    pub fn new(network_id: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChainState {
                connected: true,
                network_id: network_id.to_string(),
                ..ChainState::default()
            })),
        }
    }

    /// Local development chain (id 5777).
    pub fn development() -> Self {
        Self::new(NetworkId::Development.chain_id())
    }

    /// Add an unlocked account with a native balance.
    pub fn with_account(self, account: Address, balance: U256) -> Self {
        {
            let mut chain = self.inner.lock();
            chain.accounts.push(account);
            chain.native.insert(account, balance);
        }
        self
    }

    /// Switch the wallet to another network.
    pub fn set_network(&self, network_id: &str) {
        self.inner.lock().network_id = network_id.to_string();
    }

    /// Replace the exposed accounts, selected first.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.inner.lock().accounts = accounts;
    }

    /// Toggle the provider's connected flag.
    pub fn set_connected(&self, connected: bool) {
        self.inner.lock().connected = connected;
    }

    /// Make a call fail until toggled back.
    pub fn fail(&self, call: DevCall, failing: bool) {
        let mut chain = self.inner.lock();
        if failing {
            chain.failing.insert(call);
        } else {
            chain.failing.remove(&call);
        }
    }

    /// Delay every response of `call`.
    pub fn set_latency(&self, call: DevCall, latency: Duration) {
        self.inner.lock().latency.insert(call, latency);
    }

    /// How many times `call` was issued.
    pub fn calls(&self, call: DevCall) -> usize {
        self.inner.lock().calls.get(&call).copied().unwrap_or(0)
    }

    /// How many contract handles were bound.
    pub fn bind_count(&self) -> usize {
        self.inner.lock().binds
    }

    /// Window of the most recent log query for `kind`.
    pub fn last_range(&self, kind: EventKind) -> Option<BlockRange> {
        self.inner.lock().last_range.get(&kind).copied()
    }

    /// Current block height.
    pub fn block_number(&self) -> u64 {
        self.inner.lock().block
    }

    /// Append a log directly, without touching balances.
    pub fn emit(&self, event: LedgerEvent) {
        let mut chain = self.inner.lock();
        chain.block = chain.block.max(event.block_number);
        chain.logs.push(event);
    }

    /// Count the call and apply its failure switch and latency.
    async fn enter(&self, call: DevCall) -> Result<(), VaultSyncError> {
        let (failing, latency) = {
            let mut chain = self.inner.lock();
            *chain.calls.entry(call).or_default() += 1;
            (
                chain.failing.contains(&call),
                chain.latency.get(&call).copied(),
            )
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if failing {
            let message = format!("{:?} unavailable", call);
            return Err(match call {
                DevCall::NetworkId | DevCall::Accounts | DevCall::NativeBalance => {
                    VaultSyncError::Provider(message)
                }
                _ => VaultSyncError::Contract(message),
            });
        }
        Ok(())
    }
}

impl ChainState {
    fn mine(&mut self, kind: EventKind, account: Address, amount: U256) -> Receipt {
        self.block += 1;
        self.logs
            .push(LedgerEvent::new(self.block, kind, account, amount));
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&self.block.to_be_bytes());
        Receipt {
            tx_hash: H256(hash),
            block_number: Some(self.block),
        }
    }
}

#[async_trait]
impl WalletProvider for DevChain {
    fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    async fn network_id(&self) -> Result<String, VaultSyncError> {
        self.enter(DevCall::NetworkId).await?;
        Ok(self.inner.lock().network_id.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, VaultSyncError> {
        self.enter(DevCall::Accounts).await?;
        Ok(self.inner.lock().accounts.clone())
    }

    async fn native_balance(&self, account: Address) -> Result<U256, VaultSyncError> {
        self.enter(DevCall::NativeBalance).await?;
        Ok(self
            .inner
            .lock()
            .native
            .get(&account)
            .copied()
            .unwrap_or_default())
    }
}

impl ContractBinder for DevChain {
    fn bind(&self, binding: &ContractBinding) -> Arc<dyn VaultContract> {
        self.inner.lock().binds += 1;
        debug!(
            "[vault-sync] Binding {:?} vault at {:?}",
            binding.abi, binding.address
        );
        Arc::new(DevVault {
            chain: self.clone(),
            binding: *binding,
        })
    }
}

/// Vault contract deployed on a [`DevChain`].
pub struct DevVault {
    chain: DevChain,
    binding: ContractBinding,
}

impl DevVault {
    /// Deployment this handle was bound to.
    pub fn binding(&self) -> &ContractBinding {
        &self.binding
    }
}

#[async_trait]
impl VaultContract for DevVault {
    async fn balance_of(&self, account: Address) -> Result<U256, VaultSyncError> {
        self.chain.enter(DevCall::BalanceOf).await?;
        Ok(self
            .chain
            .inner
            .lock()
            .vault
            .get(&account)
            .copied()
            .unwrap_or_default())
    }

    async fn deposit(&self, options: TxOptions) -> Result<Receipt, VaultSyncError> {
        self.chain.enter(DevCall::Deposit).await?;
        let value = options.value.unwrap_or_default();
        let mut chain = self.chain.inner.lock();

        let native = chain.native.get(&options.sender).copied().unwrap_or_default();
        if native < value {
            return Err(VaultSyncError::Contract(
                "insufficient funds for value transfer".to_string(),
            ));
        }
        chain.native.insert(options.sender, native - value);
        *chain.vault.entry(options.sender).or_default() += value;
        Ok(chain.mine(EventKind::Deposit, options.sender, value))
    }

    async fn withdraw(&self, amount: U256, options: TxOptions) -> Result<Receipt, VaultSyncError> {
        self.chain.enter(DevCall::Withdraw).await?;
        let mut chain = self.chain.inner.lock();

        let held = chain.vault.get(&options.sender).copied().unwrap_or_default();
        if held < amount {
            return Err(VaultSyncError::Contract("execution reverted".to_string()));
        }
        chain.vault.insert(options.sender, held - amount);
        *chain.native.entry(options.sender).or_default() += amount;
        Ok(chain.mine(EventKind::Withdraw, options.sender, amount))
    }

    async fn query_events(
        &self,
        kind: EventKind,
        range: BlockRange,
    ) -> Result<Vec<LedgerEvent>, VaultSyncError> {
        self.chain.inner.lock().last_range.insert(kind, range);
        self.chain.enter(DevCall::QueryEvents(kind)).await?;
        Ok(self
            .chain
            .inner
            .lock()
            .logs
            .iter()
            .filter(|log| log.kind == kind && range.contains(log.block_number))
            .cloned()
            .collect())
    }
}
