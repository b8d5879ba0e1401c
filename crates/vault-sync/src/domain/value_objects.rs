//! # Domain Value Objects
//!
//! Immutable value types shared by every component.

use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;

/// Account / contract address (20 bytes).
pub type Address = H160;

/// Development vault deployment (local chain 5777).
pub const DEV_VAULT_ADDRESS: Address = H160([
    0x34, 0x5c, 0xa3, 0xe0, 0x14, 0xaa, 0xf5, 0xdc, 0xa4, 0x88, 0x05, 0x7e, 0x9b, 0x2d, 0xfe,
    0x07, 0x7a, 0x81, 0x7e, 0x2a,
]);

/// Kovan vault deployment (chain 42).
pub const KOVAN_VAULT_ADDRESS: Address = H160([
    0x8f, 0x0b, 0x83, 0x1e, 0x36, 0x5c, 0x7d, 0x49, 0x5b, 0x1a, 0x2d, 0x9f, 0xe4, 0x63, 0xc0,
    0x11, 0x7d, 0x52, 0x08, 0xb4,
]);

/// Supported chains. Anything else is an invalid network.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NetworkId {
    /// Local development chain (Ganache default id).
    Development,
    /// Kovan test network.
    Kovan,
}

impl NetworkId {
    /// Parse the id string reported by the provider.
    pub fn from_chain_id(raw: &str) -> Option<Self> {
        match raw.trim() {
            "5777" => Some(NetworkId::Development),
            "42" => Some(NetworkId::Kovan),
            _ => None,
        }
    }

    /// The id string as the provider reports it.
    pub fn chain_id(&self) -> &'static str {
        match self {
            NetworkId::Development => "5777",
            NetworkId::Kovan => "42",
        }
    }

    /// Static deployment table.
    pub fn binding(&self) -> ContractBinding {
        match self {
            NetworkId::Development => ContractBinding {
                network: *self,
                abi: VaultAbi::Development,
                address: DEV_VAULT_ADDRESS,
            },
            NetworkId::Kovan => ContractBinding {
                network: *self,
                abi: VaultAbi::Release,
                address: KOVAN_VAULT_ADDRESS,
            },
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.chain_id())
    }
}

/// ABI variant compiled for a deployment.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum VaultAbi {
    /// Build deployed to the local development chain.
    Development,
    /// Build deployed to public networks.
    Release,
}

/// ABI + address pair for one network.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractBinding {
    /// Network this deployment lives on.
    pub network: NetworkId,
    /// ABI variant.
    pub abi: VaultAbi,
    /// Contract address.
    pub address: Address,
}

/// Kind of vault ledger event.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Funds moved into the vault.
    Deposit,
    /// Funds moved out of the vault.
    Withdraw,
}

impl EventKind {
    /// Contract event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Deposit => "Deposit",
            EventKind::Withdraw => "Withdraw",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log query window: inclusive lower bound, `None` upper bound means latest.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockRange {
    /// First block to include.
    pub from_block: u64,
    /// Last block to include, or latest.
    pub to_block: Option<u64>,
}

impl BlockRange {
    /// `[from_block, latest]`.
    pub fn from_block_to_latest(from_block: u64) -> Self {
        Self {
            from_block,
            to_block: None,
        }
    }

    /// Whether `block` falls inside the window.
    pub fn contains(&self, block: u64) -> bool {
        block >= self.from_block && self.to_block.map_or(true, |to| block <= to)
    }
}

/// Transaction options passed alongside a contract call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxOptions {
    /// Sending account.
    pub sender: Address,
    /// Attached value in wei (deposits only).
    pub value: Option<U256>,
}

/// Confirmation returned for a submitted transaction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction hash.
    pub tx_hash: H256,
    /// Block the transaction was included in, if known.
    pub block_number: Option<u64>,
}

impl Receipt {
    /// Hex form of the transaction hash, used as the confirmation id.
    pub fn confirmation(&self) -> String {
        format!("{:?}", self.tx_hash)
    }
}

/// Network / account validation state.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionState {
    /// Provider present and reporting connected.
    pub is_connected: bool,
    /// Provider is on an allowed network with an unlocked account.
    pub correct_network: bool,
    /// Last network id reported by the provider.
    pub network_id: Option<String>,
    /// First account reported by the provider.
    pub current_account: Option<Address>,
}

/// Vault and wallet balances in wei. `None` means not fetched or invalidated.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceSnapshot {
    /// Balance held by the vault contract for the current account.
    pub vault_balance: Option<U256>,
    /// Native balance of the current account.
    pub wallet_balance: Option<U256>,
}

impl BalanceSnapshot {
    /// Both fields unset.
    pub fn cleared() -> Self {
        Self::default()
    }
}

/// Notification slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Failure message.
    Error,
    /// Confirmation message.
    Success,
}

/// A transient user-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Slot this message occupies.
    pub kind: NotificationKind,
    /// Text shown to the user.
    pub message: String,
    /// When the expiry timer clears it.
    pub expires_at: Instant,
}
