//! # Vault Sync
//!
//! State synchronization engine for a browser wallet talking to a vault
//! contract.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Keep a client-side view of the vault consistent with the chain:
//! - Poll the wallet provider and bind the contract only on allowed networks
//! - Fetch vault and wallet balances for the selected account
//! - Submit deposits and withdrawals with preflight validation
//! - Reconcile Deposit/Withdraw logs into an ordered, duplicate-free ledger
//! - Surface results through two auto-expiring notification slots
//!
//! ## Liveness
//!
//! | Event | Effect |
//! |-------|--------|
//! | Network becomes invalid | Handle released, balances cleared, ledger dropped |
//! | Account switch | In-flight balance responses discarded |
//! | Shutdown | Timers cancelled, later responses ignored |
//!
//! ## Module Structure
//!
//! ```text
//! vault-sync/
//! ├── domain/          # Ledger events, connection state, errors, invariants
//! ├── algorithms/      # Unit rendering, ledger merge
//! ├── ports/           # API trait (inbound) + provider/contract traits (outbound)
//! ├── application/     # Validator, balances, submitter, reconciler, service
//! ├── adapters/        # In-memory development chain
//! ├── config.rs        # SyncConfig
//! └── telemetry.rs     # Tracing setup
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

// Re-exports
pub use adapters::{DevCall, DevChain, DevVault};
pub use algorithms::{
    merge_batch, parse_ether, to_ether_string, MergeOutcome, UnitConverter,
    DEFAULT_RENDER_THRESHOLD,
};
pub use application::{
    BalanceSynchronizer, EventReconciler, NetworkValidator, NotificationChannel,
    TransactionSubmitter, VaultSyncService,
};
pub use config::SyncConfig;
pub use domain::{
    Address, BalanceSnapshot, BlockRange, ConnectionState, EventKind, LedgerEvent, LedgerView,
    NetworkId, Notification, NotificationKind, Receipt, VaultSyncError,
    invariant_descending_order, invariant_no_duplicates,
};
pub use ports::{ContractBinder, VaultClientApi, VaultContract, WalletProvider};
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
