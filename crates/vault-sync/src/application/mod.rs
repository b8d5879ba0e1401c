//! # Application Module
//!
//! The sync components and the service that drives them.

pub mod balances;
pub mod events;
pub mod network;
pub mod notifications;
pub mod service;
pub mod state;
pub mod transactions;

pub use balances::{BalanceSynchronizer, FetchOutcome};
pub use events::{EventReconciler, TickReport};
pub use network::{NetworkValidator, ValidationOutcome};
pub use notifications::NotificationChannel;
pub use service::VaultSyncService;
pub use state::{Binding, ContractHandle, SharedState, SyncState};
pub use transactions::{
    FormFields, TransactionSubmitter, DEPOSIT_FAILED, WITHDRAW_FAILED, WITHDRAW_REJECTED,
};
