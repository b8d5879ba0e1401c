//! # Transaction Submitter
//!
//! Deposit and withdraw submission against the bound contract.
//!
//! Input validation happens before anything is sent; a rejected request
//! mutates nothing. Once a call has been sent, its input field is cleared
//! whatever the outcome, so a stale amount never lingers in the form.

use super::balances::BalanceSynchronizer;
use super::notifications::NotificationChannel;
use super::state::{Binding, SharedState};
use crate::algorithms::{parse_ether, UnitConverter};
use crate::domain::{Receipt, TxOptions, VaultSyncError};
use parking_lot::Mutex;
use primitive_types::U256;
use std::sync::Arc;
use tracing::{debug, warn};

/// Message for a deposit rejected before submission.
pub const DEPOSIT_FAILED: &str = "Deposit failed";

/// Message for a withdrawal rejected before submission.
pub const WITHDRAW_FAILED: &str = "Withdraw failed";

/// Withdraw errors are reported without contract detail.
pub const WITHDRAW_REJECTED: &str = "Withdraw failed: insufficient funds or verification failure";

/// Amount input fields of the deposit/withdraw form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormFields {
    /// Deposit amount in ETH as typed.
    pub deposit_amount: String,
    /// Withdraw amount in ETH as typed.
    pub withdraw_amount: String,
}

/// Submits deposits and withdrawals.
pub struct TransactionSubmitter {
    state: SharedState,
    balances: Arc<BalanceSynchronizer>,
    notifications: Arc<NotificationChannel>,
    units: UnitConverter,
    form: Mutex<FormFields>,
}

impl TransactionSubmitter {
    /// Create a submitter.
    pub fn new(
        state: SharedState,
        balances: Arc<BalanceSynchronizer>,
        notifications: Arc<NotificationChannel>,
        units: UnitConverter,
    ) -> Self {
        Self {
            state,
            balances,
            notifications,
            units,
            form: Mutex::new(FormFields::default()),
        }
    }

    /// Current form contents.
    pub fn form(&self) -> FormFields {
        self.form.lock().clone()
    }

    /// Update the deposit field.
    pub fn set_deposit_input(&self, amount: impl Into<String>) {
        self.form.lock().deposit_amount = amount.into();
    }

    /// Update the withdraw field.
    pub fn set_withdraw_input(&self, amount: impl Into<String>) {
        self.form.lock().withdraw_amount = amount.into();
    }

    /// Deposit whatever is in the deposit field.
    pub async fn submit_deposit(&self) -> Result<Receipt, VaultSyncError> {
        let amount = self.form.lock().deposit_amount.clone();
        self.deposit(&amount).await
    }

    /// Withdraw whatever is in the withdraw field.
    pub async fn submit_withdraw(&self) -> Result<Receipt, VaultSyncError> {
        let amount = self.form.lock().withdraw_amount.clone();
        self.withdraw(&amount).await
    }

    /// Deposit `amount` ETH from the current account.
    ///
    /// # Errors
    /// - `NotBound` / `InvalidAmount` before submission ("Deposit failed")
    /// - the contract's own error, surfaced with its detail
    pub async fn deposit(&self, amount: &str) -> Result<Receipt, VaultSyncError> {
        let (binding, value) = self.preflight(amount, DEPOSIT_FAILED)?;
        debug!("[vault-sync] Submitting deposit of {} wei", value);

        let options = TxOptions {
            sender: binding.account,
            value: Some(value),
        };
        let result = binding.contract.deposit(options).await;
        self.form.lock().deposit_amount.clear();

        match result {
            Ok(receipt) => {
                self.notifications.success(format!(
                    "Deposited {} (confirmation {})",
                    self.units.render(value),
                    receipt.confirmation()
                ));
                self.balances.refresh_all().await;
                Ok(receipt)
            }
            Err(e) => {
                self.notifications.error(format!("{DEPOSIT_FAILED}: {e}"));
                Err(e)
            }
        }
    }

    /// Withdraw `amount` ETH to the current account.
    ///
    /// # Errors
    /// - `NotBound` / `InvalidAmount` before submission ("Withdraw failed")
    /// - the contract's error; the notification carries no detail
    pub async fn withdraw(&self, amount: &str) -> Result<Receipt, VaultSyncError> {
        let (binding, value) = self.preflight(amount, WITHDRAW_FAILED)?;
        debug!("[vault-sync] Submitting withdrawal of {} wei", value);

        let options = TxOptions {
            sender: binding.account,
            value: None,
        };
        let result = binding.contract.withdraw(value, options).await;
        self.form.lock().withdraw_amount.clear();

        match result {
            Ok(receipt) => {
                self.notifications.success(format!(
                    "Withdrew {} (confirmation {})",
                    self.units.render(value),
                    receipt.confirmation()
                ));
                self.balances.refresh_all().await;
                Ok(receipt)
            }
            Err(e) => {
                warn!("[vault-sync] Withdraw rejected: {}", e);
                self.notifications.error(WITHDRAW_REJECTED);
                Err(e)
            }
        }
    }

    fn preflight(
        &self,
        amount: &str,
        rejection: &str,
    ) -> Result<(Binding, U256), VaultSyncError> {
        let checked = self
            .state
            .read()
            .binding()
            .ok_or(VaultSyncError::NotBound)
            .and_then(|binding| parse_ether(amount).map(|value| (binding, value)));

        if let Err(e) = &checked {
            debug!("[vault-sync] {} before submission: {}", rejection, e);
            self.notifications.error(rejection);
        }
        checked
    }
}
