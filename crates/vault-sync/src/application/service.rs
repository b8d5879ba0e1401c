//! # Vault Sync Service
//!
//! Wires the components together and owns the two polling loops.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::balances::BalanceSynchronizer;
use super::events::EventReconciler;
use super::network::NetworkValidator;
use super::notifications::NotificationChannel;
use super::state::{SharedState, SyncState};
use super::transactions::{FormFields, TransactionSubmitter};
use crate::algorithms::{to_ether_string, UnitConverter, LARGE_UNIT_LABEL};
use crate::config::SyncConfig;
use crate::domain::{
    BalanceSnapshot, ConnectionState, LedgerEvent, LedgerView, Notification, NotificationKind,
    Receipt, VaultSyncError,
};
use crate::ports::{ContractBinder, VaultClientApi, WalletProvider};

/// Vault Sync Service - validation, balances, submissions and ledger.
pub struct VaultSyncService {
    config: SyncConfig,
    state: SharedState,
    provider: Arc<dyn WalletProvider>,
    notifications: Arc<NotificationChannel>,
    validator: Arc<NetworkValidator>,
    balances: Arc<BalanceSynchronizer>,
    submitter: TransactionSubmitter,
    reconciler: Arc<EventReconciler>,
    units: UnitConverter,
    /// Validation and reconciliation loops.
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl VaultSyncService {
    /// Create a new service. Nothing is polled until [`start`](Self::start).
    pub fn new(
        config: SyncConfig,
        provider: Arc<dyn WalletProvider>,
        binder: Arc<dyn ContractBinder>,
    ) -> Self {
        info!("[vault-sync] Initializing vault sync service");
        info!("  Allowed networks: {:?}", config.allowed_networks);
        info!("  Validation interval: {}ms", config.validate_interval_ms);
        info!("  Reconcile interval: {}ms", config.reconcile_interval_ms);

        let state = SyncState::shared();
        let notifications = Arc::new(NotificationChannel::new(config.notification_ttl()));
        let units = UnitConverter::new(config.render_threshold);

        let balances = Arc::new(BalanceSynchronizer::new(
            Arc::clone(&state),
            Arc::clone(&provider),
            Arc::clone(&notifications),
        ));
        let validator = Arc::new(NetworkValidator::new(
            config.clone(),
            Arc::clone(&state),
            Arc::clone(&provider),
            binder,
            Arc::clone(&balances),
        ));
        let submitter = TransactionSubmitter::new(
            Arc::clone(&state),
            Arc::clone(&balances),
            Arc::clone(&notifications),
            units,
        );
        let reconciler = Arc::new(EventReconciler::new(
            Arc::clone(&state),
            Arc::clone(&notifications),
        ));

        Self {
            config,
            state,
            provider,
            notifications,
            validator,
            balances,
            submitter,
            reconciler,
            units,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start both polling loops. Each ticks once immediately, and the
    /// reconcile loop ticks again whenever a new contract is bound.
    ///
    /// # Errors
    /// - `ProviderUnavailable` if the provider is absent or disconnected
    /// - `ShutDown` if [`shutdown`](Self::shutdown) was already called
    pub fn start(&self) -> Result<(), VaultSyncError> {
        if self.state.read().is_torn_down() {
            return Err(VaultSyncError::ShutDown);
        }
        if !self.provider.is_connected() {
            error!("[vault-sync] No connected wallet provider, sync not started");
            return Err(VaultSyncError::ProviderUnavailable);
        }

        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            return Ok(());
        }
        self.state.write().mark_connected();

        let validator = Arc::clone(&self.validator);
        tasks.push(spawn_ticker(self.config.validate_interval(), None, move || {
            let validator = Arc::clone(&validator);
            async move { validator.tick().await }
        }));

        let reconciler = Arc::clone(&self.reconciler);
        let wake = Some(self.validator.bind_signal());
        tasks.push(spawn_ticker(self.config.reconcile_interval(), wake, move || {
            let reconciler = Arc::clone(&reconciler);
            async move {
                reconciler.tick().await;
            }
        }));

        info!("[vault-sync] Polling started");
        Ok(())
    }

    /// Stop polling, cancel every timer and release the contract.
    ///
    /// Responses still in flight are ignored when they land.
    pub fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.state.write().tear_down();
        self.validator.shutdown();
        self.notifications.shutdown();
        self.reconciler.reset();
        info!("[vault-sync] Shut down");
    }

    /// Whether the polling loops are running.
    pub fn is_running(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Receiver for connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.validator.subscribe()
    }

    /// Run one validation poll now and wait for the balance refresh it
    /// triggers.
    pub async fn validate_now(&self) {
        self.validator.tick().await;
        self.validator.settle().await;
    }

    /// Full ledger, not truncated.
    pub fn ledger(&self) -> LedgerView {
        self.reconciler.view()
    }

    /// Wallet and vault balances in ETH, for the "available balance" hints.
    pub fn display_balances(&self) -> (String, String) {
        let balances = self.state.read().balances();
        let render = |amount: Option<primitive_types::U256>| {
            format!(
                "{} {}",
                to_ether_string(amount.unwrap_or_default()),
                LARGE_UNIT_LABEL
            )
        };
        (render(balances.wallet_balance), render(balances.vault_balance))
    }

    /// Render an amount with the configured threshold rule.
    pub fn render(&self, amount: primitive_types::U256) -> String {
        self.units.render(amount)
    }

    /// Deposit / withdraw form.
    pub fn form(&self) -> FormFields {
        self.submitter.form()
    }

    /// Update the deposit field.
    pub fn set_deposit_input(&self, amount: impl Into<String>) {
        self.submitter.set_deposit_input(amount);
    }

    /// Update the withdraw field.
    pub fn set_withdraw_input(&self, amount: impl Into<String>) {
        self.submitter.set_withdraw_input(amount);
    }

    /// Submit the deposit field.
    pub async fn submit_deposit(&self) -> Result<Receipt, VaultSyncError> {
        self.submitter.submit_deposit().await
    }

    /// Submit the withdraw field.
    pub async fn submit_withdraw(&self) -> Result<Receipt, VaultSyncError> {
        self.submitter.submit_withdraw().await
    }
}

impl Drop for VaultSyncService {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

/// Spawn a loop that runs `tick` on a fixed interval, first tick immediate.
/// Late ticks are skipped rather than bunched. A `wake` signal runs an
/// extra tick right away and restarts the interval.
fn spawn_ticker<F, Fut>(period: Duration, wake: Option<Arc<Notify>>, tick: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            match &wake {
                Some(wake) => {
                    tokio::select! {
                        biased;
                        _ = interval.tick() => {}
                        _ = wake.notified() => interval.reset(),
                    }
                }
                None => {
                    interval.tick().await;
                }
            }
            tick().await;
        }
    })
}

#[async_trait]
impl VaultClientApi for VaultSyncService {
    async fn deposit(&self, amount: &str) -> Result<Receipt, VaultSyncError> {
        self.submitter.deposit(amount).await
    }

    async fn withdraw(&self, amount: &str) -> Result<Receipt, VaultSyncError> {
        self.submitter.withdraw(amount).await
    }

    async fn refresh_vault_balance(&self) {
        self.balances.fetch_vault_balance().await;
    }

    async fn refresh_wallet_balance(&self) {
        self.balances.fetch_wallet_balance().await;
    }

    async fn refresh_ledger(&self) {
        self.reconciler.tick().await;
    }

    fn connection(&self) -> ConnectionState {
        self.state.read().connection().clone()
    }

    fn balances(&self) -> BalanceSnapshot {
        self.state.read().balances()
    }

    fn recent_events(&self) -> Vec<LedgerEvent> {
        self.reconciler.recent(self.config.ledger_display_limit)
    }

    fn notification(&self, kind: NotificationKind) -> Option<Notification> {
        self.notifications.current(kind)
    }
}
