//! # Event Reconciler
//!
//! Pulls Deposit and Withdraw logs over `[lowest_block, latest]` on every
//! tick and merges them into the ledger view.
//!
//! The two queries run concurrently and merge independently: a failed
//! query drops only its own contribution for the tick. The ledger belongs
//! to one contract handle; when the handle changes the ledger restarts
//! from block 0.

use super::notifications::NotificationChannel;
use super::state::SharedState;
use crate::algorithms::{merge_batch, MergeOutcome};
use crate::domain::{BlockRange, EventKind, LedgerEvent, LedgerView};
use crate::ports::VaultContract;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Per-kind result of one reconciliation tick. `None` means the query
/// was not issued, failed, or its response was dropped as stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Deposit query merge result.
    pub deposits: Option<MergeOutcome>,
    /// Withdraw query merge result.
    pub withdrawals: Option<MergeOutcome>,
}

#[derive(Default)]
struct Ledger {
    view: LedgerView,
    handle_id: Option<u64>,
}

/// Incremental ledger event fetcher.
pub struct EventReconciler {
    state: SharedState,
    notifications: Arc<NotificationChannel>,
    ledger: RwLock<Ledger>,
}

impl EventReconciler {
    /// Create a reconciler with an empty ledger.
    pub fn new(state: SharedState, notifications: Arc<NotificationChannel>) -> Self {
        Self {
            state,
            notifications,
            ledger: RwLock::new(Ledger::default()),
        }
    }

    /// Snapshot of the full ledger.
    pub fn view(&self) -> LedgerView {
        self.ledger.read().view.clone()
    }

    /// The newest `limit` events.
    pub fn recent(&self, limit: usize) -> Vec<LedgerEvent> {
        self.ledger.read().view.recent(limit).to_vec()
    }

    /// Lower bound of the next fetch window.
    pub fn lowest_block(&self) -> u64 {
        self.ledger.read().view.lowest_block()
    }

    /// Drop all held events.
    pub fn reset(&self) {
        *self.ledger.write() = Ledger::default();
    }

    /// One fetch + merge cycle.
    pub async fn tick(&self) -> TickReport {
        let handle = self
            .state
            .read()
            .handle()
            .map(|handle| (Arc::clone(&handle.contract), handle.id));

        let Some((contract, handle_id)) = handle else {
            if self.ledger.read().handle_id.is_some() {
                debug!("[vault-sync] Contract released, dropping ledger");
                self.reset();
            }
            return TickReport::default();
        };

        let from_block = {
            let mut ledger = self.ledger.write();
            if ledger.handle_id != Some(handle_id) {
                *ledger = Ledger {
                    view: LedgerView::new(),
                    handle_id: Some(handle_id),
                };
            }
            ledger.view.lowest_block()
        };
        let range = BlockRange::from_block_to_latest(from_block);

        let (deposits, withdrawals) = tokio::join!(
            self.fetch_and_merge(&contract, handle_id, EventKind::Deposit, range),
            self.fetch_and_merge(&contract, handle_id, EventKind::Withdraw, range),
        );

        TickReport {
            deposits,
            withdrawals,
        }
    }

    async fn fetch_and_merge(
        &self,
        contract: &Arc<dyn VaultContract>,
        handle_id: u64,
        kind: EventKind,
        range: BlockRange,
    ) -> Option<MergeOutcome> {
        let result = contract.query_events(kind, range).await;

        if !self.state.read().is_handle_current(handle_id) {
            debug!("[vault-sync] Dropping {} logs for released contract", kind);
            return None;
        }

        match result {
            Ok(batch) => {
                let mut ledger = self.ledger.write();
                if ledger.handle_id != Some(handle_id) {
                    return None;
                }
                let fetched = batch.len();
                let outcome = merge_batch(&mut ledger.view, batch);
                debug!(
                    "[vault-sync] {} logs from block {}: {} fetched, {:?}",
                    kind, range.from_block, fetched, outcome
                );
                Some(outcome)
            }
            Err(e) => {
                let what = match kind {
                    EventKind::Deposit => "deposits",
                    EventKind::Withdraw => "withdrawals",
                };
                self.notifications.error(format!(
                    "There was an error getting {what}. Please verify the wallet is connected to the right network ({e})"
                ));
                None
            }
        }
    }
}
