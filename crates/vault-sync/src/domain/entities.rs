//! # Domain Entities
//!
//! Ledger events and the ordered ledger view built from them.

use super::value_objects::{Address, EventKind};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// One deposit or withdrawal emitted by the vault contract.
///
/// Identity is full structural equality: two distinct events may share a
/// block number.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LedgerEvent {
    /// Block the log was emitted in.
    pub block_number: u64,
    /// Deposit or withdraw.
    pub kind: EventKind,
    /// Account that moved funds.
    pub account: Address,
    /// Amount in wei.
    pub amount: U256,
}

impl LedgerEvent {
    /// Create a new ledger event.
    pub fn new(block_number: u64, kind: EventKind, account: Address, amount: U256) -> Self {
        Self {
            block_number,
            kind,
            account,
            amount,
        }
    }
}

/// Ordered ledger: strictly non-increasing block numbers, no duplicates,
/// plus the watermark the next fetch window starts from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerView {
    pub(crate) events: Vec<LedgerEvent>,
    pub(crate) lowest_block: u64,
}

impl LedgerView {
    /// Empty ledger, watermark at block 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// All held events, newest first.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// The first `limit` events, for presentation.
    pub fn recent(&self, limit: usize) -> &[LedgerEvent] {
        &self.events[..limit.min(self.events.len())]
    }

    /// Inclusive lower bound of the next fetch window.
    pub fn lowest_block(&self) -> u64 {
        self.lowest_block
    }

    /// Whether an equal event is already held.
    pub fn contains(&self, event: &LedgerEvent) -> bool {
        self.events.iter().any(|held| held == event)
    }

    /// Number of held events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing has been merged yet.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
