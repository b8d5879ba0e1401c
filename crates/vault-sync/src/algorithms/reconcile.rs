//! # Ledger Reconciliation
//!
//! Merges a batch of fetched log records into the ordered ledger view.
//!
//! Fetch windows are `[lowest_block, latest]` with an inclusive lower bound,
//! so the boundary block is always re-delivered. Deduplication by full
//! structural equality absorbs that overlap; the window must not be made
//! exclusive.

use crate::domain::{LedgerEvent, LedgerView};
use std::collections::HashSet;

/// What a merge did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Batch was empty.
    Empty,
    /// Single already-held event; nothing touched.
    FastSkipped,
    /// Batch merged.
    Merged {
        /// Events that were not already held.
        added: usize,
        /// Watermark after the merge.
        watermark: u64,
    },
}

/// Merge one batch into the view.
///
/// 1. A single-record batch equal to a held event is skipped outright.
/// 2. `highest = max(lowest_block, max(batch block numbers))`.
/// 3. Held events followed by the batch, deduplicated keeping the first
///    occurrence.
/// 4. Stable sort, newest block first.
/// 5. Commit events and `lowest_block = highest`.
pub fn merge_batch(view: &mut LedgerView, batch: Vec<LedgerEvent>) -> MergeOutcome {
    if batch.is_empty() {
        return MergeOutcome::Empty;
    }

    if batch.len() == 1 && view.contains(&batch[0]) {
        return MergeOutcome::FastSkipped;
    }

    let highest = batch
        .iter()
        .map(|event| event.block_number)
        .fold(view.lowest_block, u64::max);

    let held = view.events.len();
    let mut merged = std::mem::take(&mut view.events);
    merged.extend(batch);

    let mut seen = HashSet::with_capacity(merged.len());
    merged.retain(|event| seen.insert(event.clone()));
    let added = merged.len() - held;

    merged.sort_by(|a, b| b.block_number.cmp(&a.block_number));

    view.events = merged;
    view.lowest_block = highest;

    MergeOutcome::Merged {
        added,
        watermark: highest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{invariant_descending_order, invariant_no_duplicates, Address, EventKind};
    use primitive_types::U256;
    use proptest::prelude::*;

    fn deposit(block: u64, amount: u64) -> LedgerEvent {
        LedgerEvent::new(block, EventKind::Deposit, Address::repeat_byte(0xa), U256::from(amount))
    }

    fn withdraw(block: u64, amount: u64) -> LedgerEvent {
        LedgerEvent::new(block, EventKind::Withdraw, Address::repeat_byte(0xa), U256::from(amount))
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut view = LedgerView::new();
        assert_eq!(merge_batch(&mut view, vec![]), MergeOutcome::Empty);
        assert_eq!(view, LedgerView::new());
    }

    #[test]
    fn test_redelivered_event_kept_once() {
        let mut view = LedgerView::new();
        merge_batch(&mut view, vec![deposit(10, 5)]);
        let outcome = merge_batch(&mut view, vec![deposit(10, 5)]);

        assert_eq!(outcome, MergeOutcome::FastSkipped);
        assert_eq!(view.len(), 1);
        assert_eq!(view.lowest_block(), 10);
    }

    #[test]
    fn test_fast_skip_uses_full_identity() {
        let mut view = LedgerView::new();
        merge_batch(&mut view, vec![deposit(10, 5)]);

        // Same block, different event: must be merged, not skipped.
        let outcome = merge_batch(&mut view, vec![withdraw(10, 5)]);
        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                added: 1,
                watermark: 10
            }
        );
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_boundary_overlap_deduplicated() {
        let mut view = LedgerView::new();
        merge_batch(&mut view, vec![deposit(3, 1), deposit(7, 2)]);
        // Next window starts at 7 and re-delivers the boundary event.
        let outcome = merge_batch(&mut view, vec![deposit(7, 2), withdraw(9, 1)]);

        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                added: 1,
                watermark: 9
            }
        );
        let blocks: Vec<u64> = view.events().iter().map(|e| e.block_number).collect();
        assert_eq!(blocks, vec![9, 7, 3]);
    }

    #[test]
    fn test_watermark_never_decreases_on_old_batch() {
        let mut view = LedgerView::new();
        merge_batch(&mut view, vec![deposit(20, 1)]);
        merge_batch(&mut view, vec![deposit(4, 1), withdraw(6, 1)]);

        assert_eq!(view.lowest_block(), 20);
        assert_eq!(view.events()[0].block_number, 20);
    }

    #[test]
    fn test_ties_keep_held_events_first() {
        let mut view = LedgerView::new();
        merge_batch(&mut view, vec![deposit(5, 1)]);
        merge_batch(&mut view, vec![withdraw(5, 2), deposit(5, 3)]);

        let amounts: Vec<U256> = view.events().iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![U256::from(1), U256::from(2), U256::from(3)]);
    }

    fn arb_event() -> impl Strategy<Value = LedgerEvent> {
        (0u64..50, any::<bool>(), 0u8..3, 1u64..4).prop_map(|(block, is_deposit, acct, amount)| {
            let kind = if is_deposit {
                EventKind::Deposit
            } else {
                EventKind::Withdraw
            };
            LedgerEvent::new(block, kind, Address::repeat_byte(acct), U256::from(amount))
        })
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(batch in prop::collection::vec(arb_event(), 0..20)) {
            let mut once = LedgerView::new();
            merge_batch(&mut once, batch.clone());

            let mut twice = once.clone();
            merge_batch(&mut twice, batch);

            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_order_and_uniqueness_hold(
            batches in prop::collection::vec(prop::collection::vec(arb_event(), 0..10), 0..8)
        ) {
            let mut view = LedgerView::new();
            let mut watermark = 0;
            for batch in batches {
                merge_batch(&mut view, batch);
                prop_assert!(invariant_descending_order(view.events()));
                prop_assert!(invariant_no_duplicates(view.events()));
                prop_assert!(view.lowest_block() >= watermark);
                watermark = view.lowest_block();
            }
        }

        #[test]
        fn prop_delivery_order_does_not_change_contents(
            a in prop::collection::vec(arb_event(), 0..10),
            b in prop::collection::vec(arb_event(), 0..10),
        ) {
            let mut ab = LedgerView::new();
            merge_batch(&mut ab, a.clone());
            merge_batch(&mut ab, b.clone());

            let mut ba = LedgerView::new();
            merge_batch(&mut ba, b);
            merge_batch(&mut ba, a);

            let as_set = |view: &LedgerView| view.events().iter().cloned().collect::<HashSet<_>>();
            prop_assert_eq!(as_set(&ab), as_set(&ba));
            prop_assert_eq!(ab.lowest_block(), ba.lowest_block());
        }
    }
}
