//! # Domain Invariants
//!
//! Rules that must hold for every observable state.

use super::entities::LedgerEvent;
use super::value_objects::ConnectionState;
use std::collections::HashSet;

/// Invariant: ledger is ordered newest first.
///
/// `∀ i < j: events[i].block_number >= events[j].block_number`
pub fn invariant_descending_order(events: &[LedgerEvent]) -> bool {
    events
        .windows(2)
        .all(|pair| pair[0].block_number >= pair[1].block_number)
}

/// Invariant: no two structurally equal events are held.
pub fn invariant_no_duplicates(events: &[LedgerEvent]) -> bool {
    let mut seen = HashSet::with_capacity(events.len());
    events.iter().all(|event| seen.insert(event))
}

/// Invariant: a correct network implies an account and a live handle,
/// an incorrect one implies no handle.
pub fn invariant_connection_consistent(state: &ConnectionState, handle_bound: bool) -> bool {
    if state.correct_network {
        state.current_account.is_some() && handle_bound
    } else {
        !handle_bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, EventKind};
    use primitive_types::U256;

    fn event(block: u64, amount: u64) -> LedgerEvent {
        LedgerEvent::new(block, EventKind::Deposit, Address::repeat_byte(1), U256::from(amount))
    }

    #[test]
    fn test_descending_order() {
        assert!(invariant_descending_order(&[event(5, 1), event(5, 2), event(1, 1)]));
        assert!(!invariant_descending_order(&[event(1, 1), event(5, 1)]));
        assert!(invariant_descending_order(&[]));
    }

    #[test]
    fn test_no_duplicates() {
        assert!(invariant_no_duplicates(&[event(5, 1), event(5, 2)]));
        assert!(!invariant_no_duplicates(&[event(5, 1), event(5, 1)]));
    }

    #[test]
    fn test_connection_consistency() {
        let valid = ConnectionState {
            is_connected: true,
            correct_network: true,
            network_id: Some("5777".into()),
            current_account: Some(Address::repeat_byte(0xa)),
        };
        assert!(invariant_connection_consistent(&valid, true));
        assert!(!invariant_connection_consistent(&valid, false));

        let invalid = ConnectionState {
            correct_network: false,
            ..valid
        };
        assert!(invariant_connection_consistent(&invalid, false));
        assert!(!invariant_connection_consistent(&invalid, true));
    }
}
