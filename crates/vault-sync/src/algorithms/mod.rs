//! # Algorithms Module
//!
//! Pure algorithms: unit conversion and ledger merging.

pub mod reconcile;
pub mod units;

pub use reconcile::{merge_batch, MergeOutcome};
pub use units::{
    parse_ether, to_ether_string, UnitConverter, DEFAULT_RENDER_THRESHOLD, LARGE_UNIT_LABEL,
    SMALL_UNIT_LABEL,
};
