//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound ports against an in-memory development chain.

mod dev_chain;

pub use dev_chain::{DevCall, DevChain, DevVault};
