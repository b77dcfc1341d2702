//! Per-expense share distribution.
//!
//! This module implements the split of one expense across its participants:
//! - Expense and participant share declarations
//! - Share distribution for equal, weighted, custom, and treat shares
//! - Deterministic rounding-difference assignment keyed on the expense id

pub mod distributor;
pub mod rounding;
pub mod types;

#[cfg(test)]
mod props;

pub use distributor::{ShareDistributor, ShareMap};
pub use rounding::{absorb_rounding_difference, rotation_offset};
pub use types::{Expense, ParticipantShare, ShareKind};
