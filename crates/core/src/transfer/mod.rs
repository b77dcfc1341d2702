//! Debt netting.
//!
//! Turns a net-balance map into a short list of point-to-point transfers
//! using greedy largest-creditor / largest-debtor matching.

pub mod planner;
pub mod types;

#[cfg(test)]
mod props;

pub use planner::TransferPlanner;
pub use types::Transfer;
