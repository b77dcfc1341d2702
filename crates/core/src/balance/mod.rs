//! Net balance aggregation.
//!
//! This module folds expenses into signed per-member balances:
//! - Payer credit and participant debits per expense
//! - Strict and lenient aggregation over a ledger
//! - Memo records for treat-only expenses

pub mod aggregator;
pub mod types;

#[cfg(test)]
mod props;

pub use aggregator::BalanceAggregator;
pub use types::{BalanceReport, NetBalances, SkippedExpense, TreatRecord};
