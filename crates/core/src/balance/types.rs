//! Balance aggregation result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tally_shared::types::{ExpenseId, MemberId};

use crate::error::SettlementError;

/// Signed net balance per member, in ledger minor units.
///
/// Positive means the member is owed money, negative means the member owes.
pub type NetBalances = BTreeMap<MemberId, i64>;

/// An expense left out of a lenient aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedExpense {
    /// The rejected expense.
    pub expense: ExpenseId,
    /// Why it was rejected.
    pub error: SettlementError,
}

/// Result of aggregating a ledger while skipping invalid expenses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceReport {
    /// Net balances over the accepted expenses, zero entries removed.
    pub balances: NetBalances,
    /// Expenses that were rejected, in input order.
    pub skipped: Vec<SkippedExpense>,
}

impl BalanceReport {
    /// True when every expense was accepted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// A treat-only expense, kept for history but never moving balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatRecord {
    /// The treat expense.
    pub expense: ExpenseId,
    /// Member who treated.
    pub payer: MemberId,
    /// Members who were treated, in declaration order.
    pub beneficiaries: Vec<MemberId>,
}
