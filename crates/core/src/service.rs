//! Settlement facade: balances then transfers, for one ledger or many.

use rayon::prelude::*;
use serde::Serialize;
use tally_shared::types::{CurrencyCode, LedgerId, MemberId, Money};

use crate::balance::{BalanceAggregator, NetBalances};
use crate::error::SettlementError;
use crate::settings::LedgerSettings;
use crate::split::Expense;
use crate::transfer::{Transfer, TransferPlanner};

/// Settled state of one ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// Currency all amounts are expressed in.
    pub ledger_currency: CurrencyCode,
    /// Net balance per member, zero entries omitted.
    pub balances: NetBalances,
    /// Transfers that zero out `balances`.
    pub transfers: Vec<Transfer>,
}

impl Settlement {
    /// Net balance of `member` in the ledger currency; zero when the member is settled.
    #[must_use]
    pub fn balance_of(&self, member: MemberId) -> Money {
        self.balances.get(&member).map_or_else(
            || Money::zero(self.ledger_currency),
            |amount| Money::new(*amount, self.ledger_currency),
        )
    }
}

/// One ledger to settle in a batch.
#[derive(Debug, Clone)]
pub struct LedgerInput {
    /// Ledger identifier, echoed in the outcome.
    pub ledger_id: LedgerId,
    /// Currency balances are expressed in.
    pub ledger_currency: CurrencyCode,
    /// Expenses of the ledger.
    pub expenses: Vec<Expense>,
    /// Settings for this ledger.
    pub settings: LedgerSettings,
}

/// Outcome for one ledger of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOutcome {
    /// Ledger identifier from the input.
    pub ledger_id: LedgerId,
    /// Settlement, or the first error hit by the ledger.
    pub result: Result<Settlement, SettlementError>,
}

/// Settlement service.
pub struct SettlementService;

impl SettlementService {
    /// Aggregates `expenses` and plans the transfers that settle them.
    pub fn settle(
        ledger_currency: CurrencyCode,
        expenses: &[Expense],
        settings: &LedgerSettings,
    ) -> Result<Settlement, SettlementError> {
        let balances = BalanceAggregator::compute_net_balances(ledger_currency, expenses, settings)?;
        let transfers = TransferPlanner::greedy_min_transfers(&balances);

        tracing::debug!(
            ledger_currency = %ledger_currency,
            expenses = expenses.len(),
            members = balances.len(),
            transfers = transfers.len(),
            "Settled ledger"
        );

        Ok(Settlement {
            ledger_currency,
            balances,
            transfers,
        })
    }

    /// Settles independent ledgers in parallel.
    ///
    /// Outcomes are returned in input order; one failing ledger does not affect
    /// the others.
    #[must_use]
    pub fn settle_many(ledgers: &[LedgerInput]) -> Vec<LedgerOutcome> {
        ledgers
            .par_iter()
            .map(|ledger| LedgerOutcome {
                ledger_id: ledger.ledger_id,
                result: Self::settle(ledger.ledger_currency, &ledger.expenses, &ledger.settings),
            })
            .collect()
    }
}
