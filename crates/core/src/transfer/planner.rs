//! Greedy transfer planning.

use std::cmp::Reverse;

use tally_shared::types::MemberId;

use super::types::Transfer;
use crate::balance::NetBalances;
use crate::error::SettlementError;

/// Transfer planning service.
pub struct TransferPlanner;

impl TransferPlanner {
    /// Plans transfers that zero out `balances`.
    ///
    /// Creditors and debtors are each sorted by descending magnitude, ties broken
    /// by member id, and the largest remaining debtor always pays the largest
    /// remaining creditor. For `n` non-zero balances the plan has at most `n - 1`
    /// transfers. This is a heuristic; it is not guaranteed to reach the global
    /// minimum transfer count.
    ///
    /// Balances that do not sum to zero leave the excess unmatched.
    #[must_use]
    pub fn greedy_min_transfers(balances: &NetBalances) -> Vec<Transfer> {
        let mut creditors = Self::sorted_side(balances, |amount| amount > 0);
        let mut debtors = Self::sorted_side(balances, |amount| amount < 0);

        let mut transfers: Vec<Transfer> = Vec::new();
        let (mut c, mut d) = (0, 0);
        while c < creditors.len() && d < debtors.len() {
            let (creditor, credit) = &mut creditors[c];
            let (debtor, debt) = &mut debtors[d];
            let amount = (*credit).min(*debt);

            // Each step exhausts a creditor or a debtor, so consecutive transfers
            // never repeat a (from, to) pair and nothing needs coalescing.
            transfers.push(Transfer {
                from: *debtor,
                to: *creditor,
                amount,
            });

            *credit -= amount;
            *debt -= amount;
            if *credit == 0 {
                c += 1;
            }
            if *debt == 0 {
                d += 1;
            }
        }

        tracing::debug!(
            creditors = creditors.len(),
            debtors = debtors.len(),
            transfers = transfers.len(),
            "Planned transfers"
        );

        transfers
    }

    /// Residual balances after executing `transfers` against `balances`.
    ///
    /// A payment raises the payer's balance and lowers the receiver's. Members
    /// left at zero are omitted, so a complete plan yields an empty map.
    pub fn apply(
        balances: &NetBalances,
        transfers: &[Transfer],
    ) -> Result<NetBalances, SettlementError> {
        let mut residual = balances.clone();
        for transfer in transfers {
            let amount =
                i64::try_from(transfer.amount).map_err(|_| SettlementError::AmountOutOfRange)?;

            let from = residual.entry(transfer.from).or_insert(0);
            *from = from
                .checked_add(amount)
                .ok_or(SettlementError::AmountOutOfRange)?;

            let to = residual.entry(transfer.to).or_insert(0);
            *to = to
                .checked_sub(amount)
                .ok_or(SettlementError::AmountOutOfRange)?;
        }
        residual.retain(|_, amount| *amount != 0);

        Ok(residual)
    }

    /// One side of the book as (member, magnitude), largest first.
    fn sorted_side(balances: &NetBalances, keep: impl Fn(i64) -> bool) -> Vec<(MemberId, u64)> {
        let mut side: Vec<(MemberId, u64)> = balances
            .iter()
            .filter(|(_, amount)| keep(**amount))
            .map(|(member, amount)| (*member, amount.unsigned_abs()))
            .collect();
        side.sort_by_key(|(member, amount)| (Reverse(*amount), *member));
        side
    }
}
