//! Folds expenses into net member balances.

use tally_shared::types::CurrencyCode;

use super::types::{BalanceReport, NetBalances, SkippedExpense, TreatRecord};
use crate::currency::{CurrencyConverter, FixedPointMath};
use crate::error::SettlementError;
use crate::settings::LedgerSettings;
use crate::split::{Expense, ShareDistributor};

/// Balance aggregation service.
///
/// Pure functions only: the same expenses and settings always produce the same map.
pub struct BalanceAggregator;

impl BalanceAggregator {
    /// Gross expense amount (base + tip + tax) converted to ledger minor units.
    ///
    /// Add-ons are summed before conversion so the amount is rounded once.
    pub fn converted_total(
        expense: &Expense,
        ledger_currency: CurrencyCode,
        settings: &LedgerSettings,
    ) -> Result<i64, SettlementError> {
        let gross = expense.gross_amount()?;
        let converted = CurrencyConverter::convert(
            gross,
            expense.currency,
            ledger_currency,
            &settings.cross_currency,
        )?;
        FixedPointMath::to_minor_units(converted, settings.scale)
    }

    /// Signed balance change caused by a single expense.
    ///
    /// The payer is credited the converted total and every participant is debited
    /// its share. Members whose change nets to zero are omitted; a treat-only
    /// expense has no effect at all.
    pub fn expense_effect(
        expense: &Expense,
        ledger_currency: CurrencyCode,
        settings: &LedgerSettings,
    ) -> Result<NetBalances, SettlementError> {
        if expense.participants.is_empty() {
            return Err(SettlementError::EmptyParticipants);
        }
        if expense.is_treat() {
            return Ok(NetBalances::new());
        }

        let total = Self::converted_total(expense, ledger_currency, settings)?;
        let shares = ShareDistributor::distribute(expense, total, ledger_currency, settings)?;

        let mut effect = NetBalances::new();
        effect.insert(expense.payer, total);
        for (member, share) in shares {
            let entry = effect.entry(member).or_insert(0);
            *entry = entry
                .checked_sub(share)
                .ok_or(SettlementError::AmountOutOfRange)?;
        }
        effect.retain(|_, amount| *amount != 0);

        Ok(effect)
    }

    /// Net balances over all expenses of a ledger.
    ///
    /// Aborts on the first invalid expense. Members with a zero net are omitted,
    /// and the values always sum to exactly zero.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tally_core::{BalanceAggregator, Expense, LedgerSettings, ParticipantShare};
    /// use tally_shared::types::{CurrencyCode, ExpenseId, MemberId};
    ///
    /// let alice = MemberId::from_u128(1);
    /// let bob = MemberId::from_u128(2);
    /// let dinner = Expense::new(
    ///     ExpenseId::from_u128(10),
    ///     alice,
    ///     dec!(100.00),
    ///     CurrencyCode::EUR,
    ///     vec![ParticipantShare::equal(alice), ParticipantShare::equal(bob)],
    /// );
    ///
    /// let balances = BalanceAggregator::compute_net_balances(
    ///     CurrencyCode::EUR,
    ///     &[dinner],
    ///     &LedgerSettings::default(),
    /// )
    /// .unwrap();
    /// assert_eq!(balances[&alice], 5000);
    /// assert_eq!(balances[&bob], -5000);
    /// ```
    pub fn compute_net_balances(
        ledger_currency: CurrencyCode,
        expenses: &[Expense],
        settings: &LedgerSettings,
    ) -> Result<NetBalances, SettlementError> {
        let mut balances = NetBalances::new();
        for expense in expenses {
            let effect = Self::expense_effect(expense, ledger_currency, settings)?;
            Self::merge(&mut balances, &effect)?;
        }
        balances.retain(|_, amount| *amount != 0);
        debug_assert_eq!(balances.values().map(|v| i128::from(*v)).sum::<i128>(), 0);

        Ok(balances)
    }

    /// Net balances over the valid expenses of a ledger, skipping invalid ones.
    ///
    /// Each rejected expense is reported with its error; the balances of the
    /// accepted expenses still sum to zero.
    pub fn compute_net_balances_lenient(
        ledger_currency: CurrencyCode,
        expenses: &[Expense],
        settings: &LedgerSettings,
    ) -> BalanceReport {
        let mut report = BalanceReport::default();
        for expense in expenses {
            let applied = Self::expense_effect(expense, ledger_currency, settings).and_then(
                |effect| {
                    let mut next = report.balances.clone();
                    Self::merge(&mut next, &effect)?;
                    Ok(next)
                },
            );
            match applied {
                Ok(next) => report.balances = next,
                Err(error) => {
                    tracing::warn!(
                        expense_id = %expense.id,
                        error_code = error.error_code(),
                        error = %error,
                        "Skipping expense that cannot be settled"
                    );
                    report.skipped.push(SkippedExpense {
                        expense: expense.id,
                        error,
                    });
                }
            }
        }
        report.balances.retain(|_, amount| *amount != 0);

        report
    }

    /// Memo records for treat-only expenses, in input order.
    #[must_use]
    pub fn treat_records(expenses: &[Expense]) -> Vec<TreatRecord> {
        expenses
            .iter()
            .filter(|expense| expense.is_treat())
            .map(|expense| TreatRecord {
                expense: expense.id,
                payer: expense.payer,
                beneficiaries: expense.participants.iter().map(|p| p.member).collect(),
            })
            .collect()
    }

    fn merge(balances: &mut NetBalances, effect: &NetBalances) -> Result<(), SettlementError> {
        for (member, amount) in effect {
            let entry = balances.entry(*member).or_insert(0);
            *entry = entry
                .checked_add(*amount)
                .ok_or(SettlementError::AmountOutOfRange)?;
        }
        Ok(())
    }
}
