//! Property-based tests for balance aggregation.
//!
//! - Net balances always sum to zero, for every mix of share kinds, add-ons
//!   and fixed-rate foreign currencies
//! - Lenient aggregation over valid input matches strict aggregation
//! - No zero entries survive aggregation

use std::collections::BTreeMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{CurrencyCode, ExpenseId, MemberId};

use super::aggregator::BalanceAggregator;
use crate::currency::CrossCurrencyRule;
use crate::settings::LedgerSettings;
use crate::split::{Expense, ParticipantShare};

/// Raw expense: payer, amount in cents, foreign flag, tip and tax in cents,
/// participants as (member, kind tag, value).
type RawExpense = (u8, i64, bool, i64, i64, Vec<(u8, u8, i64)>);

fn member(index: u8) -> MemberId {
    MemberId::from_u128(0x2000 + u128::from(index))
}

/// Ledger in EUR that converts USD at a fixed rate.
fn settings() -> LedgerSettings {
    LedgerSettings {
        cross_currency: CrossCurrencyRule::FixedRate(BTreeMap::from([(
            CurrencyCode::USD,
            Decimal::new(9_237, 4),
        )])),
        ..LedgerSettings::default()
    }
}

/// Strategy to generate one expense declaration.
fn raw_expense() -> impl Strategy<Value = RawExpense> {
    (
        0u8..6,
        1i64..10_000_000,
        any::<bool>(),
        0i64..2_000,
        0i64..2_000,
        prop::collection::btree_map(0u8..6, (0u8..4, 1i64..500), 1..6)
            .prop_map(|m| m.into_iter().map(|(who, (kind, value))| (who, kind, value)).collect()),
    )
}

/// Builds an expense whose customs never exceed the base amount and which always
/// keeps an equal participant to take the remainder.
fn build(index: usize, raw: &RawExpense) -> Expense {
    let (payer, amount, foreign, tip, tax, participants) = raw;
    let amount = Decimal::new(*amount, 2);
    let mut shares: Vec<ParticipantShare> = participants
        .iter()
        .map(|(who, kind, value)| match kind {
            0 => ParticipantShare::equal(member(*who)),
            1 => ParticipantShare::weighted(member(*who), Decimal::from(*value)),
            // At most five customs of value/3_000 each: under the base amount.
            2 => ParticipantShare::custom(
                member(*who),
                (amount * Decimal::from(*value) / Decimal::from(3_000)).round_dp(3),
            ),
            _ => ParticipantShare::treat(member(*who)),
        })
        .collect();
    shares.push(ParticipantShare::equal(member(6)));

    let mut expense = Expense::new(
        ExpenseId::from_u128(index as u128 + 1),
        member(*payer),
        amount,
        if *foreign {
            CurrencyCode::USD
        } else {
            CurrencyCode::EUR
        },
        shares,
    );
    if *tip > 0 {
        expense = expense.with_tip(Decimal::new(*tip, 2));
    }
    if *tax > 0 {
        expense = expense.with_tax(Decimal::new(*tax, 2));
    }
    expense
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Money is conserved: every ledger nets to exactly zero.
    #[test]
    fn prop_balances_sum_to_zero(raws in prop::collection::vec(raw_expense(), 1..20)) {
        let expenses: Vec<Expense> = raws.iter().enumerate().map(|(i, r)| build(i, r)).collect();
        let balances = BalanceAggregator::compute_net_balances(
            CurrencyCode::EUR,
            &expenses,
            &settings(),
        ).unwrap();

        prop_assert_eq!(balances.values().sum::<i64>(), 0);
        prop_assert!(balances.values().all(|v| *v != 0));
    }

    /// Each expense moves exactly its converted total from participants to the payer.
    #[test]
    fn prop_expense_effect_is_balanced(raw in raw_expense()) {
        let expense = build(0, &raw);
        let settings = settings();
        let effect = BalanceAggregator::expense_effect(&expense, CurrencyCode::EUR, &settings).unwrap();
        let total = BalanceAggregator::converted_total(&expense, CurrencyCode::EUR, &settings).unwrap();

        prop_assert_eq!(effect.values().sum::<i64>(), 0);
        let debits: i64 = effect.values().filter(|v| **v < 0).sum();
        prop_assert!(-debits <= total);
    }

    /// With no invalid expenses the lenient path agrees with the strict one.
    #[test]
    fn prop_lenient_matches_strict_on_valid_input(raws in prop::collection::vec(raw_expense(), 1..20)) {
        let expenses: Vec<Expense> = raws.iter().enumerate().map(|(i, r)| build(i, r)).collect();
        let settings = settings();
        let strict = BalanceAggregator::compute_net_balances(CurrencyCode::EUR, &expenses, &settings).unwrap();
        let report = BalanceAggregator::compute_net_balances_lenient(CurrencyCode::EUR, &expenses, &settings);

        prop_assert!(report.is_complete());
        prop_assert_eq!(report.balances, strict);
    }
}
