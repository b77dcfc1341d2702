//! Property-based tests for share distribution.
//!
//! - Share-sum exactness for every combination of share kinds
//! - Every declared participant appears in the output
//! - Determinism, including independence from declaration order
//! - Equal splits never differ by more than one minor unit
//! - Customs filling the total up to a tiny remainder still sum exactly
//! - Foreign-currency customs converted at a fixed rate still sum exactly

use std::collections::BTreeMap;

use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use tally_shared::types::{CurrencyCode, ExpenseId, MemberId};

use super::distributor::{ShareDistributor, ShareMap};
use super::types::{Expense, ParticipantShare};
use crate::currency::{CrossCurrencyRule, FixedPointMath};
use crate::settings::LedgerSettings;

/// Strategy to generate totals in minor units (0.01 to 1,000,000.00).
fn total_minor() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy to generate raw participant declarations as (kind tag, raw value).
fn raw_participants() -> impl Strategy<Value = Vec<(u8, i64)>> {
    prop::collection::vec((0u8..4, 1i64..10_000), 1..8)
}

fn member(index: usize) -> MemberId {
    MemberId::from_u128(0x1000 + index as u128)
}

/// Builds an expense whose custom shares can never exceed the total and whose
/// pool always holds at least one non-payer equal participant.
fn build_expense(
    expense_id: u128,
    total_minor: i64,
    raw: &[(u8, i64)],
    include_payer: bool,
) -> Expense {
    let total = Decimal::new(total_minor, 2);
    let mut participants: Vec<ParticipantShare> = raw
        .iter()
        .enumerate()
        .map(|(i, (kind, value))| match kind {
            0 => ParticipantShare::equal(member(i)),
            1 => ParticipantShare::weighted(member(i), Decimal::new(*value, 2)),
            2 => ParticipantShare::custom(
                member(i),
                total * Decimal::from(*value) / Decimal::from(80_000),
            ),
            _ => ParticipantShare::treat(member(i)),
        })
        .collect();
    participants.push(ParticipantShare::equal(member(raw.len())));

    Expense::new(
        ExpenseId::from_u128(expense_id),
        member(0),
        total,
        CurrencyCode::EUR,
        participants,
    )
    .with_include_payer(include_payer)
}

/// Custom amounts at `dp` decimal places splitting `target` by `weights`,
/// truncated so they never sum above it.
fn custom_amounts(target: Decimal, weights: &[i64], dp: u32) -> Vec<Decimal> {
    let weight_sum = Decimal::from(weights.iter().sum::<i64>());
    weights
        .iter()
        .map(|w| {
            (target * Decimal::from(*w) / weight_sum)
                .round_dp_with_strategy(dp, RoundingStrategy::ToZero)
        })
        .collect()
}

/// Checks the invariants every successful distribution must hold.
fn assert_exact(shares: &ShareMap, expense: &Expense, total: i64) -> Result<(), TestCaseError> {
    prop_assert_eq!(shares.values().sum::<i64>(), total);
    prop_assert_eq!(shares.len(), expense.participants.len());
    prop_assert!(shares.values().all(|s| *s >= 0));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Shares always sum exactly to the converted total.
    #[test]
    fn prop_shares_sum_to_total(
        expense_id in any::<u128>(),
        total in total_minor(),
        raw in raw_participants(),
        include_payer in any::<bool>(),
    ) {
        let expense = build_expense(expense_id, total, &raw, include_payer);
        let shares = ShareDistributor::distribute(
            &expense,
            total,
            CurrencyCode::EUR,
            &LedgerSettings::default(),
        ).unwrap();

        prop_assert_eq!(shares.values().sum::<i64>(), total);
    }

    /// Every declared participant is present and no share is negative.
    #[test]
    fn prop_every_participant_present(
        expense_id in any::<u128>(),
        total in total_minor(),
        raw in raw_participants(),
        include_payer in any::<bool>(),
    ) {
        let expense = build_expense(expense_id, total, &raw, include_payer);
        let shares = ShareDistributor::distribute(
            &expense,
            total,
            CurrencyCode::EUR,
            &LedgerSettings::default(),
        ).unwrap();

        prop_assert_eq!(shares.len(), expense.participants.len());
        for participant in &expense.participants {
            let share = shares.get(&participant.member);
            prop_assert!(share.is_some_and(|s| *s >= 0), "missing or negative share for {}", participant.member);
        }
    }

    /// Same expense id and declarations produce the same shares, in any declaration order.
    #[test]
    fn prop_distribution_is_deterministic(
        expense_id in any::<u128>(),
        total in total_minor(),
        raw in raw_participants(),
    ) {
        let expense = build_expense(expense_id, total, &raw, true);
        let mut reversed = expense.clone();
        reversed.participants.reverse();

        let settings = LedgerSettings::default();
        let first = ShareDistributor::distribute(&expense, total, CurrencyCode::EUR, &settings).unwrap();
        let second = ShareDistributor::distribute(&expense, total, CurrencyCode::EUR, &settings).unwrap();
        let third = ShareDistributor::distribute(&reversed, total, CurrencyCode::EUR, &settings).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &third);
    }

    /// Equal-only splits differ by at most one minor unit.
    #[test]
    fn prop_equal_split_is_fair(
        expense_id in any::<u128>(),
        total in 1i64..100_000_000i64,
        count in 1usize..12,
    ) {
        let participants = (0..count).map(|i| ParticipantShare::equal(member(i))).collect();
        let expense = Expense::new(
            ExpenseId::from_u128(expense_id),
            member(0),
            Decimal::new(total, 2),
            CurrencyCode::EUR,
            participants,
        );
        let shares = ShareDistributor::distribute(
            &expense,
            total,
            CurrencyCode::EUR,
            &LedgerSettings::default(),
        ).unwrap();

        let min = shares.values().copied().min().unwrap_or_default();
        let max = shares.values().copied().max().unwrap_or_default();
        prop_assert!(max - min <= 1, "spread {} too wide", max - min);
        prop_assert_eq!(shares.values().sum::<i64>(), total);
    }

    /// Customs that leave only a sub-cent remainder for the pool still sum
    /// exactly, however the individual roundings fall.
    #[test]
    fn prop_near_full_customs_sum_exactly(
        expense_id in any::<u128>(),
        total in 1i64..10_000_000i64,
        weights in prop::collection::vec(1i64..1_000, 1..6),
        gap_thousandths in 0i64..50,
        pool_size in 1usize..4,
    ) {
        let total_dec = Decimal::new(total, 2);
        let target = (total_dec - Decimal::new(gap_thousandths, 3)).max(Decimal::ZERO);
        let mut participants: Vec<ParticipantShare> = custom_amounts(target, &weights, 3)
            .into_iter()
            .enumerate()
            .map(|(i, amount)| ParticipantShare::custom(member(i), amount))
            .collect();
        participants.extend((0..pool_size).map(|i| ParticipantShare::equal(member(weights.len() + i))));
        let expense = Expense::new(
            ExpenseId::from_u128(expense_id),
            member(0),
            total_dec,
            CurrencyCode::EUR,
            participants,
        );

        let shares = ShareDistributor::distribute(
            &expense,
            total,
            CurrencyCode::EUR,
            &LedgerSettings::default(),
        ).unwrap();
        assert_exact(&shares, &expense, total)?;
    }

    /// Foreign customs that fill the whole amount are converted and still sum
    /// exactly to the rounded ledger total, with or without a pool.
    #[test]
    fn prop_foreign_customs_sum_exactly(
        expense_id in any::<u128>(),
        amount in 100i64..10_000_000i64,
        rate in 5_000i64..20_000i64,
        weights in prop::collection::vec(1i64..1_000, 1..6),
        pool_size in 0usize..3,
    ) {
        let rate = Decimal::new(rate, 4);
        let settings = LedgerSettings {
            cross_currency: CrossCurrencyRule::FixedRate(BTreeMap::from([(CurrencyCode::USD, rate)])),
            ..LedgerSettings::default()
        };
        let amount_dec = Decimal::new(amount, 2);
        let mut customs = custom_amounts(amount_dec, &weights, 2);
        let assigned: Decimal = customs.iter().sum();
        if let Some(last) = customs.last_mut() {
            *last += amount_dec - assigned;
        }
        let mut participants: Vec<ParticipantShare> = customs
            .into_iter()
            .enumerate()
            .map(|(i, value)| ParticipantShare::custom(member(i), value))
            .collect();
        participants.extend((0..pool_size).map(|i| ParticipantShare::equal(member(weights.len() + i))));
        let expense = Expense::new(
            ExpenseId::from_u128(expense_id),
            member(0),
            amount_dec,
            CurrencyCode::USD,
            participants,
        );
        let total = FixedPointMath::to_minor_units(amount_dec * rate, 2).unwrap();

        let shares = ShareDistributor::distribute(&expense, total, CurrencyCode::EUR, &settings).unwrap();
        assert_exact(&shares, &expense, total)?;
    }
}
