//! Property-based tests for transfer planning.
//!
//! - Each debtor pays exactly its debt and each creditor receives exactly its credit
//! - At most n - 1 transfers for n non-zero balances
//! - No zero-amount or self transfers, and no repeated adjacent pair

use std::collections::BTreeMap;

use proptest::prelude::*;
use tally_shared::types::MemberId;

use super::planner::TransferPlanner;
use crate::balance::NetBalances;

/// Strategy to generate a zero-sum balance map over up to 12 members.
fn zero_sum_balances() -> impl Strategy<Value = NetBalances> {
    prop::collection::vec(-1_000_000i64..1_000_000i64, 1..12).prop_map(|amounts| {
        let mut balances: NetBalances = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| (MemberId::from_u128(0x3000 + i as u128), *amount))
            .collect();
        let sum: i64 = amounts.iter().sum();
        balances.insert(MemberId::from_u128(0x2fff), -sum);
        balances.retain(|_, amount| *amount != 0);
        balances
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Summing the plan per party reproduces each original balance.
    #[test]
    fn prop_transfers_net_each_party(balances in zero_sum_balances()) {
        let plan = TransferPlanner::greedy_min_transfers(&balances);

        let mut moved: BTreeMap<MemberId, i64> = BTreeMap::new();
        for transfer in &plan {
            let amount = i64::try_from(transfer.amount).unwrap();
            *moved.entry(transfer.to).or_insert(0) += amount;
            *moved.entry(transfer.from).or_insert(0) -= amount;
        }
        prop_assert_eq!(moved, balances.clone());
        prop_assert!(TransferPlanner::apply(&balances, &plan).unwrap().is_empty());
    }

    /// The plan is bounded, positive and never pays oneself.
    #[test]
    fn prop_plan_is_compact(balances in zero_sum_balances()) {
        let plan = TransferPlanner::greedy_min_transfers(&balances);

        prop_assert!(plan.len() <= balances.len().saturating_sub(1));
        for pair in plan.windows(2) {
            prop_assert!((pair[0].from, pair[0].to) != (pair[1].from, pair[1].to));
        }
        for transfer in &plan {
            prop_assert!(transfer.amount > 0);
            prop_assert_ne!(transfer.from, transfer.to);
            prop_assert!(balances[&transfer.from] < 0);
            prop_assert!(balances[&transfer.to] > 0);
        }
    }

    /// Planning is a pure function of the balance map.
    #[test]
    fn prop_plan_is_deterministic(balances in zero_sum_balances()) {
        let first = TransferPlanner::greedy_min_transfers(&balances);
        let second = TransferPlanner::greedy_min_transfers(&balances.clone());
        prop_assert_eq!(first, second);
    }
}
