//! Share distribution for a single expense.
//!
//! Splits a converted total (integer minor units in the ledger currency)
//! across the expense's participants so that the shares sum exactly to the total:
//! 1. Custom shares are converted and removed from the total
//! 2. The remainder is split over the equal/weighted pool by weight
//! 3. Every provisional share is rounded to minor units independently
//! 4. The rounding difference is assigned with the expense-id rotation rule

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use tally_shared::types::{CurrencyCode, MemberId};

use super::rounding::absorb_rounding_difference;
use super::types::{Expense, ShareKind};
use crate::currency::{CurrencyConverter, FixedPointMath};
use crate::error::{SettlementError, ShareViolation};
use crate::settings::LedgerSettings;

/// Owed share per member, in ledger minor units.
///
/// `BTreeMap` keyed by `MemberId`, so iteration order is stable.
pub type ShareMap = BTreeMap<MemberId, i64>;

/// Share distribution service.
pub struct ShareDistributor;

impl ShareDistributor {
    /// Distribute `total_minor` (already converted to the ledger currency) over
    /// the participants of `expense`.
    ///
    /// Every declared participant appears in the result, with `0` when it owes
    /// nothing. A fully-treat expense yields an empty map.
    ///
    /// # Errors
    ///
    /// - `EmptyParticipants` if the expense declares nobody
    /// - `InvalidShares` for missing or invalid share values, custom shares above
    ///   the total, or a remainder without a pool
    /// - currency errors from converting custom amounts
    pub fn distribute(
        expense: &Expense,
        total_minor: i64,
        ledger_currency: CurrencyCode,
        settings: &LedgerSettings,
    ) -> Result<ShareMap, SettlementError> {
        if expense.participants.is_empty() {
            return Err(SettlementError::EmptyParticipants);
        }
        if expense.is_treat() {
            return Ok(ShareMap::new());
        }
        if total_minor < 0 {
            return Err(SettlementError::NegativeAmount(expense.id));
        }

        let scale = settings.scale;
        let include_payer = settings.include_payer_for(expense);
        let total = FixedPointMath::to_decimal(total_minor, scale)?;

        let mut provisional: BTreeMap<MemberId, Decimal> = BTreeMap::new();
        let mut seen = BTreeSet::new();
        let mut custom_members = Vec::new();
        let mut custom_total = Decimal::ZERO;
        let mut pool: Vec<(MemberId, Decimal)> = Vec::new();

        for participant in &expense.participants {
            let member = participant.member;
            if !seen.insert(member) {
                return Err(ShareViolation::DuplicateParticipant(member).into());
            }
            provisional.insert(member, Decimal::ZERO);

            match participant.kind {
                ShareKind::Custom => {
                    let amount = participant.value.ok_or(ShareViolation::MissingShareValue {
                        member,
                        kind: ShareKind::Custom,
                    })?;
                    if amount < Decimal::ZERO {
                        return Err(ShareViolation::NegativeCustomAmount { member, amount }.into());
                    }
                    let converted = CurrencyConverter::convert(
                        amount,
                        expense.currency,
                        ledger_currency,
                        &settings.cross_currency,
                    )?;
                    custom_total = custom_total
                        .checked_add(converted)
                        .ok_or(SettlementError::AmountOutOfRange)?;
                    provisional.insert(member, converted);
                    custom_members.push(member);
                }
                ShareKind::Treat => {}
                ShareKind::Equal => {
                    if member != expense.payer || include_payer {
                        pool.push((member, Decimal::ONE));
                    }
                }
                ShareKind::Weighted => {
                    let weight = participant.value.ok_or(ShareViolation::MissingShareValue {
                        member,
                        kind: ShareKind::Weighted,
                    })?;
                    if weight <= Decimal::ZERO {
                        return Err(ShareViolation::NonPositiveWeight { member, weight }.into());
                    }
                    pool.push((member, weight));
                }
            }
        }

        // `total` is rounded to minor units; customs are held to the unrounded amount.
        let exact_total = if custom_members.is_empty() {
            total
        } else {
            CurrencyConverter::convert(
                expense.gross_amount()?,
                expense.currency,
                ledger_currency,
                &settings.cross_currency,
            )?
        };
        let epsilon = settings.custom_share_epsilon;
        if custom_total > exact_total.max(total) + epsilon {
            return Err(ShareViolation::CustomExceedsTotal {
                custom_total,
                total,
            }
            .into());
        }

        let mut remainder = (total - custom_total).max(Decimal::ZERO);
        if pool.is_empty() && (remainder <= epsilon || custom_total + epsilon >= exact_total) {
            // Customs alone cover the expense; the gap is rounding noise.
            remainder = Decimal::ZERO;
        }
        if remainder > Decimal::ZERO {
            let weight_sum = pool
                .iter()
                .try_fold(Decimal::ZERO, |acc, (_, weight)| acc.checked_add(*weight))
                .ok_or(SettlementError::AmountOutOfRange)?;
            if weight_sum <= Decimal::ZERO {
                return Err(ShareViolation::NoPoolForRemainder { remainder }.into());
            }
            for (member, weight) in &pool {
                let share = remainder
                    .checked_mul(*weight)
                    .and_then(|product| product.checked_div(weight_sum))
                    .ok_or(SettlementError::AmountOutOfRange)?;
                provisional.insert(*member, share);
            }
        }

        let mut shares = ShareMap::new();
        let mut rounded_sum: i64 = 0;
        for (member, share) in &provisional {
            let minor = FixedPointMath::to_minor_units(*share, scale)?;
            rounded_sum = rounded_sum
                .checked_add(minor)
                .ok_or(SettlementError::AmountOutOfRange)?;
            shares.insert(*member, minor);
        }

        let difference = total_minor
            .checked_sub(rounded_sum)
            .ok_or(SettlementError::AmountOutOfRange)?;
        if difference != 0 {
            // With a positive remainder every pool member holds a slice of it;
            // otherwise only custom shares carry rounding error. A pool too thin
            // to give back an over-rounded total shares the removal with customs.
            let pool_members: Vec<MemberId> = pool.iter().map(|(member, _)| *member).collect();
            let pool_capacity: i64 = pool_members
                .iter()
                .filter_map(|member| shares.get(member))
                .sum();
            let candidates = if remainder <= Decimal::ZERO {
                custom_members
            } else if difference < 0 && pool_capacity.unsigned_abs() < difference.unsigned_abs() {
                pool_members.into_iter().chain(custom_members).collect()
            } else {
                pool_members
            };
            absorb_rounding_difference(&mut shares, &candidates, expense.id, difference)?;
        }

        tracing::debug!(
            expense_id = %expense.id,
            total_minor,
            participants = shares.len(),
            rounding_difference = difference,
            "Distributed expense shares"
        );
        debug_assert_eq!(shares.values().sum::<i64>(), total_minor);

        Ok(shares)
    }
}
