//! Deterministic assignment of per-member rounding differences.
//!
//! After every provisional share is rounded independently, the rounded sum can
//! miss the expense total by a few minor units. The difference is handed out one
//! unit at a time over candidates sorted by member id, starting at an offset
//! derived from the expense id so that the absorbing member varies from expense
//! to expense. Peers re-deriving shares must get the same result bit for bit,
//! so both the offset rule and the candidate order are part of the contract.

use tally_shared::types::{ExpenseId, MemberId};

use super::distributor::ShareMap;
use crate::error::{SettlementError, ShareViolation};

/// Starting offset into a candidate list of length `candidate_count`.
///
/// Sum of the expense id's 16 raw bytes, modulo the candidate count.
#[must_use]
pub fn rotation_offset(expense_id: ExpenseId, candidate_count: usize) -> usize {
    if candidate_count == 0 {
        return 0;
    }
    let byte_sum: usize = expense_id.as_bytes().iter().map(|b| usize::from(*b)).sum();
    byte_sum % candidate_count
}

/// Adds (`difference > 0`) or removes (`difference < 0`) one minor unit per
/// candidate until `difference` units have been applied.
///
/// Candidates are sorted by member id before the rotation is applied, so the
/// caller's ordering does not matter. A removal never takes a share below zero;
/// such candidates are skipped.
///
/// # Errors
///
/// Returns `InvalidShares(NoRoundingCandidate)` when no candidate can take the
/// difference.
pub fn absorb_rounding_difference(
    shares: &mut ShareMap,
    candidates: &[MemberId],
    expense_id: ExpenseId,
    difference: i64,
) -> Result<(), SettlementError> {
    if difference == 0 {
        return Ok(());
    }

    let mut ordered = candidates.to_vec();
    ordered.sort_unstable();
    ordered.dedup();
    if ordered.is_empty() {
        return Err(ShareViolation::NoRoundingCandidate(difference).into());
    }

    let step = difference.signum();
    let mut remaining = difference.unsigned_abs();
    let mut index = rotation_offset(expense_id, ordered.len());
    let mut skipped_in_a_row = 0;

    while remaining > 0 {
        let member = ordered[index % ordered.len()];
        let share = shares.entry(member).or_insert(0);
        if step > 0 || *share > 0 {
            *share += step;
            remaining -= 1;
            skipped_in_a_row = 0;
        } else {
            skipped_in_a_row += 1;
            if skipped_in_a_row == ordered.len() {
                return Err(ShareViolation::NoRoundingCandidate(difference).into());
            }
        }
        index += 1;
    }

    Ok(())
}
