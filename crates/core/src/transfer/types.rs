//! Transfer plan types.

use serde::{Deserialize, Serialize};
use tally_shared::types::MemberId;

/// One payment from a debtor to a creditor, in ledger minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transfer {
    /// Paying member (negative balance).
    pub from: MemberId,
    /// Receiving member (positive balance).
    pub to: MemberId,
    /// Always positive.
    pub amount: u64,
}
