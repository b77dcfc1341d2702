//! Settlement error types.
//!
//! Every failure is a typed value scoped to the single expense or call that
//! triggered it. None of them are retryable: they all describe invalid input.

use rust_decimal::Decimal;
use tally_shared::types::{CurrencyCode, ExpenseId, MemberId};
use thiserror::Error;

use crate::split::ShareKind;

/// Errors that can occur while settling expenses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    // ========== Currency Errors ==========
    /// Expense currency differs from the ledger currency under a `Forbid` policy.
    #[error("Cross-currency expenses are disabled, got {0}")]
    CrossCurrencyDisabled(CurrencyCode),

    /// Fixed-rate policy has no rate for the expense currency.
    #[error("No exchange rate configured for {0}")]
    MissingExchangeRate(CurrencyCode),

    /// Configured exchange rate is zero or negative.
    #[error("Exchange rate for {0} must be positive")]
    InvalidExchangeRate(CurrencyCode),

    // ========== Share Errors ==========
    /// Participant share declarations cannot be distributed.
    #[error("Invalid shares: {0}")]
    InvalidShares(ShareViolation),

    /// Expense declares no participants.
    #[error("Expense must declare at least one participant")]
    EmptyParticipants,

    // ========== Amount Errors ==========
    /// Expense total, tip, or tax is negative.
    #[error("Expense {0} has a negative amount")]
    NegativeAmount(ExpenseId),

    /// Amount does not fit in 64-bit minor units at the working scale.
    #[error("Amount out of range for minor-unit representation")]
    AmountOutOfRange,

    /// Working scale exceeds what fixed-point math supports.
    #[error("Scale {scale} is not supported (max {max})")]
    UnsupportedScale {
        /// Requested number of decimal places.
        scale: u32,
        /// Largest supported number of decimal places.
        max: u32,
    },

    // ========== Settings Errors ==========
    /// Ledger settings could not be built from configuration.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Reasons a set of share declarations is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareViolation {
    /// Custom amounts add up to more than the expense total.
    #[error("custom shares total {custom_total} exceeds expense total {total}")]
    CustomExceedsTotal {
        /// Sum of converted custom amounts.
        custom_total: Decimal,
        /// Converted expense total.
        total: Decimal,
    },

    /// Weighted participant has a zero or negative weight.
    #[error("weight {weight} for member {member} must be positive")]
    NonPositiveWeight {
        /// Offending member.
        member: MemberId,
        /// Declared weight.
        weight: Decimal,
    },

    /// Custom amount is negative.
    #[error("custom amount {amount} for member {member} is negative")]
    NegativeCustomAmount {
        /// Offending member.
        member: MemberId,
        /// Declared amount.
        amount: Decimal,
    },

    /// Weighted or custom participant has no share value.
    #[error("member {member} declares a {kind:?} share without a value")]
    MissingShareValue {
        /// Offending member.
        member: MemberId,
        /// Declared share kind.
        kind: ShareKind,
    },

    /// Remainder is positive but nobody is in the proportional pool.
    #[error("remainder {remainder} has no participant to absorb it")]
    NoPoolForRemainder {
        /// Undistributed amount.
        remainder: Decimal,
    },

    /// The same member is declared twice on one expense.
    #[error("member {0} is declared more than once")]
    DuplicateParticipant(MemberId),

    /// No participant can take the rounding difference.
    #[error("no participant can absorb a rounding difference of {0} minor units")]
    NoRoundingCandidate(i64),
}

impl From<ShareViolation> for SettlementError {
    fn from(violation: ShareViolation) -> Self {
        Self::InvalidShares(violation)
    }
}

impl SettlementError {
    /// Returns the stable error code for machine-readable output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CrossCurrencyDisabled(_) => "CROSS_CURRENCY_DISABLED",
            Self::MissingExchangeRate(_) => "MISSING_EXCHANGE_RATE",
            Self::InvalidExchangeRate(_) => "INVALID_EXCHANGE_RATE",
            Self::InvalidShares(_) => "INVALID_SHARES",
            Self::EmptyParticipants => "EMPTY_PARTICIPANTS",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::AmountOutOfRange => "AMOUNT_OUT_OF_RANGE",
            Self::UnsupportedScale { .. } => "UNSUPPORTED_SCALE",
            Self::InvalidSettings(_) => "INVALID_SETTINGS",
        }
    }
}
