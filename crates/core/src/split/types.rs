//! Expense and participant share declarations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{CurrencyCode, ExpenseId, MemberId};

use crate::error::SettlementError;

/// How a participant takes part in an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    /// Equal slice of the remainder after custom shares ("AA").
    #[serde(alias = "aa")]
    Equal,
    /// Slice of the remainder proportional to a positive weight.
    Weighted,
    /// Fixed amount in the expense currency.
    Custom,
    /// Someone else is treating; settlement-neutral.
    Treat,
}

/// One participant declaration on an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantShare {
    /// Participating member.
    pub member: MemberId,
    /// Share kind.
    pub kind: ShareKind,
    /// Weight for `Weighted`, amount for `Custom`, ignored otherwise.
    #[serde(default)]
    pub value: Option<Decimal>,
}

impl ParticipantShare {
    /// Equal-split participant.
    #[must_use]
    pub const fn equal(member: MemberId) -> Self {
        Self {
            member,
            kind: ShareKind::Equal,
            value: None,
        }
    }

    /// Weighted participant.
    #[must_use]
    pub const fn weighted(member: MemberId, weight: Decimal) -> Self {
        Self {
            member,
            kind: ShareKind::Weighted,
            value: Some(weight),
        }
    }

    /// Participant owing a fixed amount in the expense currency.
    #[must_use]
    pub const fn custom(member: MemberId, amount: Decimal) -> Self {
        Self {
            member,
            kind: ShareKind::Custom,
            value: Some(amount),
        }
    }

    /// Participant being treated.
    #[must_use]
    pub const fn treat(member: MemberId) -> Self {
        Self {
            member,
            kind: ShareKind::Treat,
            value: None,
        }
    }
}

/// A recorded expense, paid by one member and shared among participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense identifier; also the rounding tie-break key.
    pub id: ExpenseId,
    /// Member who paid.
    pub payer: MemberId,
    /// Base amount in the expense currency.
    pub amount: Decimal,
    /// Currency the expense was paid in.
    pub currency: CurrencyCode,
    /// Tip added on top of the base amount.
    #[serde(default)]
    pub tip: Option<Decimal>,
    /// Tax added on top of the base amount.
    #[serde(default)]
    pub tax: Option<Decimal>,
    /// Participant share declarations.
    pub participants: Vec<ParticipantShare>,
    /// Per-expense override of the ledger include-payer default.
    #[serde(default)]
    pub include_payer: Option<bool>,
}

impl Expense {
    /// Creates an expense with no add-ons and no include-payer override.
    #[must_use]
    pub fn new(
        id: ExpenseId,
        payer: MemberId,
        amount: Decimal,
        currency: CurrencyCode,
        participants: Vec<ParticipantShare>,
    ) -> Self {
        Self {
            id,
            payer,
            amount,
            currency,
            tip: None,
            tax: None,
            participants,
            include_payer: None,
        }
    }

    /// Sets the tip add-on.
    #[must_use]
    pub fn with_tip(mut self, tip: Decimal) -> Self {
        self.tip = Some(tip);
        self
    }

    /// Sets the tax add-on.
    #[must_use]
    pub fn with_tax(mut self, tax: Decimal) -> Self {
        self.tax = Some(tax);
        self
    }

    /// Overrides the ledger include-payer default for this expense.
    #[must_use]
    pub fn with_include_payer(mut self, include_payer: bool) -> Self {
        self.include_payer = Some(include_payer);
        self
    }

    /// True when every participant is `Treat`: a record-only, balance-neutral expense.
    #[must_use]
    pub fn is_treat(&self) -> bool {
        !self.participants.is_empty()
            && self
                .participants
                .iter()
                .all(|p| p.kind == ShareKind::Treat)
    }

    /// Base amount plus tip and tax, in the expense currency.
    pub fn gross_amount(&self) -> Result<Decimal, SettlementError> {
        let parts = [Some(self.amount), self.tip, self.tax];
        let mut gross = Decimal::ZERO;
        for part in parts.into_iter().flatten() {
            if part < Decimal::ZERO {
                return Err(SettlementError::NegativeAmount(self.id));
            }
            gross = gross
                .checked_add(part)
                .ok_or(SettlementError::AmountOutOfRange)?;
        }
        Ok(gross)
    }
}
