//! Currency conversion into the ledger currency.
//!
//! Decimal conversion is exact (no rounding); the minor-unit variant rounds
//! exactly once, so its error is bounded to half a minor unit.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::CurrencyCode;

use super::fixed_point::FixedPointMath;
use crate::error::SettlementError;

/// Policy for expenses recorded in a currency other than the ledger currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "rates", rename_all = "snake_case")]
pub enum CrossCurrencyRule {
    /// Only ledger-currency expenses are accepted.
    #[default]
    Forbid,
    /// Static table: 1 unit of the key currency = rate units of the ledger currency.
    FixedRate(BTreeMap<CurrencyCode, Decimal>),
}

/// Converts expense amounts into the ledger currency.
pub struct CurrencyConverter;

impl CurrencyConverter {
    /// Convert a decimal amount from `from` into `ledger_currency` under `rule`.
    ///
    /// Same-currency amounts are returned unchanged regardless of the rule.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use rust_decimal_macros::dec;
    /// use tally_core::currency::{CrossCurrencyRule, CurrencyConverter};
    /// use tally_shared::types::CurrencyCode;
    ///
    /// let rule = CrossCurrencyRule::FixedRate(BTreeMap::from([(CurrencyCode::USD, dec!(0.9))]));
    /// let eur = CurrencyConverter::convert(dec!(10), CurrencyCode::USD, CurrencyCode::EUR, &rule);
    /// assert_eq!(eur.unwrap(), dec!(9.0));
    /// ```
    pub fn convert(
        amount: Decimal,
        from: CurrencyCode,
        ledger_currency: CurrencyCode,
        rule: &CrossCurrencyRule,
    ) -> Result<Decimal, SettlementError> {
        if from == ledger_currency {
            return Ok(amount);
        }

        let rate = match rule {
            CrossCurrencyRule::Forbid => return Err(SettlementError::CrossCurrencyDisabled(from)),
            CrossCurrencyRule::FixedRate(rates) => rates
                .get(&from)
                .copied()
                .ok_or(SettlementError::MissingExchangeRate(from))?,
        };
        if rate <= Decimal::ZERO {
            return Err(SettlementError::InvalidExchangeRate(from));
        }

        amount
            .checked_mul(rate)
            .ok_or(SettlementError::AmountOutOfRange)
    }

    /// Convert integer minor units from `from` into ledger minor units at `scale`.
    pub fn convert_minor_units(
        minor_units: i64,
        from: CurrencyCode,
        ledger_currency: CurrencyCode,
        rule: &CrossCurrencyRule,
        scale: u32,
    ) -> Result<i64, SettlementError> {
        let amount = FixedPointMath::to_decimal(minor_units, scale)?;
        let converted = Self::convert(amount, from, ledger_currency, rule)?;
        FixedPointMath::to_minor_units(converted, scale)
    }
}
