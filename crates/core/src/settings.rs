//! Ledger-level settlement settings.
//!
//! Settings are read-only for the duration of a call and shared freely
//! across concurrent settlements.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::config::{CrossCurrencyMode, SettlementConfig};
use tally_shared::types::CurrencyCode;

use crate::currency::{CrossCurrencyRule, MAX_SCALE};
use crate::error::SettlementError;
use crate::split::Expense;

/// Settings applied to every expense of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Ledger default for whether the payer joins the equal-split pool.
    pub include_payer: bool,
    /// Decimal places of one minor unit.
    pub scale: u32,
    /// Tolerance when custom shares are compared against the expense total.
    pub custom_share_epsilon: Decimal,
    /// Cross-currency policy.
    pub cross_currency: CrossCurrencyRule,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            include_payer: true,
            scale: 2,
            custom_share_epsilon: Decimal::new(1, 4),
            cross_currency: CrossCurrencyRule::Forbid,
        }
    }
}

impl LedgerSettings {
    /// Effective include-payer flag: the expense override wins over the ledger default.
    #[must_use]
    pub fn include_payer_for(&self, expense: &Expense) -> bool {
        expense.include_payer.unwrap_or(self.include_payer)
    }
}

/// Ledger currency together with its validated settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerProfile {
    /// Currency all balances are expressed in.
    pub ledger_currency: CurrencyCode,
    /// Settings applied to every expense.
    pub settings: LedgerSettings,
}

impl TryFrom<&SettlementConfig> for LedgerProfile {
    type Error = SettlementError;

    fn try_from(config: &SettlementConfig) -> Result<Self, Self::Error> {
        let ledger_currency: CurrencyCode = config
            .ledger_currency
            .parse()
            .map_err(|err| SettlementError::InvalidSettings(format!("ledger_currency: {err}")))?;

        if config.scale > MAX_SCALE {
            return Err(SettlementError::UnsupportedScale {
                scale: config.scale,
                max: MAX_SCALE,
            });
        }
        if config.custom_share_epsilon < Decimal::ZERO {
            return Err(SettlementError::InvalidSettings(
                "custom_share_epsilon must not be negative".to_string(),
            ));
        }

        let cross_currency = match config.cross_currency.mode {
            CrossCurrencyMode::Forbid => CrossCurrencyRule::Forbid,
            CrossCurrencyMode::FixedRate => {
                let mut rates = BTreeMap::new();
                for (code, rate) in &config.cross_currency.rates {
                    let currency: CurrencyCode = code.parse().map_err(|err| {
                        SettlementError::InvalidSettings(format!("cross_currency.rates: {err}"))
                    })?;
                    if *rate <= Decimal::ZERO {
                        return Err(SettlementError::InvalidExchangeRate(currency));
                    }
                    rates.insert(currency, *rate);
                }
                CrossCurrencyRule::FixedRate(rates)
            }
        };

        Ok(Self {
            ledger_currency,
            settings: LedgerSettings {
                include_payer: config.include_payer,
                scale: config.scale,
                custom_share_epsilon: config.custom_share_epsilon,
                cross_currency,
            },
        })
    }
}
