//! Conversion between decimal amounts and integer minor units.
//!
//! CRITICAL: Rounding strategy for minor units:
//! - Round half away from zero ("plain" rounding, 0.5 -> 1, -0.5 -> -1)
//! - Never truncate; out-of-range values are errors

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

use crate::error::SettlementError;

/// Largest supported number of decimal places for one minor unit.
///
/// `10^18` still fits an `i64` factor and leaves `Decimal` headroom for products.
pub const MAX_SCALE: u32 = 18;

/// Fixed-point helpers for minor-unit arithmetic.
pub struct FixedPointMath;

impl FixedPointMath {
    /// Convert a decimal amount to integer minor units at `scale`.
    ///
    /// Multiplies by `10^scale` and rounds half away from zero.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tally_core::currency::FixedPointMath;
    ///
    /// assert_eq!(FixedPointMath::to_minor_units(dec!(100.01), 2).unwrap(), 10001);
    /// assert_eq!(FixedPointMath::to_minor_units(dec!(0.005), 2).unwrap(), 1);
    /// ```
    pub fn to_minor_units(amount: Decimal, scale: u32) -> Result<i64, SettlementError> {
        let factor = Self::factor(scale)?;
        let scaled = amount
            .checked_mul(factor)
            .ok_or(SettlementError::AmountOutOfRange)?;
        scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(SettlementError::AmountOutOfRange)
    }

    /// Convert integer minor units back to a decimal amount at `scale`.
    ///
    /// Exact: the result carries `scale` fractional digits and no rounding occurs.
    pub fn to_decimal(minor_units: i64, scale: u32) -> Result<Decimal, SettlementError> {
        Self::validate_scale(scale)?;
        Decimal::try_new(minor_units, scale).map_err(|_| SettlementError::AmountOutOfRange)
    }

    /// Round a decimal to `scale` places, half away from zero.
    #[must_use]
    pub fn round(value: Decimal, scale: u32) -> Decimal {
        value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Returns `10^scale` as a decimal.
    fn factor(scale: u32) -> Result<Decimal, SettlementError> {
        Self::validate_scale(scale)?;
        Ok(Decimal::from(10_i64.pow(scale)))
    }

    fn validate_scale(scale: u32) -> Result<(), SettlementError> {
        if scale > MAX_SCALE {
            return Err(SettlementError::UnsupportedScale {
                scale,
                max: MAX_SCALE,
            });
        }
        Ok(())
    }
}
