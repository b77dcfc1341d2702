//! Fixed-point money math and cross-currency conversion.

pub mod conversion;
pub mod fixed_point;


pub use conversion::{CrossCurrencyRule, CurrencyConverter};
pub use fixed_point::{FixedPointMath, MAX_SCALE};
