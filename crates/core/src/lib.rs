//! Settlement logic for Tally.
//!
//! This crate contains pure computations with ZERO storage or transport dependencies.
//! Every function is a value-in, value-out computation: given the same expenses and
//! settings it produces byte-identical balances and transfer plans, so independent
//! peers can recompute and compare results.
//!
//! # Modules
//!
//! - `currency` - Fixed-point minor-unit math and cross-currency conversion
//! - `split` - Per-expense share distribution with deterministic rounding
//! - `balance` - Folding expenses into net member balances
//! - `transfer` - Greedy debtor/creditor transfer planning
//! - `service` - End-to-end settlement of one or many ledgers

pub mod balance;
pub mod currency;
pub mod error;
pub mod service;
pub mod settings;
pub mod split;
pub mod transfer;

pub use balance::{BalanceAggregator, BalanceReport, NetBalances, SkippedExpense, TreatRecord};
pub use currency::{CrossCurrencyRule, CurrencyConverter, FixedPointMath};
pub use error::{SettlementError, ShareViolation};
pub use service::{LedgerInput, LedgerOutcome, Settlement, SettlementService};
pub use settings::{LedgerProfile, LedgerSettings};
pub use split::{Expense, ParticipantShare, ShareDistributor, ShareKind, ShareMap};
pub use transfer::{Transfer, TransferPlanner};
