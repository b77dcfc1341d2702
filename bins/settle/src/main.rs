//! Tally settlement harness.
//!
//! Reads a JSON array of expenses, settles them with the configured ledger
//! settings and prints balances and transfers as JSON on stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::{
    BalanceAggregator, Expense, LedgerProfile, NetBalances, Transfer, TransferPlanner, TreatRecord,
};
use tally_shared::config::LogFormat;
use tally_shared::types::{CurrencyCode, ExpenseId};
use tally_shared::{AppConfig, AppError, AppResult};

#[derive(Parser, Debug)]
#[command(name = "settle")]
#[command(about = "Settle a ledger of shared expenses")]
struct Cli {
    /// JSON file holding an array of expenses.
    expenses: PathBuf,

    /// Ledger currency, overriding the configured one.
    #[arg(long, env = "TALLY_LEDGER_CURRENCY")]
    ledger_currency: Option<String>,

    /// Configuration file to load instead of `config/default` + `config/$RUN_MODE`.
    #[arg(long)]
    config: Option<String>,

    /// Skip invalid expenses instead of failing the whole ledger.
    #[arg(long)]
    lenient: bool,
}

#[derive(Debug, Serialize)]
struct Output {
    ledger_currency: CurrencyCode,
    balances: NetBalances,
    transfers: Vec<Transfer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    treats: Vec<TreatRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<Skipped>,
}

#[derive(Debug, Serialize)]
struct Skipped {
    expense: ExpenseId,
    code: &'static str,
    message: String,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => return report(&err),
    };
    init_tracing(&config);

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(err.as_ref()),
    }
}

fn load_config(cli: &Cli) -> AppResult<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(code) = &cli.ledger_currency {
        config.settlement.ledger_currency.clone_from(code);
    }
    Ok(config)
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log.filter.as_str().into());
    let json = config.log.format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr)))
        .init();
}

fn run(cli: &Cli, config: &AppConfig) -> anyhow::Result<()> {
    let profile = LedgerProfile::try_from(&config.settlement)
        .map_err(|err| AppError::Config(err.to_string()))?;

    let raw = std::fs::read_to_string(&cli.expenses).map_err(AppError::from)?;
    let expenses: Vec<Expense> =
        serde_json::from_str(&raw).map_err(|err| AppError::InvalidInput(err.to_string()))?;
    info!(
        path = %cli.expenses.display(),
        expenses = expenses.len(),
        ledger_currency = %profile.ledger_currency,
        "Loaded expenses"
    );

    let (balances, skipped) = if cli.lenient {
        let lenient = BalanceAggregator::compute_net_balances_lenient(
            profile.ledger_currency,
            &expenses,
            &profile.settings,
        );
        let skipped: Vec<Skipped> = lenient
            .skipped
            .into_iter()
            .map(|s| Skipped {
                expense: s.expense,
                code: s.error.error_code(),
                message: s.error.to_string(),
            })
            .collect();
        (lenient.balances, skipped)
    } else {
        let balances = BalanceAggregator::compute_net_balances(
            profile.ledger_currency,
            &expenses,
            &profile.settings,
        )
        .map_err(|err| AppError::Settlement(format!("{err} ({})", err.error_code())))?;
        (balances, Vec::new())
    };

    let output = Output {
        ledger_currency: profile.ledger_currency,
        transfers: TransferPlanner::greedy_min_transfers(&balances),
        treats: BalanceAggregator::treat_records(&expenses),
        balances,
        skipped,
    };
    info!(
        members = output.balances.len(),
        transfers = output.transfers.len(),
        skipped = output.skipped.len(),
        "Settled ledger"
    );

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn report(err: &(dyn std::error::Error + 'static)) -> ExitCode {
    eprintln!("error: {err}");
    let code = err
        .downcast_ref::<AppError>()
        .map_or(1, AppError::exit_code);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
