use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use chrono::NaiveDate;
use paycost::application::analyzer::{
    LedgerFilter, RankBy, best_observed_channel, by_channel, by_currency, channel_currency_pivot,
    fee_comparison, fee_rate_matrix, percentiles, rank_by_volume, statistics, summarize,
    top_transactions,
};
use paycost::application::engine::CostEngine;
use paycost::domain::catalog::Catalog;
use paycost::domain::currency::{CurrencyCode, validate_currency};
use paycost::domain::money::Amount;
use paycost::domain::ports::CatalogSourceBox;
use paycost::domain::transaction::{Transaction, TransactionStatus};
use paycost::error::CostError;
use paycost::infrastructure::builtin::BuiltinCatalog;
use paycost::infrastructure::json_file::JsonCatalogFile;
use paycost::interfaces::csv::report_writer::ReportWriter;
use paycost::interfaces::csv::transaction_reader::TransactionReader;
use paycost::interfaces::format::{format_currency, format_percentage};
use rust_decimal::Decimal;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Channel catalog as JSON. Uses the built-in catalog when omitted.
    #[arg(long, env = "PAYCOST_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    /// Exchange spread, e.g. 0.005. Defaults to the catalog's spread.
    #[arg(long, global = true, allow_hyphen_values = true)]
    spread: Option<String>,

    /// Log filter used when PAYCOST_LOG is not set.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fee charged by one channel
    Fee {
        amount: String,
        channel: String,
        /// Ignore tiers and charge the base rate
        #[arg(long)]
        flat: bool,
    },
    /// Conversion of an amount into the reference currency
    Exchange { amount: String, currency: String },
    /// Rank channels by total cost
    Compare {
        amount: String,
        currency: String,
        #[arg(long, value_delimiter = ',')]
        channels: Option<Vec<String>>,
    },
    /// Print the cheapest channel
    Cheapest {
        amount: String,
        currency: String,
        /// Also report the channel with the lowest fee rate seen in this ledger
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// List the catalog's channels
    Channels,
    /// Summarise a ledger CSV
    Analyze {
        ledger: PathBuf,
        #[arg(long, value_enum, default_value_t = Report::Summary)]
        report: Report,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Earliest transaction date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest transaction date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, allow_hyphen_values = true)]
        min_amount: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        max_amount: Option<String>,
        /// Rows kept by `--report top`
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Column ordering `--report top`
        #[arg(long, value_enum, default_value_t = TopBy::Amount)]
        by: TopBy,
        /// Smallest first for `--report top`
        #[arg(long)]
        ascending: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Report {
    Summary,
    Channel,
    Currency,
    Volume,
    Percentiles,
    Stats,
    FeeComparison,
    Pivot,
    FeeMatrix,
    Top,
}

#[derive(Clone, Copy, ValueEnum)]
enum TopBy {
    Amount,
    Fee,
    FeeRate,
    AmountRef,
    Date,
}

impl From<TopBy> for RankBy {
    fn from(by: TopBy) -> Self {
        match by {
            TopBy::Amount => RankBy::Amount,
            TopBy::Fee => RankBy::Fee,
            TopBy::FeeRate => RankBy::FeeRate,
            TopBy::AmountRef => RankBy::AmountRef,
            TopBy::Date => RankBy::Date,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Status {
    Completed,
    Pending,
    Failed,
}

impl From<Status> for TransactionStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Completed => TransactionStatus::Completed,
            Status::Pending => TransactionStatus::Pending,
            Status::Failed => TransactionStatus::Failed,
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env("PAYCOST_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

async fn load_catalog(path: Option<PathBuf>) -> Result<Catalog> {
    let source: CatalogSourceBox = match path {
        Some(path) => Box::new(JsonCatalogFile::new(path)),
        None => Box::new(BuiltinCatalog::new()),
    };
    let catalog = source.load().await.into_diagnostic()?;
    info!(
        source = %source.describe(),
        channels = catalog.channels().len(),
        "Loaded catalog"
    );
    Ok(catalog)
}

fn parse_currency(code: &str, catalog: &Catalog) -> Result<CurrencyCode> {
    validate_currency(code, &catalog.supported_currencies()).into_diagnostic()
}

fn parse_amount(input: &str) -> Result<Decimal> {
    Ok(Amount::parse(input).into_diagnostic()?.value())
}

/// Spreads go through the rate validator, so a bad value reports `Invalid rate`.
fn parse_spread(input: &str) -> Result<Decimal> {
    Decimal::from_str(input.trim())
        .map_err(|_| CostError::InvalidRate(format!("{input} (not a number)")))
        .into_diagnostic()
}

fn read_ledger(path: &Path) -> Result<Vec<Transaction>> {
    let reader = TransactionReader::from_path(path).into_diagnostic()?;
    let mut transactions = Vec::new();
    for tx_result in reader.transactions() {
        match tx_result {
            Ok(tx) => transactions.push(tx),
            Err(e) => warn!("Error reading transaction: {}", e),
        }
    }
    Ok(transactions)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let catalog = load_catalog(cli.catalog).await?;
    let mut engine = CostEngine::new(catalog);
    if let Some(spread) = cli.spread.as_deref() {
        let spread = parse_spread(spread)?;
        engine = engine.with_spread(spread).into_diagnostic()?;
    }

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());

    match cli.command {
        Command::Fee {
            amount,
            channel,
            flat,
        } => {
            let amount = parse_amount(&amount)?;
            let fee = engine.compute_fee(amount, &channel, !flat).into_diagnostic()?;
            writer.write_fee(&fee).into_diagnostic()?;
        }
        Command::Exchange { amount, currency } => {
            let amount = parse_amount(&amount)?;
            let currency = parse_currency(&currency, engine.catalog())?;
            let exchange = engine
                .compute_exchange_cost(amount, &currency, engine.spread_rate())
                .into_diagnostic()?;
            writer.write_exchange(&exchange).into_diagnostic()?;
        }
        Command::Compare {
            amount,
            currency,
            channels,
        } => {
            let amount = parse_amount(&amount)?;
            let currency = parse_currency(&currency, engine.catalog())?;
            let entries = engine.compare(amount, &currency, channels.as_deref());
            writer.write_comparison(&entries).into_diagnostic()?;
        }
        Command::Cheapest {
            amount,
            currency,
            ledger,
        } => {
            let amount = parse_amount(&amount)?;
            let currency = parse_currency(&currency, engine.catalog())?;
            let best = engine.find_cheapest(amount, &currency).into_diagnostic()?;
            let reference = &engine.catalog().reference_currency;
            println!(
                "{} ({}): total cost {} ({}), fee {}",
                best.channel_name,
                best.channel_id,
                format_currency(best.total_cost, reference),
                format_percentage(best.total_cost_rate, 2),
                format_currency(best.fee, &currency),
            );
            if let Some(ledger) = ledger {
                let transactions = read_ledger(&ledger)?;
                match best_observed_channel(&transactions, amount, &currency) {
                    Some(observed) => println!(
                        "Observed: {} at {} over {} similar transfers, estimated fee {}",
                        observed.channel_id,
                        format_percentage(observed.avg_fee_rate, 2),
                        observed.sample_count,
                        format_currency(observed.estimated_fee, &currency),
                    ),
                    None => println!("Observed: no similar transfers in {currency}"),
                }
            }
        }
        Command::Channels => {
            writer
                .write_channels(engine.catalog().channels())
                .into_diagnostic()?;
        }
        Command::Analyze {
            ledger,
            report,
            currency,
            channel,
            status,
            from,
            to,
            min_amount,
            max_amount,
            top,
            by,
            ascending,
        } => {
            let filter = LedgerFilter {
                currency: currency
                    .as_deref()
                    .map(CurrencyCode::new)
                    .transpose()
                    .into_diagnostic()?,
                channel,
                status: status.map(TransactionStatus::from),
                min_amount: min_amount.as_deref().map(parse_amount).transpose()?,
                max_amount: max_amount.as_deref().map(parse_amount).transpose()?,
                start: from,
                end: to,
            };
            let transactions = filter.apply(&read_ledger(&ledger)?);
            info!(rows = transactions.len(), "Analyzing ledger");

            let catalog = engine.catalog();
            match report {
                Report::Summary => writer.write_summary(&summarize(&transactions)),
                Report::Channel => writer.write_channel_summaries(&by_channel(&transactions, catalog)),
                Report::Currency => {
                    writer.write_currency_summaries(&by_currency(&transactions, catalog))
                }
                Report::Volume => writer.write_volume_ranks(&rank_by_volume(&transactions, catalog)),
                Report::Percentiles => {
                    let amounts: Vec<Decimal> = transactions.iter().map(|tx| tx.amount).collect();
                    writer.write_percentiles("amount", &percentiles(&amounts))
                }
                Report::Stats => {
                    let amounts: Vec<Decimal> = transactions.iter().map(|tx| tx.amount).collect();
                    let fees: Vec<Decimal> = transactions.iter().map(|tx| tx.fee).collect();
                    writer
                        .write_statistics("amount", &statistics(&amounts))
                        .and_then(|()| writer.write_statistics("fee", &statistics(&fees)))
                }
                Report::FeeComparison => {
                    writer.write_fee_comparison(&fee_comparison(&transactions, catalog))
                }
                Report::Pivot => writer.write_pivot(&channel_currency_pivot(&transactions)),
                Report::FeeMatrix => writer.write_fee_rate_matrix(&fee_rate_matrix(&transactions)),
                Report::Top => writer.write_transactions(&top_transactions(
                    &transactions,
                    top,
                    by.into(),
                    ascending,
                )),
            }
            .into_diagnostic()?;
        }
    }

    Ok(())
}
