use crate::application::analyzer::{
    AmountPivot, ChannelSummary, CurrencySummary, FeeComparison, FeeRateMatrix, LedgerSummary,
    Percentile, Statistics, VolumeRank,
};
use crate::application::engine::ComparisonEntry;
use crate::domain::channel::ChannelConfig;
use crate::domain::exchange::ExchangeResult;
use crate::domain::fee::FeeResult;
use crate::domain::money::round_fixed;
use crate::domain::transaction::Transaction;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

const MONEY_PLACES: u32 = 2;
const RATE_PLACES: u32 = 4;

fn money(value: Decimal) -> Decimal {
    round_fixed(value, MONEY_PLACES)
}

fn rate(value: Decimal) -> Decimal {
    round_fixed(value, RATE_PLACES)
}

#[derive(Serialize)]
struct ComparisonRow<'a> {
    rank: usize,
    channel_id: &'a str,
    channel_name: &'a str,
    fee: Decimal,
    exchange_loss: Decimal,
    total_cost: Decimal,
    total_cost_rate: Decimal,
}

#[derive(Serialize)]
struct FeeRow<'a> {
    channel_id: &'a str,
    channel_name: &'a str,
    amount: Decimal,
    rate: Decimal,
    fixed_fee: Decimal,
    calculated_fee: Decimal,
    adjustment: Decimal,
    final_fee: Decimal,
    note: String,
}

#[derive(Serialize)]
struct ExchangeRow<'a> {
    from_currency: &'a str,
    to_currency: &'a str,
    amount: Decimal,
    market_rate: Decimal,
    actual_rate: Decimal,
    market_amount: Decimal,
    actual_amount: Decimal,
    loss: Decimal,
    loss_percentage: Decimal,
}

#[derive(Serialize)]
struct ChannelRow<'a> {
    id: &'a str,
    name: &'a str,
    kind: String,
    base_rate: Decimal,
    fixed_fee: Decimal,
    tiers: usize,
    currencies: String,
    active: bool,
    processing_days: Option<u32>,
}

#[derive(Serialize)]
struct ChannelSummaryRow<'a> {
    channel_id: &'a str,
    channel_name: &'a str,
    transaction_count: usize,
    total_amount: Decimal,
    avg_amount: Decimal,
    total_fee: Decimal,
    avg_fee: Decimal,
    total_amount_ref: Decimal,
    avg_fee_rate: Option<Decimal>,
}

#[derive(Serialize)]
struct CurrencySummaryRow<'a> {
    currency: &'a str,
    exchange_rate: Option<Decimal>,
    transaction_count: usize,
    total_amount: Decimal,
    avg_amount: Decimal,
    total_fee: Decimal,
    avg_fee: Decimal,
    total_amount_ref: Decimal,
    avg_fee_rate: Option<Decimal>,
}

#[derive(Serialize)]
struct FeeComparisonRow<'a> {
    channel_id: &'a str,
    channel_name: &'a str,
    channel_type: String,
    transaction_count: usize,
    total_amount: Decimal,
    total_fee: Decimal,
    avg_fee: Decimal,
    avg_fee_rate: Decimal,
    fee_share: Option<Decimal>,
}

#[derive(Serialize)]
struct VolumeRow<'a> {
    rank: usize,
    channel_id: &'a str,
    channel_name: &'a str,
    total_volume: Decimal,
    transaction_count: usize,
}

#[derive(Serialize)]
struct MetricRow {
    metric: String,
    value: String,
}

/// Writes engine and analyzer results as CSV, one header row per report.
///
/// Money is rounded to cents and rates to four decimals on the way out; the
/// values handed in keep full precision.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_comparison(&mut self, entries: &[ComparisonEntry]) -> Result<()> {
        for entry in entries {
            self.writer.serialize(ComparisonRow {
                rank: entry.rank,
                channel_id: &entry.channel_id,
                channel_name: &entry.channel_name,
                fee: money(entry.fee),
                exchange_loss: money(entry.exchange_loss),
                total_cost: money(entry.total_cost),
                total_cost_rate: rate(entry.total_cost_rate),
            })?;
        }
        self.finish()
    }

    pub fn write_fee(&mut self, fee: &FeeResult) -> Result<()> {
        self.writer.serialize(FeeRow {
            channel_id: &fee.channel_id,
            channel_name: &fee.channel_name,
            amount: money(fee.amount),
            rate: rate(fee.rate),
            fixed_fee: money(fee.fixed_fee),
            calculated_fee: money(fee.calculated_fee),
            adjustment: money(fee.adjustment),
            final_fee: money(fee.final_fee),
            note: fee.note.map(|n| n.to_string()).unwrap_or_default(),
        })?;
        self.finish()
    }

    pub fn write_exchange(&mut self, exchange: &ExchangeResult) -> Result<()> {
        self.writer.serialize(ExchangeRow {
            from_currency: exchange.from_currency.as_str(),
            to_currency: exchange.to_currency.as_str(),
            amount: money(exchange.amount),
            market_rate: exchange.market_rate,
            actual_rate: exchange.actual_rate.normalize(),
            market_amount: money(exchange.market_amount),
            actual_amount: money(exchange.actual_amount),
            loss: money(exchange.loss),
            loss_percentage: money(exchange.loss_percentage),
        })?;
        self.finish()
    }

    pub fn write_channels(&mut self, channels: &[ChannelConfig]) -> Result<()> {
        for channel in channels {
            self.writer.serialize(ChannelRow {
                id: &channel.id,
                name: &channel.name,
                kind: channel.kind.to_string(),
                base_rate: channel.base_rate,
                fixed_fee: money(channel.fixed_fee),
                tiers: channel.tiers.len(),
                currencies: channel
                    .supported_currencies
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                active: channel.active,
                processing_days: channel.processing_days,
            })?;
        }
        self.finish()
    }

    pub fn write_channel_summaries(&mut self, summaries: &[ChannelSummary]) -> Result<()> {
        for summary in summaries {
            let totals = &summary.totals;
            self.writer.serialize(ChannelSummaryRow {
                channel_id: &summary.channel_id,
                channel_name: &summary.channel_name,
                transaction_count: totals.transaction_count,
                total_amount: money(totals.total_amount),
                avg_amount: money(totals.avg_amount),
                total_fee: money(totals.total_fee),
                avg_fee: money(totals.avg_fee),
                total_amount_ref: money(totals.total_amount_ref),
                avg_fee_rate: totals.avg_fee_rate.map(rate),
            })?;
        }
        self.finish()
    }

    pub fn write_currency_summaries(&mut self, summaries: &[CurrencySummary]) -> Result<()> {
        for summary in summaries {
            let totals = &summary.totals;
            self.writer.serialize(CurrencySummaryRow {
                currency: summary.currency.as_str(),
                exchange_rate: summary.exchange_rate,
                transaction_count: totals.transaction_count,
                total_amount: money(totals.total_amount),
                avg_amount: money(totals.avg_amount),
                total_fee: money(totals.total_fee),
                avg_fee: money(totals.avg_fee),
                total_amount_ref: money(totals.total_amount_ref),
                avg_fee_rate: totals.avg_fee_rate.map(rate),
            })?;
        }
        self.finish()
    }

    pub fn write_volume_ranks(&mut self, ranks: &[VolumeRank]) -> Result<()> {
        for rank in ranks {
            self.writer.serialize(VolumeRow {
                rank: rank.rank,
                channel_id: &rank.channel_id,
                channel_name: &rank.channel_name,
                total_volume: money(rank.total_volume),
                transaction_count: rank.transaction_count,
            })?;
        }
        self.finish()
    }

    pub fn write_fee_comparison(&mut self, rows: &[FeeComparison]) -> Result<()> {
        for row in rows {
            self.writer.serialize(FeeComparisonRow {
                channel_id: &row.channel_id,
                channel_name: &row.channel_name,
                channel_type: row
                    .kind
                    .map(|kind| kind.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                transaction_count: row.totals.transaction_count,
                total_amount: money(row.totals.total_amount),
                total_fee: money(row.totals.total_fee),
                avg_fee: money(row.totals.avg_fee),
                avg_fee_rate: rate(row.mean_fee_rate),
                fee_share: row.fee_share.map(rate),
            })?;
        }
        self.finish()
    }

    /// Channels down, currencies across, with a `total` column and row.
    pub fn write_pivot(&mut self, pivot: &AmountPivot) -> Result<()> {
        let mut header = vec!["channel_id".to_string()];
        header.extend(pivot.currencies.iter().map(|c| c.to_string()));
        header.push("total".to_string());
        self.writer.write_record(&header)?;

        for row in &pivot.rows {
            let mut record = vec![row.channel_id.clone()];
            record.extend(row.amounts.iter().map(|&amount| money(amount).to_string()));
            record.push(money(row.total).to_string());
            self.writer.write_record(&record)?;
        }

        let mut totals = vec!["total".to_string()];
        totals.extend(pivot.column_totals.iter().map(|&amount| money(amount).to_string()));
        totals.push(money(pivot.grand_total).to_string());
        self.writer.write_record(&totals)?;
        self.finish()
    }

    /// Empty cells mark channel and currency pairs with no priced transfers.
    pub fn write_fee_rate_matrix(&mut self, matrix: &FeeRateMatrix) -> Result<()> {
        let mut header = vec!["channel_id".to_string()];
        header.extend(matrix.currencies.iter().map(|c| c.to_string()));
        self.writer.write_record(&header)?;

        for row in &matrix.rows {
            let mut record = vec![row.channel_id.clone()];
            record.extend(
                row.rates
                    .iter()
                    .map(|cell| cell.map(|r| rate(r).to_string()).unwrap_or_default()),
            );
            self.writer.write_record(&record)?;
        }
        self.finish()
    }

    /// Ledger rows in the same layout they are read in.
    pub fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        for tx in transactions {
            self.writer.serialize(tx)?;
        }
        self.finish()
    }

    pub fn write_percentiles(&mut self, column: &str, points: &[Percentile]) -> Result<()> {
        self.writer.write_record(["column", "percentile", "value"])?;
        for point in points {
            self.writer.write_record([
                column.to_string(),
                format!("p{}", point.percentile),
                money(point.value).to_string(),
            ])?;
        }
        self.finish()
    }

    pub fn write_statistics(&mut self, column: &str, stats: &Statistics) -> Result<()> {
        let rows = [
            metric(&format!("{column}:count"), stats.count),
            metric(&format!("{column}:sum"), money(stats.sum)),
            metric(&format!("{column}:mean"), money(stats.mean)),
            metric(&format!("{column}:min"), money(stats.min)),
            metric(&format!("{column}:max"), money(stats.max)),
            metric(&format!("{column}:range"), money(stats.range)),
        ];
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.finish()
    }

    /// Flattens a ledger summary into `metric,value` rows.
    pub fn write_summary(&mut self, summary: &LedgerSummary) -> Result<()> {
        let mut rows = vec![
            metric("total_transactions", summary.total_transactions),
            metric("total_amount", money(summary.total_amount)),
            metric("total_amount_ref", money(summary.total_amount_ref)),
            metric("total_fee", money(summary.total_fee)),
            metric("avg_amount", money(summary.avg_amount)),
            metric("avg_fee", money(summary.avg_fee)),
            metric("success_rate", rate(summary.success_rate)),
        ];
        rows.extend(
            summary
                .status_distribution
                .iter()
                .map(|(status, count)| metric(&format!("status:{status}"), count)),
        );
        rows.extend(
            summary
                .currency_distribution
                .iter()
                .map(|(currency, count)| metric(&format!("currency:{currency}"), count)),
        );
        rows.extend(
            summary
                .channel_distribution
                .iter()
                .map(|(channel, count)| metric(&format!("channel:{channel}"), count)),
        );
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn metric(name: &str, value: impl ToString) -> MetricRow {
    MetricRow {
        metric: name.to_string(),
        value: value.to_string(),
    }
}
