//! Aggregations over a payment ledger: descriptive statistics, percentiles,
//! and per-channel / per-currency summaries.

use crate::domain::catalog::Catalog;
use crate::domain::channel::ChannelKind;
use crate::domain::currency::CurrencyCode;
use crate::domain::transaction::{Transaction, TransactionStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Percentiles reported by `percentiles`.
pub const REPORTED_PERCENTILES: [u8; 7] = [10, 25, 50, 75, 90, 95, 99];

/// Window around the target amount used by `best_observed_channel`.
const SIMILAR_AMOUNT_WINDOW: Decimal = dec!(0.3);

#[derive(Debug, Serialize, PartialEq, Clone, Default)]
pub struct Statistics {
    pub count: usize,
    pub sum: Decimal,
    pub mean: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub range: Decimal,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct Percentile {
    pub percentile: u8,
    pub value: Decimal,
}

/// `total / count`, zero for an empty group. Dividing by a count never overflows.
fn mean(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

pub fn statistics(values: &[Decimal]) -> Statistics {
    let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
        return Statistics::default();
    };
    let sum: Decimal = values.iter().sum();
    let count = values.len();
    Statistics {
        count,
        sum,
        mean: sum / Decimal::from(count),
        min: *min,
        max: *max,
        range: *max - *min,
    }
}

/// Linear-interpolated percentile, `p` in `0..=100`. Empty input gives zero.
pub fn percentile(values: &[Decimal], p: Decimal) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let mut sorted = values.to_vec();
    sorted.sort();

    let last = sorted.len() - 1;
    let index = Decimal::from(last) * p.clamp(Decimal::ZERO, dec!(100)) / dec!(100);
    let lower = index.floor();
    let weight = index - lower;
    let lower_index = lower.to_usize().unwrap_or(last).min(last);

    if weight.is_zero() || lower_index == last {
        return sorted[lower_index];
    }
    sorted[lower_index] * (Decimal::ONE - weight) + sorted[lower_index + 1] * weight
}

pub fn percentiles(values: &[Decimal]) -> Vec<Percentile> {
    REPORTED_PERCENTILES
        .iter()
        .map(|&p| Percentile {
            percentile: p,
            value: percentile(values, Decimal::from(p)),
        })
        .collect()
}

/// Row filter for a ledger. Every `Some` field must match.
#[derive(Debug, Default, Clone)]
pub struct LedgerFilter {
    pub currency: Option<CurrencyCode>,
    pub channel: Option<String>,
    pub status: Option<TransactionStatus>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl LedgerFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.currency.as_ref().is_none_or(|c| *c == tx.currency)
            && self.channel.as_ref().is_none_or(|c| *c == tx.channel)
            && self.status.is_none_or(|s| s == tx.status)
            && self.min_amount.is_none_or(|min| tx.amount >= min)
            && self.max_amount.is_none_or(|max| tx.amount <= max)
            && self.start.is_none_or(|start| tx.date >= start)
            && self.end.is_none_or(|end| tx.date <= end)
    }

    pub fn apply(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|tx| self.matches(tx))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Serialize, PartialEq, Clone, Default)]
pub struct LedgerSummary {
    pub total_transactions: usize,
    pub total_amount: Decimal,
    pub total_amount_ref: Decimal,
    pub total_fee: Decimal,
    pub avg_amount: Decimal,
    pub avg_fee: Decimal,
    pub success_rate: Decimal,
    pub status_distribution: BTreeMap<TransactionStatus, usize>,
    pub currency_distribution: BTreeMap<CurrencyCode, usize>,
    pub channel_distribution: BTreeMap<String, usize>,
}

pub fn summarize(transactions: &[Transaction]) -> LedgerSummary {
    let mut summary = LedgerSummary {
        total_transactions: transactions.len(),
        ..LedgerSummary::default()
    };
    for tx in transactions {
        summary.total_amount += tx.amount;
        summary.total_amount_ref += tx.amount_ref;
        summary.total_fee += tx.fee;
        *summary.status_distribution.entry(tx.status).or_default() += 1;
        *summary
            .currency_distribution
            .entry(tx.currency.clone())
            .or_default() += 1;
        *summary
            .channel_distribution
            .entry(tx.channel.clone())
            .or_default() += 1;
    }

    let count = transactions.len();
    summary.avg_amount = mean(summary.total_amount, count);
    summary.avg_fee = mean(summary.total_fee, count);
    let completed = summary
        .status_distribution
        .get(&TransactionStatus::Completed)
        .copied()
        .unwrap_or(0);
    summary.success_rate = mean(Decimal::from(completed), count);
    summary
}

/// Aggregate figures for one group of transactions.
#[derive(Debug, Serialize, PartialEq, Clone, Default)]
pub struct GroupTotals {
    pub transaction_count: usize,
    pub total_amount: Decimal,
    pub avg_amount: Decimal,
    pub total_fee: Decimal,
    pub avg_fee: Decimal,
    pub total_amount_ref: Decimal,
    /// `total_fee / total_amount`; `None` when nothing was sent or the ratio
    /// does not fit.
    pub avg_fee_rate: Option<Decimal>,
}

impl GroupTotals {
    fn add(&mut self, tx: &Transaction) {
        self.transaction_count += 1;
        self.total_amount += tx.amount;
        self.total_fee += tx.fee;
        self.total_amount_ref += tx.amount_ref;
    }

    fn finish(mut self) -> Self {
        self.avg_amount = mean(self.total_amount, self.transaction_count);
        self.avg_fee = mean(self.total_fee, self.transaction_count);
        self.avg_fee_rate = self.total_fee.checked_div(self.total_amount);
        self
    }
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct ChannelSummary {
    pub channel_id: String,
    pub channel_name: String,
    #[serde(flatten)]
    pub totals: GroupTotals,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct CurrencySummary {
    pub currency: CurrencyCode,
    /// `None` when the catalog has no reference rate for the currency.
    pub exchange_rate: Option<Decimal>,
    #[serde(flatten)]
    pub totals: GroupTotals,
}

fn group_by<K: Ord>(
    transactions: &[Transaction],
    key: impl Fn(&Transaction) -> K,
) -> BTreeMap<K, GroupTotals> {
    let mut groups: BTreeMap<K, GroupTotals> = BTreeMap::new();
    for tx in transactions {
        groups.entry(key(tx)).or_default().add(tx);
    }
    groups
}

/// Per-channel totals, ordered by channel id.
pub fn by_channel(transactions: &[Transaction], catalog: &Catalog) -> Vec<ChannelSummary> {
    group_by(transactions, |tx| tx.channel.clone())
        .into_iter()
        .map(|(channel_id, totals)| ChannelSummary {
            channel_name: catalog.channel_name(&channel_id).to_string(),
            channel_id,
            totals: totals.finish(),
        })
        .collect()
}

/// Per-currency totals, ordered by currency code.
pub fn by_currency(transactions: &[Transaction], catalog: &Catalog) -> Vec<CurrencySummary> {
    group_by(transactions, |tx| tx.currency.clone())
        .into_iter()
        .map(|(currency, totals)| CurrencySummary {
            exchange_rate: catalog.market_rate(&currency),
            currency,
            totals: totals.finish(),
        })
        .collect()
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct VolumeRank {
    pub rank: usize,
    pub channel_id: String,
    pub channel_name: String,
    pub total_volume: Decimal,
    pub transaction_count: usize,
}

/// Channels ordered by total amount sent, largest first.
pub fn rank_by_volume(transactions: &[Transaction], catalog: &Catalog) -> Vec<VolumeRank> {
    let mut ranks: Vec<VolumeRank> = group_by(transactions, |tx| tx.channel.clone())
        .into_iter()
        .map(|(channel_id, totals)| VolumeRank {
            rank: 0,
            channel_name: catalog.channel_name(&channel_id).to_string(),
            channel_id,
            total_volume: totals.total_amount,
            transaction_count: totals.transaction_count,
        })
        .collect();

    ranks.sort_by(|a, b| b.total_volume.cmp(&a.total_volume));
    for (index, rank) in ranks.iter_mut().enumerate() {
        rank.rank = index + 1;
    }
    ranks
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct ObservedBest {
    pub channel_id: String,
    pub avg_fee_rate: Decimal,
    pub sample_count: usize,
    pub estimated_fee: Decimal,
}

/// Channel with the lowest mean fee rate among past transactions of a
/// similar size (within 30% of `target`) in `currency`.
pub fn best_observed_channel(
    transactions: &[Transaction],
    target: Decimal,
    currency: &CurrencyCode,
) -> Option<ObservedBest> {
    let filter = LedgerFilter {
        currency: Some(currency.clone()),
        min_amount: Some(target * (Decimal::ONE - SIMILAR_AMOUNT_WINDOW)),
        max_amount: Some(target * (Decimal::ONE + SIMILAR_AMOUNT_WINDOW)),
        ..LedgerFilter::default()
    };

    let mut rates: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| filter.matches(tx)) {
        let entry = rates.entry(tx.channel.as_str()).or_default();
        entry.0 += tx.fee_rate;
        entry.1 += 1;
    }

    rates
        .into_iter()
        .map(|(channel, (sum, count))| (channel, sum / Decimal::from(count), count))
        .min_by(|a, b| a.1.cmp(&b.1))
        .map(|(channel, avg_fee_rate, sample_count)| ObservedBest {
            channel_id: channel.to_string(),
            avg_fee_rate,
            sample_count,
            estimated_fee: target * avg_fee_rate,
        })
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct FeeComparison {
    pub channel_id: String,
    pub channel_name: String,
    /// `None` for channels missing from the catalog.
    pub kind: Option<ChannelKind>,
    #[serde(flatten)]
    pub totals: GroupTotals,
    /// Mean of the per-transaction `fee_rate` column.
    pub mean_fee_rate: Decimal,
    /// This channel's share of all fees paid; `None` when no fees were paid.
    pub fee_share: Option<Decimal>,
}

/// Per-channel fee figures, cheapest mean fee rate first.
pub fn fee_comparison(transactions: &[Transaction], catalog: &Catalog) -> Vec<FeeComparison> {
    let all_fees: Decimal = transactions.iter().map(|tx| tx.fee).sum();
    let mut rate_sums: BTreeMap<&str, Decimal> = BTreeMap::new();
    for tx in transactions {
        *rate_sums.entry(tx.channel.as_str()).or_default() += tx.fee_rate;
    }

    let mut rows: Vec<FeeComparison> = group_by(transactions, |tx| tx.channel.clone())
        .into_iter()
        .map(|(channel_id, totals)| {
            let totals = totals.finish();
            let rate_sum = rate_sums.get(channel_id.as_str()).copied().unwrap_or_default();
            FeeComparison {
                channel_name: catalog.channel_name(&channel_id).to_string(),
                kind: catalog.channel(&channel_id).map(|c| c.kind),
                mean_fee_rate: mean(rate_sum, totals.transaction_count),
                fee_share: totals.total_fee.checked_div(all_fees),
                totals,
                channel_id,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.mean_fee_rate.cmp(&b.mean_fee_rate));
    rows
}

fn ledger_axes(transactions: &[Transaction]) -> (Vec<String>, Vec<CurrencyCode>) {
    let channels: BTreeSet<&str> = transactions.iter().map(|tx| tx.channel.as_str()).collect();
    let currencies: BTreeSet<&CurrencyCode> = transactions.iter().map(|tx| &tx.currency).collect();
    (
        channels.into_iter().map(str::to_string).collect(),
        currencies.into_iter().cloned().collect(),
    )
}

#[derive(Debug, PartialEq, Clone)]
pub struct PivotRow {
    pub channel_id: String,
    /// One cell per entry of `AmountPivot::currencies`.
    pub amounts: Vec<Decimal>,
    pub total: Decimal,
}

/// Amount sent per channel and currency, with row and column totals.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct AmountPivot {
    pub currencies: Vec<CurrencyCode>,
    pub rows: Vec<PivotRow>,
    pub column_totals: Vec<Decimal>,
    pub grand_total: Decimal,
}

pub fn channel_currency_pivot(transactions: &[Transaction]) -> AmountPivot {
    let (channels, currencies) = ledger_axes(transactions);
    let mut cells: BTreeMap<(&str, &CurrencyCode), Decimal> = BTreeMap::new();
    for tx in transactions {
        *cells.entry((tx.channel.as_str(), &tx.currency)).or_default() += tx.amount;
    }

    let mut column_totals = vec![Decimal::ZERO; currencies.len()];
    let rows: Vec<PivotRow> = channels
        .into_iter()
        .map(|channel_id| {
            let amounts: Vec<Decimal> = currencies
                .iter()
                .map(|currency| {
                    cells
                        .get(&(channel_id.as_str(), currency))
                        .copied()
                        .unwrap_or_default()
                })
                .collect();
            for (column, amount) in column_totals.iter_mut().zip(&amounts) {
                *column += *amount;
            }
            PivotRow {
                total: amounts.iter().sum(),
                amounts,
                channel_id,
            }
        })
        .collect();

    AmountPivot {
        grand_total: column_totals.iter().sum(),
        currencies,
        rows,
        column_totals,
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct FeeRateRow {
    pub channel_id: String,
    /// Mean of `fee / amount`; `None` where the channel sent nothing in that currency.
    pub rates: Vec<Option<Decimal>>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct FeeRateMatrix {
    pub currencies: Vec<CurrencyCode>,
    pub rows: Vec<FeeRateRow>,
}

/// Mean effective fee rate per channel and currency. Zero-amount rows are ignored.
pub fn fee_rate_matrix(transactions: &[Transaction]) -> FeeRateMatrix {
    let (channels, currencies) = ledger_axes(transactions);
    let mut cells: BTreeMap<(&str, &CurrencyCode), (Decimal, usize)> = BTreeMap::new();
    for tx in transactions {
        if let Some(rate) = tx.fee.checked_div(tx.amount) {
            let cell = cells.entry((tx.channel.as_str(), &tx.currency)).or_default();
            cell.0 += rate;
            cell.1 += 1;
        }
    }

    let rows = channels
        .into_iter()
        .map(|channel_id| FeeRateRow {
            rates: currencies
                .iter()
                .map(|currency| {
                    cells
                        .get(&(channel_id.as_str(), currency))
                        .map(|&(sum, count)| mean(sum, count))
                })
                .collect(),
            channel_id,
        })
        .collect();

    FeeRateMatrix { currencies, rows }
}

/// Column used to order `top_transactions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    Amount,
    Fee,
    FeeRate,
    AmountRef,
    Date,
}

impl RankBy {
    fn compare(self, a: &Transaction, b: &Transaction) -> Ordering {
        match self {
            RankBy::Amount => a.amount.cmp(&b.amount),
            RankBy::Fee => a.fee.cmp(&b.fee),
            RankBy::FeeRate => a.fee_rate.cmp(&b.fee_rate),
            RankBy::AmountRef => a.amount_ref.cmp(&b.amount_ref),
            RankBy::Date => a.date.cmp(&b.date),
        }
    }
}

/// First `n` transactions ordered by `by`, largest first unless `ascending`.
/// Equal keys keep ledger order.
pub fn top_transactions(
    transactions: &[Transaction],
    n: usize,
    by: RankBy,
    ascending: bool,
) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    if ascending {
        sorted.sort_by(|a, b| by.compare(a, b));
    } else {
        sorted.sort_by(|a, b| by.compare(b, a));
    }
    sorted.truncate(n);
    sorted
}
