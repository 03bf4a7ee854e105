use crate::domain::catalog::Catalog;
use crate::domain::currency::CurrencyCode;
use crate::domain::exchange::{ExchangeResult, validate_spread};
use crate::domain::fee::FeeResult;
use crate::domain::money::{checked_add, checked_mul, safe_divide};
use crate::error::{CostError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Full cost of sending `amount` through one channel, expressed in the
/// catalog's reference currency.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct TotalCost {
    pub channel_id: String,
    pub currency: CurrencyCode,
    pub amount: Decimal,
    /// In the transaction currency.
    pub fee: Decimal,
    pub fee_rate: Decimal,
    pub exchange_loss: Decimal,
    pub amount_ref: Decimal,
    pub total_cost: Decimal,
    pub total_cost_rate: Decimal,
}

/// One row of a channel comparison. `rank` 1 is the cheapest.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct ComparisonEntry {
    pub rank: usize,
    pub channel_id: String,
    pub channel_name: String,
    pub fee: Decimal,
    pub exchange_loss: Decimal,
    pub total_cost: Decimal,
    pub total_cost_rate: Decimal,
}

/// Computes fees, exchange costs and channel rankings against a catalog.
///
/// `CostEngine` holds nothing but immutable configuration, so a single
/// instance can be shared freely between callers.
#[derive(Debug, Clone)]
pub struct CostEngine {
    catalog: Catalog,
    spread_rate: Decimal,
}

impl CostEngine {
    /// Creates an engine using the catalog's default spread.
    pub fn new(catalog: Catalog) -> Self {
        let spread_rate = catalog.default_spread_rate;
        Self {
            catalog,
            spread_rate,
        }
    }

    /// Overrides the spread applied by `total_cost` and `compare`.
    pub fn with_spread(mut self, spread_rate: Decimal) -> Result<Self> {
        validate_spread(spread_rate)?;
        self.spread_rate = spread_rate;
        Ok(self)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn spread_rate(&self) -> Decimal {
        self.spread_rate
    }

    /// Fee charged by `channel_id` on `amount`, in the transaction currency.
    pub fn compute_fee(
        &self,
        amount: Decimal,
        channel_id: &str,
        use_tiered: bool,
    ) -> Result<FeeResult> {
        let channel = self
            .catalog
            .channel(channel_id)
            .ok_or_else(|| CostError::UnknownChannel(channel_id.to_string()))?;
        if !channel.active {
            return Err(CostError::InactiveChannel(channel_id.to_string()));
        }
        channel.fee(amount, use_tiered)
    }

    /// Conversion of `amount` from `from_currency` into the reference currency.
    pub fn compute_exchange_cost(
        &self,
        amount: Decimal,
        from_currency: &CurrencyCode,
        spread_rate: Decimal,
    ) -> Result<ExchangeResult> {
        let market_rate = self
            .catalog
            .market_rate(from_currency)
            .ok_or_else(|| CostError::UnsupportedCurrency(from_currency.to_string()))?;
        ExchangeResult::compute(
            amount,
            from_currency.clone(),
            self.catalog.reference_currency.clone(),
            market_rate,
            spread_rate,
        )
    }

    /// Fee plus exchange loss for a single channel.
    ///
    /// Amounts too large or too fine for the cost arithmetic are `InvalidAmount`.
    pub fn total_cost(
        &self,
        amount: Decimal,
        currency: &CurrencyCode,
        channel_id: &str,
    ) -> Result<TotalCost> {
        let fee = self.compute_fee(amount, channel_id, true)?;

        let (exchange_loss, amount_ref, total_cost) =
            if *currency == self.catalog.reference_currency {
                (Decimal::ZERO, amount, fee.final_fee)
            } else {
                let exchange = self.compute_exchange_cost(amount, currency, self.spread_rate)?;
                let fee_ref = checked_mul(fee.final_fee, exchange.actual_rate)?;
                (
                    exchange.loss,
                    exchange.actual_amount,
                    checked_add(fee_ref, exchange.loss)?,
                )
            };

        Ok(TotalCost {
            channel_id: channel_id.to_string(),
            currency: currency.clone(),
            amount,
            fee: fee.final_fee,
            fee_rate: fee.rate,
            exchange_loss,
            amount_ref,
            total_cost,
            total_cost_rate: safe_divide(total_cost, amount_ref)?,
        })
    }

    /// Ranks channels by total cost for sending `amount` in `currency`.
    ///
    /// `channel_ids` defaults to the whole catalog, in catalog order. Channels
    /// that are unknown, do not handle the currency, or fail to price are
    /// left out. Ties keep their input order.
    pub fn compare(
        &self,
        amount: Decimal,
        currency: &CurrencyCode,
        channel_ids: Option<&[String]>,
    ) -> Vec<ComparisonEntry> {
        let default_ids;
        let ids = match channel_ids {
            Some(ids) => ids,
            None => {
                default_ids = self.catalog.channel_ids();
                default_ids.as_slice()
            }
        };

        let mut entries: Vec<ComparisonEntry> = ids
            .iter()
            .filter_map(|id| {
                let channel = self.catalog.channel(id)?;
                if !channel.supports(currency) {
                    debug!(channel = %id, %currency, "Skipping channel: currency not supported");
                    return None;
                }
                match self.total_cost(amount, currency, id) {
                    Ok(cost) => Some(ComparisonEntry {
                        rank: 0,
                        channel_id: cost.channel_id,
                        channel_name: channel.name.clone(),
                        fee: cost.fee,
                        exchange_loss: cost.exchange_loss,
                        total_cost: cost.total_cost,
                        total_cost_rate: cost.total_cost_rate,
                    }),
                    Err(e) => {
                        debug!(channel = %id, error = %e, "Skipping channel");
                        None
                    }
                }
            })
            .collect();

        entries.sort_by(|a, b| a.total_cost.cmp(&b.total_cost));
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.rank = index + 1;
        }
        entries
    }

    /// The cheapest channel across the whole catalog.
    pub fn find_cheapest(&self, amount: Decimal, currency: &CurrencyCode) -> Result<ComparisonEntry> {
        self.compare(amount, currency, None)
            .into_iter()
            .next()
            .ok_or_else(|| {
                CostError::NotFound(format!("no active channel supports {currency}"))
            })
    }
}
