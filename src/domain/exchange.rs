use super::currency::CurrencyCode;
use super::money::{checked_mul, checked_sub};
use crate::error::{CostError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Cost of converting an amount into the reference currency at a spread.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct ExchangeResult {
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    pub amount: Decimal,
    pub market_rate: Decimal,
    pub actual_rate: Decimal,
    pub spread_rate: Decimal,
    pub market_amount: Decimal,
    pub actual_amount: Decimal,
    pub loss: Decimal,
    pub loss_percentage: Decimal,
}

impl ExchangeResult {
    /// The spread always works against the party converting away from `from`.
    ///
    /// Fails with `InvalidAmount` when a converted amount leaves `Decimal`'s range.
    pub fn compute(
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
        market_rate: Decimal,
        spread_rate: Decimal,
    ) -> Result<Self> {
        validate_spread(spread_rate)?;

        let actual_rate = checked_mul(market_rate, Decimal::ONE - spread_rate)?;
        let market_amount = checked_mul(amount, market_rate)?;
        let actual_amount = checked_mul(amount, actual_rate)?;
        let loss = checked_sub(market_amount, actual_amount)?;

        Ok(Self {
            from_currency: from,
            to_currency: to,
            amount,
            market_rate,
            actual_rate,
            spread_rate,
            market_amount,
            actual_amount,
            loss,
            loss_percentage: spread_rate * dec!(100),
        })
    }
}

pub fn validate_spread(spread_rate: Decimal) -> Result<()> {
    if spread_rate < Decimal::ZERO || spread_rate >= Decimal::ONE {
        return Err(CostError::InvalidRate(format!(
            "spread {spread_rate} outside [0, 1)"
        )));
    }
    Ok(())
}
