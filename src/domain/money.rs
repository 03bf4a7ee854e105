use crate::error::{CostError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest amount accepted at the boundary. Keeps every product the engine
/// forms (amount × rate × exchange rate) well inside `Decimal`'s range.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Finest precision accepted at the boundary.
pub const MAX_AMOUNT_SCALE: u32 = 8;

/// A validated, non-negative monetary amount supplied by a caller.
///
/// This is the boundary type: anything that reaches the cost engine from the
/// outside world goes through `Amount::new` or `Amount::parse` first. Values
/// lie in `0..=MAX_AMOUNT` with at most `MAX_AMOUNT_SCALE` decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO {
            return Err(CostError::InvalidAmount(format!(
                "{value} (amount cannot be negative)"
            )));
        }
        if value > MAX_AMOUNT {
            return Err(CostError::InvalidAmount(format!(
                "{value} (amount cannot exceed {MAX_AMOUNT})"
            )));
        }
        if value.normalize().scale() > MAX_AMOUNT_SCALE {
            return Err(CostError::InvalidAmount(format!(
                "{value} (at most {MAX_AMOUNT_SCALE} decimal places)"
            )));
        }
        Ok(Self(value))
    }

    /// Parses user input such as `"1000"` or `" 12.50 "`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let value = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|e| CostError::InvalidAmount(format!("{input:?} ({e})")))?;
        Self::new(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = CostError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

fn out_of_range(lhs: Decimal, op: char, rhs: Decimal) -> CostError {
    CostError::InvalidAmount(format!("{lhs} {op} {rhs} is out of range"))
}

pub fn checked_mul(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_mul(rhs).ok_or_else(|| out_of_range(lhs, '*', rhs))
}

pub fn checked_add(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_add(rhs).ok_or_else(|| out_of_range(lhs, '+', rhs))
}

pub fn checked_sub(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_sub(rhs).ok_or_else(|| out_of_range(lhs, '-', rhs))
}

/// Rounds `value` to `places` decimals and pins the scale so `10` renders as `10.00`.
pub fn round_fixed(value: Decimal, places: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(places);
    rounded
}

/// Division that yields zero on a zero denominator and an error when the
/// quotient does not fit.
pub fn safe_divide(numerator: Decimal, denominator: Decimal) -> Result<Decimal> {
    if denominator.is_zero() {
        return Ok(Decimal::ZERO);
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| out_of_range(numerator, '/', denominator))
}
