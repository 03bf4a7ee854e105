use super::channel::{ChannelConfig, ChannelKind};
use super::money::{checked_add, checked_mul, checked_sub};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Records which clamp, if any, overrode the computed fee.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FeeNote {
    MinimumApplied,
    MaximumApplied,
}

impl fmt::Display for FeeNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeNote::MinimumApplied => f.write_str("minimum fee applied"),
            FeeNote::MaximumApplied => f.write_str("maximum fee applied"),
        }
    }
}

/// Outcome of a fee computation for a single channel. Amounts are in the
/// transaction currency and keep full precision.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct FeeResult {
    pub channel_id: String,
    pub channel_name: String,
    pub amount: Decimal,
    pub rate: Decimal,
    pub fixed_fee: Decimal,
    /// `amount * rate + fixed_fee`, before any adjustment or clamp.
    pub calculated_fee: Decimal,
    /// Amount taken off by the channel kind's rule (bank discount, wallet cashback).
    pub adjustment: Decimal,
    pub final_fee: Decimal,
    pub note: Option<FeeNote>,
}

impl ChannelConfig {
    /// Computes the fee this channel charges on `amount`.
    ///
    /// A non-positive amount yields an all-zero result rather than an error;
    /// callers that need strict validation do it before reaching here. An
    /// amount large enough to overflow the fee arithmetic is `InvalidAmount`.
    pub fn fee(&self, amount: Decimal, use_tiered: bool) -> Result<FeeResult> {
        if amount <= Decimal::ZERO {
            return Ok(FeeResult {
                channel_id: self.id.clone(),
                channel_name: self.name.clone(),
                amount,
                rate: Decimal::ZERO,
                fixed_fee: Decimal::ZERO,
                calculated_fee: Decimal::ZERO,
                adjustment: Decimal::ZERO,
                final_fee: Decimal::ZERO,
                note: None,
            });
        }

        let rate = self.select_rate(amount, use_tiered);
        let calculated_fee = checked_add(checked_mul(amount, rate)?, self.fixed_fee)?;
        let adjustment = self.kind_adjustment(amount, calculated_fee)?;
        let (final_fee, note) = self.clamp(checked_sub(calculated_fee, adjustment)?);

        Ok(FeeResult {
            channel_id: self.id.clone(),
            channel_name: self.name.clone(),
            amount,
            rate,
            fixed_fee: self.fixed_fee,
            calculated_fee,
            adjustment,
            final_fee,
            note,
        })
    }

    fn kind_adjustment(&self, amount: Decimal, fee: Decimal) -> Result<Decimal> {
        let adjustment = match self.kind {
            ChannelKind::Bank => match &self.large_amount_discount {
                Some(discount) if amount > discount.threshold => {
                    checked_mul(fee, Decimal::ONE - discount.multiplier)?
                }
                _ => Decimal::ZERO,
            },
            ChannelKind::Wallet => match self.cashback_rate {
                Some(cashback) if cashback > Decimal::ZERO => {
                    checked_mul(amount, cashback)?.min(fee)
                }
                _ => Decimal::ZERO,
            },
            ChannelKind::Card | ChannelKind::Other => Decimal::ZERO,
        };
        Ok(adjustment)
    }

    fn clamp(&self, fee: Decimal) -> (Decimal, Option<FeeNote>) {
        if let Some(min) = self.min_fee
            && min > Decimal::ZERO
            && fee < min
        {
            return (min, Some(FeeNote::MinimumApplied));
        }
        if let Some(max) = self.max_fee
            && max > Decimal::ZERO
            && fee > max
        {
            return (max, Some(FeeNote::MaximumApplied));
        }
        (fee, None)
    }
}
