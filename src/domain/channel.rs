use super::currency::CurrencyCode;
use crate::error::{CostError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Bank,
    Wallet,
    Card,
    Other,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::Bank => "bank",
            ChannelKind::Wallet => "wallet",
            ChannelKind::Card => "card",
            ChannelKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// One bracket of a tiered rate schedule.
///
/// `max_amount` is inclusive. `None` marks the open-ended top bracket.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct RateTier {
    #[serde(default)]
    pub max_amount: Option<Decimal>,
    pub rate: Decimal,
}

impl RateTier {
    pub fn covers(&self, amount: Decimal) -> bool {
        self.max_amount.is_none_or(|bound| amount <= bound)
    }
}

/// Bank rule: amounts strictly above `threshold` have their fee scaled by `multiplier`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LargeAmountDiscount {
    pub threshold: Decimal,
    pub multiplier: Decimal,
}

/// Static description of a payment channel. Loaded once, never mutated.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ChannelConfig {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    pub base_rate: Decimal,
    #[serde(default)]
    pub fixed_fee: Decimal,
    #[serde(default)]
    pub min_fee: Option<Decimal>,
    #[serde(default)]
    pub max_fee: Option<Decimal>,
    /// Ascending by bound.
    #[serde(default)]
    pub tiers: Vec<RateTier>,
    pub supported_currencies: BTreeSet<CurrencyCode>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub processing_days: Option<u32>,
    #[serde(default)]
    pub large_amount_discount: Option<LargeAmountDiscount>,
    #[serde(default)]
    pub cashback_rate: Option<Decimal>,
}

fn default_active() -> bool {
    true
}

impl ChannelConfig {
    pub fn supports(&self, currency: &CurrencyCode) -> bool {
        self.supported_currencies.contains(currency)
    }

    /// Picks the rate applicable to `amount`.
    ///
    /// With tiers enabled, the first tier whose bound covers the amount wins;
    /// past every bound the last tier still applies. Without tiers the base
    /// rate is used.
    pub fn select_rate(&self, amount: Decimal, use_tiered: bool) -> Decimal {
        if !use_tiered || self.tiers.is_empty() {
            return self.base_rate;
        }
        self.tiers
            .iter()
            .find(|tier| tier.covers(amount))
            .or_else(|| self.tiers.last())
            .map_or(self.base_rate, |tier| tier.rate)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| {
            Err(CostError::InvalidCatalog(format!(
                "channel {}: {reason}",
                self.id
            )))
        };

        if self.id.trim().is_empty() {
            return Err(CostError::InvalidCatalog(
                "channel id must not be empty".to_string(),
            ));
        }
        if !is_fraction(self.base_rate) {
            return invalid(format!("base rate {} outside [0, 1)", self.base_rate));
        }
        if self.fixed_fee < Decimal::ZERO {
            return invalid(format!("fixed fee {} is negative", self.fixed_fee));
        }
        if let (Some(min), Some(max)) = (self.min_fee, self.max_fee)
            && min > Decimal::ZERO
            && max > Decimal::ZERO
            && min > max
        {
            return invalid(format!("minimum fee {min} exceeds maximum fee {max}"));
        }

        let mut previous: Option<Decimal> = None;
        for (index, tier) in self.tiers.iter().enumerate() {
            if !is_fraction(tier.rate) {
                return invalid(format!("tier rate {} outside [0, 1)", tier.rate));
            }
            match tier.max_amount {
                Some(bound) => {
                    if previous.is_some_and(|p| bound <= p) {
                        return invalid("tiers must be strictly ascending".to_string());
                    }
                    previous = Some(bound);
                }
                None if index + 1 != self.tiers.len() => {
                    return invalid("only the last tier may be unbounded".to_string());
                }
                None => {}
            }
        }

        if let Some(discount) = &self.large_amount_discount
            && (discount.multiplier <= Decimal::ZERO || discount.multiplier > Decimal::ONE)
        {
            return invalid(format!(
                "discount multiplier {} outside (0, 1]",
                discount.multiplier
            ));
        }
        if let Some(cashback) = self.cashback_rate
            && !is_fraction(cashback)
        {
            return invalid(format!("cashback rate {cashback} outside [0, 1)"));
        }
        Ok(())
    }
}

fn is_fraction(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate < Decimal::ONE
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn plain_channel(base_rate: Decimal) -> ChannelConfig {
        ChannelConfig {
            id: "plain".to_string(),
            name: "Plain".to_string(),
            kind: ChannelKind::Other,
            base_rate,
            fixed_fee: Decimal::ZERO,
            min_fee: None,
            max_fee: None,
            tiers: Vec::new(),
            supported_currencies: ["USD", "EUR"]
                .iter()
                .map(|c| CurrencyCode::new(c).unwrap())
                .collect(),
            active: true,
            processing_days: None,
            large_amount_discount: None,
            cashback_rate: None,
        }
    }

    pub(crate) fn bank_transfer_tiers() -> Vec<RateTier> {
        vec![
            RateTier { max_amount: Some(dec!(10000)), rate: dec!(0.015) },
            RateTier { max_amount: Some(dec!(50000)), rate: dec!(0.012) },
            RateTier { max_amount: Some(dec!(100000)), rate: dec!(0.010) },
            RateTier { max_amount: None, rate: dec!(0.008) },
        ]
    }

    #[test]
    fn test_select_rate_boundary_is_inclusive() {
        let mut channel = plain_channel(dec!(0.02));
        channel.tiers = bank_transfer_tiers();

        assert_eq!(channel.select_rate(dec!(10000), true), dec!(0.015));
        assert_eq!(channel.select_rate(dec!(10000.01), true), dec!(0.012));
        assert_eq!(channel.select_rate(dec!(75000), true), dec!(0.010));
        assert_eq!(channel.select_rate(dec!(5000000), true), dec!(0.008));
    }

    #[test]
    fn test_select_rate_falls_back_to_last_tier() {
        let mut channel = plain_channel(dec!(0.02));
        channel.tiers = vec![
            RateTier { max_amount: Some(dec!(100)), rate: dec!(0.03) },
            RateTier { max_amount: Some(dec!(1000)), rate: dec!(0.01) },
        ];
        assert_eq!(channel.select_rate(dec!(5000), true), dec!(0.01));
    }

    #[test]
    fn test_select_rate_without_tiers_uses_base() {
        let mut channel = plain_channel(dec!(0.02));
        assert_eq!(channel.select_rate(dec!(500), true), dec!(0.02));

        channel.tiers = bank_transfer_tiers();
        assert_eq!(channel.select_rate(dec!(500), false), dec!(0.02));
    }

    #[test]
    fn test_validate_rejects_descending_tiers() {
        let mut channel = plain_channel(dec!(0.02));
        channel.tiers = vec![
            RateTier { max_amount: Some(dec!(1000)), rate: dec!(0.01) },
            RateTier { max_amount: Some(dec!(100)), rate: dec!(0.03) },
        ];
        assert!(matches!(
            channel.validate(),
            Err(CostError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unbounded_tier_in_the_middle() {
        let mut channel = plain_channel(dec!(0.02));
        channel.tiers = vec![
            RateTier { max_amount: None, rate: dec!(0.01) },
            RateTier { max_amount: Some(dec!(100)), rate: dec!(0.03) },
        ];
        assert!(channel.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_clamp() {
        let mut channel = plain_channel(dec!(0.02));
        channel.min_fee = Some(dec!(100));
        channel.max_fee = Some(dec!(10));
        assert!(channel.validate().is_err());

        channel.max_fee = Some(dec!(0));
        assert!(channel.validate().is_ok());
    }

    #[test]
    fn test_channel_deserializes_with_defaults() {
        let json = r#"{
            "id": "wise",
            "name": "Wise",
            "kind": "other",
            "base_rate": "0.006",
            "supported_currencies": ["usd", "EUR"]
        }"#;
        let channel: ChannelConfig = serde_json::from_str(json).unwrap();
        assert!(channel.active);
        assert_eq!(channel.fixed_fee, Decimal::ZERO);
        assert!(channel.tiers.is_empty());
        assert!(channel.supports(&CurrencyCode::new("USD").unwrap()));
        assert!(!channel.supports(&CurrencyCode::new("GBP").unwrap()));
    }
}
