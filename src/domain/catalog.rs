use super::channel::{ChannelConfig, ChannelKind, LargeAmountDiscount, RateTier};
use super::currency::{CurrencyCode, is_valid_exchange_rate};
use super::exchange::validate_spread;
use crate::error::{CostError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Immutable reference data: channels plus reference exchange rates.
///
/// Built once at start-up and handed to the engine by value. Channels keep
/// their declaration order, which is the default comparison order.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Catalog {
    pub reference_currency: CurrencyCode,
    #[serde(default = "default_spread_rate")]
    pub default_spread_rate: Decimal,
    /// Units of the reference currency per unit of the keyed currency.
    pub exchange_rates: BTreeMap<CurrencyCode, Decimal>,
    pub channels: Vec<ChannelConfig>,
}

fn default_spread_rate() -> Decimal {
    dec!(0.005)
}

impl Catalog {
    pub fn channel(&self, id: &str) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn channels(&self) -> &[ChannelConfig] {
        &self.channels
    }

    pub fn channel_ids(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.id.clone()).collect()
    }

    pub fn channel_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.channel(id).map_or(id, |c| c.name.as_str())
    }

    pub fn market_rate(&self, currency: &CurrencyCode) -> Option<Decimal> {
        if *currency == self.reference_currency {
            return Some(Decimal::ONE);
        }
        self.exchange_rates.get(currency).copied()
    }

    pub fn supported_currencies(&self) -> BTreeSet<CurrencyCode> {
        let mut currencies: BTreeSet<CurrencyCode> = self.exchange_rates.keys().cloned().collect();
        currencies.insert(self.reference_currency.clone());
        currencies
    }

    pub fn validate(&self) -> Result<()> {
        validate_spread(self.default_spread_rate)
            .map_err(|e| CostError::InvalidCatalog(format!("default spread: {e}")))?;

        for (currency, rate) in &self.exchange_rates {
            if !is_valid_exchange_rate(*rate) {
                return Err(CostError::InvalidCatalog(format!(
                    "exchange rate {rate} for {currency} is out of range"
                )));
            }
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.id.as_str()) {
                return Err(CostError::InvalidCatalog(format!(
                    "duplicate channel id {}",
                    channel.id
                )));
            }
            channel.validate()?;
        }
        Ok(())
    }

    /// The default catalog shipped with the binary. CNY is the reference currency.
    pub fn builtin() -> Self {
        let bank = currencies(&["USD", "EUR", "GBP", "JPY", "HKD"]);
        let wallet = currencies(&["USD", "EUR", "GBP", "JPY", "HKD", "SGD", "PHP"]);
        let card = currencies(&["USD", "EUR", "GBP", "JPY", "HKD", "SGD"]);

        let channels = vec![
            ChannelConfig {
                id: "bank_transfer".to_string(),
                name: "Bank Wire Transfer".to_string(),
                kind: ChannelKind::Bank,
                base_rate: dec!(0.015),
                fixed_fee: dec!(50),
                min_fee: Some(dec!(100)),
                max_fee: Some(dec!(1000)),
                tiers: vec![
                    RateTier { max_amount: Some(dec!(10000)), rate: dec!(0.015) },
                    RateTier { max_amount: Some(dec!(50000)), rate: dec!(0.012) },
                    RateTier { max_amount: Some(dec!(100000)), rate: dec!(0.010) },
                    RateTier { max_amount: None, rate: dec!(0.008) },
                ],
                supported_currencies: bank.clone(),
                active: true,
                processing_days: Some(3),
                large_amount_discount: None,
                cashback_rate: None,
            },
            ChannelConfig {
                id: "swift".to_string(),
                name: "SWIFT Remittance".to_string(),
                kind: ChannelKind::Bank,
                base_rate: dec!(0.015),
                fixed_fee: dec!(30),
                min_fee: Some(dec!(80)),
                max_fee: Some(dec!(800)),
                tiers: Vec::new(),
                supported_currencies: bank,
                active: true,
                processing_days: Some(5),
                large_amount_discount: Some(LargeAmountDiscount {
                    threshold: dec!(50000),
                    multiplier: dec!(0.9),
                }),
                cashback_rate: None,
            },
            ChannelConfig {
                id: "alipay_global".to_string(),
                name: "Alipay Global".to_string(),
                kind: ChannelKind::Wallet,
                base_rate: dec!(0.02),
                fixed_fee: Decimal::ZERO,
                min_fee: None,
                max_fee: None,
                tiers: vec![
                    RateTier { max_amount: Some(dec!(5000)), rate: dec!(0.02) },
                    RateTier { max_amount: Some(dec!(20000)), rate: dec!(0.018) },
                    RateTier { max_amount: None, rate: dec!(0.015) },
                ],
                supported_currencies: wallet.clone(),
                active: true,
                processing_days: Some(1),
                large_amount_discount: None,
                cashback_rate: None,
            },
            ChannelConfig {
                id: "paypal".to_string(),
                name: "PayPal".to_string(),
                kind: ChannelKind::Wallet,
                base_rate: dec!(0.044),
                fixed_fee: dec!(0.30),
                min_fee: None,
                max_fee: None,
                tiers: Vec::new(),
                supported_currencies: wallet,
                active: true,
                processing_days: Some(1),
                large_amount_discount: None,
                cashback_rate: Some(dec!(0.002)),
            },
            ChannelConfig {
                id: "wise".to_string(),
                name: "Wise".to_string(),
                kind: ChannelKind::Other,
                base_rate: dec!(0.006),
                fixed_fee: dec!(5),
                min_fee: None,
                max_fee: None,
                tiers: Vec::new(),
                supported_currencies: currencies(&["USD", "EUR", "GBP", "SGD"]),
                active: true,
                processing_days: Some(2),
                large_amount_discount: None,
                cashback_rate: None,
            },
            ChannelConfig {
                id: "visa_card".to_string(),
                name: "Visa Card".to_string(),
                kind: ChannelKind::Card,
                base_rate: dec!(0.025),
                fixed_fee: Decimal::ZERO,
                min_fee: Some(dec!(5)),
                max_fee: Some(dec!(500)),
                tiers: Vec::new(),
                supported_currencies: card,
                active: true,
                processing_days: Some(1),
                large_amount_discount: None,
                cashback_rate: None,
            },
            ChannelConfig {
                id: "western_union".to_string(),
                name: "Western Union".to_string(),
                kind: ChannelKind::Other,
                base_rate: dec!(0.03),
                fixed_fee: dec!(15),
                min_fee: None,
                max_fee: None,
                tiers: Vec::new(),
                supported_currencies: currencies(&["USD", "EUR", "PHP"]),
                active: false,
                processing_days: Some(1),
                large_amount_discount: None,
                cashback_rate: None,
            },
        ];

        let exchange_rates = [
            ("USD", dec!(7.25)),
            ("EUR", dec!(7.85)),
            ("GBP", dec!(9.15)),
            ("JPY", dec!(0.048)),
            ("HKD", dec!(0.93)),
            ("SGD", dec!(5.40)),
            ("PHP", dec!(0.13)),
        ]
        .into_iter()
        .map(|(code, rate)| (CurrencyCode::known(code), rate))
        .collect();

        Self {
            reference_currency: CurrencyCode::known("CNY"),
            default_spread_rate: default_spread_rate(),
            exchange_rates,
            channels,
        }
    }
}

fn currencies(codes: &[&str]) -> BTreeSet<CurrencyCode> {
    codes
        .iter()
        .map(|code| CurrencyCode::known(code))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(c: &str) -> CurrencyCode {
        CurrencyCode::new(c).unwrap()
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.reference_currency, code("CNY"));
        assert_eq!(catalog.channel_ids()[0], "bank_transfer");
    }

    #[test]
    fn test_market_rate_lookup() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.market_rate(&code("USD")), Some(dec!(7.25)));
        assert_eq!(catalog.market_rate(&code("CNY")), Some(Decimal::ONE));
        assert_eq!(catalog.market_rate(&code("CHF")), None);
    }

    #[test]
    fn test_supported_currencies_include_reference() {
        let supported = Catalog::builtin().supported_currencies();
        assert!(supported.contains(&code("CNY")));
        assert!(supported.contains(&code("PHP")));
        assert_eq!(supported.len(), 8);
    }

    #[test]
    fn test_channel_name_falls_back_to_id() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.channel_name("wise"), "Wise");
        assert_eq!(catalog.channel_name("ghost"), "ghost");
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut catalog = Catalog::builtin();
        let duplicate = catalog.channels[0].clone();
        catalog.channels.push(duplicate);
        assert!(matches!(
            catalog.validate(),
            Err(CostError::InvalidCatalog(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn test_validate_rejects_bad_exchange_rate() {
        let mut catalog = Catalog::builtin();
        catalog.exchange_rates.insert(code("XAU"), dec!(0));
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_catalog_json_round_trip_keeps_channel_order() {
        let catalog = Catalog::builtin();
        let json = serde_json::to_string(&catalog).unwrap();
        let parsed: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.channel_ids(), catalog.channel_ids());
        assert_eq!(parsed, catalog);
    }
}
