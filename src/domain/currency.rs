use crate::error::{CostError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound for a plausible exchange rate against the reference currency.
const MAX_EXCHANGE_RATE: Decimal = dec!(10000);

/// An ISO-4217 style currency code, always stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: &str) -> Result<Self> {
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.len() != 3 || !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CostError::UnsupportedCurrency(format!(
                "{code:?} is not a three-letter currency code"
            )));
        }
        Ok(Self(normalized))
    }

    /// For codes compiled into the binary; skips validation.
    pub(crate) fn known(code: &str) -> Self {
        Self(code.to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CostError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Case-normalises `code` and checks it against the supported set.
pub fn validate_currency<'a, I>(code: &str, supported: I) -> Result<CurrencyCode>
where
    I: IntoIterator<Item = &'a CurrencyCode>,
{
    let supported: Vec<&CurrencyCode> = supported.into_iter().collect();
    let currency = CurrencyCode::new(code)?;
    if supported.contains(&&currency) {
        Ok(currency)
    } else {
        let list = supported
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(CostError::UnsupportedCurrency(format!(
            "{code}. Supported currencies: {list}"
        )))
    }
}

pub fn is_valid_exchange_rate(rate: Decimal) -> bool {
    rate > Decimal::ZERO && rate < MAX_EXCHANGE_RATE
}
