use super::currency::CurrencyCode;
use super::money::MAX_AMOUNT;
use crate::error::{CostError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One row of a payment ledger, as exported by an upstream system.
///
/// `fee` is in the transaction currency; `amount_ref` is the amount
/// converted into the reference currency.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub channel: String,
    pub fee: Decimal,
    pub fee_rate: Decimal,
    pub amount_ref: Decimal,
    pub status: TransactionStatus,
    pub date: NaiveDate,
}

impl Transaction {
    /// Rejects figures past `MAX_AMOUNT` so ledger totals stay representable.
    pub fn validate(&self) -> Result<()> {
        let columns = [
            ("amount", self.amount),
            ("fee", self.fee),
            ("fee_rate", self.fee_rate),
            ("amount_ref", self.amount_ref),
        ];
        for (column, value) in columns {
            if value.abs() > MAX_AMOUNT {
                return Err(CostError::InvalidAmount(format!(
                    "{} {column} {value} exceeds {MAX_AMOUNT}",
                    self.id
                )));
            }
        }
        Ok(())
    }
}
