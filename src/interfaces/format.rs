use crate::domain::currency::CurrencyCode;
use crate::domain::money::round_fixed;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn currency_symbol(currency: &CurrencyCode) -> Option<&'static str> {
    let symbol = match currency.as_str() {
        "CNY" | "JPY" => "¥",
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "HKD" => "HK$",
        "SGD" => "S$",
        "PHP" => "₱",
        _ => return None,
    };
    Some(symbol)
}

/// `1234.5` in USD renders as `$1,234.50`; unknown codes prefix the code itself.
pub fn format_currency(amount: Decimal, currency: &CurrencyCode) -> String {
    let prefix = currency_symbol(currency)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{currency} "));
    let rounded = round_fixed(amount.abs(), 2).to_string();
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let sign = if amount < Decimal::ZERO && !rounded.chars().all(|c| c == '0' || c == '.') {
        "-"
    } else {
        ""
    };
    format!("{sign}{prefix}{}.{cents}", group_thousands(whole))
}

/// `0.025` renders as `2.50%` with two places.
pub fn format_percentage(rate: Decimal, places: u32) -> String {
    format!("{}%", round_fixed(rate * dec!(100), places))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
