//! Price Formatting

use serde::Serialize;

/// Currency prefix for displayed prices
pub const CURRENCY: &str = "LKR";

/// Predicted price with its display string
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePrediction {
    /// Raw model output
    pub price: f64,
    /// e.g. `LKR 24,000,000.00`
    pub formatted: String,
}

impl PricePrediction {
    pub fn new(price: f64) -> Self {
        Self {
            price,
            formatted: format_price(price),
        }
    }
}

/// Format with thousands separators and two decimals
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return format!("{CURRENCY} {price}");
    }

    let fixed = format!("{:.2}", price.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 8);
    if price.is_sign_negative() {
        grouped.push('-');
    }
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{CURRENCY} {grouped}.{fraction}")
}
