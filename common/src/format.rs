//! Display formatting for monetary amounts.
//!
//! Amounts are rendered in the es-VE convention used by the back office:
//! dot-grouped thousands, comma decimal separator, symbol prefix
//! (`Bs. 9.150,00`).

use crate::currency::{Currency, DEFAULT_DECIMAL_PLACES};
use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount with a currency's symbol and decimal places.
pub fn format_amount(amount: Decimal, currency: &Currency) -> String {
    format!(
        "{} {}",
        currency.symbol,
        format_number(amount, currency.decimal_places)
    )
}

/// Format a bare number with the default decimal places.
///
/// Fallback used when the currency is not in the reference set.
pub fn format_plain(amount: Decimal) -> String {
    format_number(amount, DEFAULT_DECIMAL_PLACES)
}

fn format_number(amount: Decimal, places: u32) -> String {
    let rounded = amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", places as usize, rounded);

    let negative = text.starts_with('-');
    let unsigned = text.trim_start_matches('-');
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3);
    if negative {
        grouped.push('-');
    }
    let digits: Vec<char> = int_part.chars().collect();
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*digit);
    }
    if let Some(frac) = frac_part {
        grouped.push(',');
        grouped.push_str(frac);
    }
    grouped
}
