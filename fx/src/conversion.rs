//! Conversion result types.

use cambio_common::{CurrencyCode, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rate::{ConversionRate, RateSource};

/// A completed conversion, produced fresh per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Input amount.
    pub amount: Decimal,
    /// Output amount, rounded to two decimal places.
    pub converted_amount: Decimal,
    /// The realized rate.
    pub rate: Decimal,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// When the conversion was executed.
    pub timestamp: Timestamp,
    /// Input amount rendered for display.
    pub formatted_amount: Option<String>,
    /// Output amount rendered for display.
    pub formatted_converted_amount: Option<String>,
    /// Where the rate came from.
    pub provider: RateSource,
}

impl ConversionResult {
    /// Assemble a result from the resolved rate and the rounded output.
    pub fn new(amount: Decimal, converted_amount: Decimal, rate: &ConversionRate) -> Self {
        Self {
            amount,
            converted_amount,
            rate: rate.rate,
            from: rate.from.clone(),
            to: rate.to.clone(),
            timestamp: rate.timestamp,
            formatted_amount: None,
            formatted_converted_amount: None,
            provider: rate.source,
        }
    }

    /// Attach display strings.
    pub fn with_formatting(
        mut self,
        formatted_amount: String,
        formatted_converted_amount: String,
    ) -> Self {
        self.formatted_amount = Some(formatted_amount);
        self.formatted_converted_amount = Some(formatted_converted_amount);
        self
    }

    /// Effective rate realized by the rounded output.
    pub fn effective_rate(&self) -> Decimal {
        if self.amount.is_zero() {
            return Decimal::ZERO;
        }
        self.converted_amount / self.amount
    }
}
