//! Currency reference types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO 4217-style currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a new code. Input is uppercased.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Get the code as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn ves() -> Self {
        Self::new("VES")
    }

    pub fn cop() -> Self {
        Self::new("COP")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A currency known to the system. Immutable reference data keyed by `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Unique currency code.
    pub code: CurrencyCode,
    /// Human-readable name.
    pub name: String,
    /// Display symbol.
    pub symbol: String,
    /// Whether the currency is available for conversion.
    pub active: bool,
    /// Decimal places used for display formatting.
    pub decimal_places: u32,
}

impl Currency {
    /// Create a new currency with the default two decimal places.
    pub fn new(code: impl Into<CurrencyCode>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            symbol: symbol.into(),
            active: true,
            decimal_places: DEFAULT_DECIMAL_PLACES,
        }
    }

    /// Override the display decimal places.
    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.decimal_places = places;
        self
    }

    /// Mark the currency as inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

impl From<String> for CurrencyCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Default display decimal places.
pub const DEFAULT_DECIMAL_PLACES: u32 = 2;
