//! Seeded currency reference data.
//!
//! The back office ships with a fixed set of currencies and a USD-based
//! rate table used when no live provider is configured.

use std::collections::HashMap;

use cambio_common::{Currency, CurrencyCode};
use rust_decimal::Decimal;

/// Currencies available in the system.
pub fn default_currencies() -> Vec<Currency> {
    vec![
        Currency::new("USD", "Dólar Estadounidense", "$"),
        Currency::new("EUR", "Euro", "€"),
        Currency::new("COP", "Peso Colombiano", "$").with_decimal_places(0),
        Currency::new("VES", "Bolívar Digital", "Bs."),
        Currency::new("PEN", "Sol Peruano", "S/."),
        Currency::new("MXN", "Peso Mexicano", "$"),
        Currency::new("CLP", "Peso Chileno", "$").with_decimal_places(0),
        Currency::new("ARS", "Peso Argentino", "$"),
    ]
}

/// Base exchange rates, quoted against USD.
///
/// One USD equals `rate` units of each listed currency; cross-rates are
/// derived from this table.
pub fn base_rates() -> HashMap<CurrencyCode, Decimal> {
    let mut rates = HashMap::new();
    rates.insert(CurrencyCode::new("USD"), Decimal::ONE);
    rates.insert(CurrencyCode::new("EUR"), Decimal::new(92, 2));
    rates.insert(CurrencyCode::new("COP"), Decimal::new(41500, 1));
    rates.insert(CurrencyCode::new("VES"), Decimal::new(9150, 2));
    rates.insert(CurrencyCode::new("PEN"), Decimal::new(385, 2));
    rates.insert(CurrencyCode::new("MXN"), Decimal::new(1725, 2));
    rates.insert(CurrencyCode::new("CLP"), Decimal::new(94550, 2));
    rates.insert(CurrencyCode::new("ARS"), Decimal::new(85025, 2));
    rates
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_seed_set_consistent() {
        let currencies = default_currencies();
        let rates = base_rates();

        assert_eq!(currencies.len(), 8);
        for currency in &currencies {
            assert!(rates.contains_key(&currency.code), "{} missing", currency.code);
        }
    }

    #[test]
    fn test_reference_values() {
        let rates = base_rates();
        assert_eq!(rates[&CurrencyCode::usd()], dec!(1));
        assert_eq!(rates[&CurrencyCode::eur()], dec!(0.92));
        assert_eq!(rates[&CurrencyCode::ves()], dec!(91.50));
    }
}
