//! Decimal money amounts and their display formatting.
//!
//! All arithmetic stays in [`Decimal`]; rounding to cents happens only where
//! a value is presented or where a business rule (tax) requires it.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the storefront's default currency.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            round_cents(self.amount)
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    KES,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::KES => "KSh ",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

/// Round an amount to whole cents, half away from zero.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_display_pads_cents() {
        assert_eq!(Price::usd(Decimal::new(21, 0)).to_string(), "$21.00");
        assert_eq!(Price::usd(Decimal::new(999, 2)).to_string(), "$9.99");
    }

    #[test]
    fn test_round_cents_half_away_from_zero() {
        assert_eq!(round_cents(Decimal::new(2_4005, 4)), Decimal::new(240, 2));
        assert_eq!(round_cents(Decimal::new(1_005, 3)), Decimal::new(101, 2));
    }
}
