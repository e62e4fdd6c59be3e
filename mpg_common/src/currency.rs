use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Money;

//--------------------------------------      Currency      ----------------------------------------------------------
/// The currencies the visit-booking fee schedule quotes in.
///
/// Each currency carries its display symbol and the inclusive bounds a payment amount must fall within
/// before it may be submitted to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    KES,
    USD,
    EUR,
    GBP,
    UGX,
    TZS,
}

impl Currency {
    pub const ALL: [Currency; 6] =
        [Currency::KES, Currency::USD, Currency::EUR, Currency::GBP, Currency::UGX, Currency::TZS];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::KES => "KES",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::UGX => "UGX",
            Currency::TZS => "TZS",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::KES => "KSh",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::UGX => "USh",
            Currency::TZS => "TSh",
        }
    }

    /// The inclusive (min, max) range of payable amounts in this currency.
    pub fn bounds(&self) -> (Money, Money) {
        match self {
            Currency::KES => (Money::from_major(100), Money::from_major(1_000_000)),
            Currency::USD => (Money::from_major(1), Money::from_major(10_000)),
            Currency::EUR => (Money::from_major(1), Money::from_major(10_000)),
            Currency::GBP => (Money::from_major(1), Money::from_major(10_000)),
            Currency::UGX => (Money::from_major(3_500), Money::from_major(35_000_000)),
            Currency::TZS => (Money::from_major(2_000), Money::from_major(25_000_000)),
        }
    }

    /// True when `min <= amount <= max` for this currency. Both ends are inclusive.
    pub fn validate(&self, amount: Money) -> bool {
        let (min, max) = self.bounds();
        amount >= min && amount <= max
    }

    /// Renders an amount with this currency's symbol, e.g. `KSh 1,000` or `$ 50`.
    pub fn format(&self, amount: Money) -> String {
        format!("{} {amount}", self.symbol())
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unknown currency code: {0}")]
pub struct UnknownCurrency(String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KES" => Ok(Currency::KES),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "UGX" => Ok(Currency::UGX),
            "TZS" => Ok(Currency::TZS),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }
}
