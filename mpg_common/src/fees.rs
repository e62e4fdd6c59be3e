use std::fmt::Display;

use serde::Serialize;

use crate::{Currency, Money};

/// The fee a prospective buyer pays to reserve a property visit, quoted in the currency of their country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisitFee {
    pub amount: Money,
    pub currency: Currency,
}

impl Display for VisitFee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.currency.format(self.amount))
    }
}

/// Looks up the visit-booking fee for a country. Unlisted countries pay the international default of $50.
///
/// The lookup is case-insensitive and tolerates surrounding whitespace, since the country name usually
/// arrives straight from a form field.
pub fn visit_booking_fee(country: &str) -> VisitFee {
    let fee = |units: i64, currency: Currency| VisitFee { amount: Money::from_major(units), currency };
    match country.trim().to_ascii_lowercase().as_str() {
        "kenya" => fee(5_000, Currency::KES),
        "uganda" => fee(180_000, Currency::UGX),
        "tanzania" => fee(130_000, Currency::TZS),
        "united kingdom" => fee(40, Currency::GBP),
        "united states" => fee(50, Currency::USD),
        _ => fee(50, Currency::USD),
    }
}

/// True when the amount falls within the inclusive payable range for the currency.
pub fn validate_payment_amount(amount: Money, currency: Currency) -> bool {
    currency.validate(amount)
}

/// Renders an amount the way the booking pages display it, e.g. `KSh 1,000`.
pub fn format_payment_amount(amount: Money, currency: Currency) -> String {
    currency.format(amount)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_countries_use_the_schedule() {
        let fee = visit_booking_fee("Kenya");
        assert_eq!(fee.amount, Money::from_major(5_000));
        assert_eq!(fee.currency, Currency::KES);
        let fee = visit_booking_fee("United Kingdom");
        assert_eq!(fee.amount, Money::from_major(40));
        assert_eq!(fee.currency, Currency::GBP);
    }

    #[test]
    fn unknown_countries_fall_back_to_usd() {
        let fee = visit_booking_fee("Atlantis");
        assert_eq!(fee.amount, Money::from_major(50));
        assert_eq!(fee.currency, Currency::USD);
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        assert_eq!(visit_booking_fee("  KENYA "), visit_booking_fee("kenya"));
        assert_eq!(visit_booking_fee("uGaNdA").currency, Currency::UGX);
    }

    #[test]
    fn validation_respects_currency_bounds() {
        assert!(validate_payment_amount(Money::from_major(5_000), Currency::KES));
        assert!(!validate_payment_amount(Money::from_major(5), Currency::KES));
        assert!(!validate_payment_amount(Money::from_major(2_000_000), Currency::KES));
    }

    #[test]
    fn formatting_matches_the_booking_pages() {
        assert_eq!(format_payment_amount(Money::from_major(1_000), Currency::KES), "KSh 1,000");
        assert_eq!(format_payment_amount(Money::from_major(50), Currency::USD), "$ 50");
        assert_eq!(visit_booking_fee("Kenya").to_string(), "KSh 5,000");
    }
}
