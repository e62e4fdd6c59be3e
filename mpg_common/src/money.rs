use std::fmt::Display;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

//--------------------------------------       Money        ----------------------------------------------------------
/// An amount of money in minor units (cents). The currency is tracked separately; see [`crate::Currency`].
///
/// Stored as an integer so that fee comparisons and bounds checks are exact. On the wire, amounts are JSON
/// numbers in major units (e.g. `5000.0` for KSh 5,000), which is what [`Serialize`] and [`Deserialize`]
/// produce and accept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// The amount in major units, as the gateway wire format represents it.
    pub fn as_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_whole(&self) -> bool {
        self.0 % 100 == 0
    }

    /// Converts a major-unit floating point amount (as received on the wire) into an exact cent count.
    pub fn try_from_major_f64(units: f64) -> Result<Self, MoneyConversionError> {
        if !units.is_finite() {
            return Err(MoneyConversionError(format!("{units} is not a finite number")));
        }
        let cents = (units * 100.0).round();
        if cents >= i64::MAX as f64 || cents <= i64::MIN as f64 {
            return Err(MoneyConversionError(format!("{units} is too large to represent in cents")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(cents as i64))
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let major = group_digits(self.0.abs() / 100);
        if self.is_whole() {
            write!(f, "{sign}{major}")
        } else {
            write!(f, "{sign}{major}.{:02}", self.0.abs() % 100)
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let units = f64::deserialize(deserializer)?;
        Money::try_from_major_f64(units).map_err(de::Error::custom)
    }
}

/// Renders a non-negative integer with comma thousands separators.
fn group_digits(units: i64) -> String {
    let digits = units.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_groups_thousands() {
        assert_eq!(Money::from_major(0).to_string(), "0");
        assert_eq!(Money::from_major(50).to_string(), "50");
        assert_eq!(Money::from_major(1_000).to_string(), "1,000");
        assert_eq!(Money::from_major(1_234_567).to_string(), "1,234,567");
    }

    #[test]
    fn display_includes_cents_only_when_present() {
        assert_eq!(Money::from_cents(123_450).to_string(), "1,234.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-123_456).to_string(), "-1,234.56");
    }

    #[test]
    fn whole_amounts_have_no_cent_part() {
        assert!(Money::from_major(50).is_whole());
        assert!(Money::from_cents(5_000).is_whole());
        assert!(Money::from_cents(-2_500).is_whole());
        assert!(!Money::from_cents(5_001).is_whole());
        assert!(Money::from_cents(-2_550).to_string().contains('.'));
    }

    #[test]
    fn serializes_as_major_unit_number() {
        let value = serde_json::to_value(Money::from_major(5_000)).unwrap();
        assert_eq!(value, serde_json::json!(5000.0));
    }

    #[test]
    fn deserializes_from_integers_and_decimals() {
        let whole: Money = serde_json::from_str("5000").unwrap();
        assert_eq!(whole, Money::from_major(5_000));
        let fractional: Money = serde_json::from_str("100.5").unwrap();
        assert_eq!(fractional.cents(), 10_050);
    }

    #[test]
    fn rejects_non_finite_amounts() {
        assert!(Money::try_from_major_f64(f64::NAN).is_err());
        assert!(Money::try_from_major_f64(f64::INFINITY).is_err());
        assert!(Money::try_from_major_f64(1e17).is_err());
    }

    #[test]
    fn orders_by_cents() {
        assert!(Money::from_major(49) < Money::from_major(50));
        assert!(Money::from_cents(5_001) > Money::from_major(50));
    }
}
