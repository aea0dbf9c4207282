use crate::error::PaymentError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest value the 10-digit integer slot of a frame can carry.
pub const MAX_INTEGER_PART: u64 = 9_999_999_999;

/// An exact monetary amount held as whole cents.
///
/// Frames carry amounts as an integer part (whole currency units) and a
/// two-digit decimal part (cents). Keeping cents avoids any float rounding
/// between the wire and the display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(into = "Decimal", try_from = "Decimal")]
pub struct Amount {
    cents: u64,
}

impl Amount {
    pub const ZERO: Self = Self { cents: 0 };

    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    /// Builds an amount from whole units and cents, as split in a frame.
    pub fn from_parts(integer: u64, decimal: u64) -> Result<Self, PaymentError> {
        if decimal > 99 {
            return Err(PaymentError::validation(
                "amountDecimal",
                format!("{decimal} is not a two-digit cent value"),
            ));
        }
        integer
            .checked_mul(100)
            .and_then(|c| c.checked_add(decimal))
            .map(Self::from_cents)
            .ok_or_else(|| PaymentError::validation("amountInteger", "amount overflows"))
    }

    /// Converts a decimal total, rounding half away from zero to cents.
    pub fn from_decimal(value: Decimal) -> Result<Self, PaymentError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(PaymentError::validation(
                "amount",
                format!("{value} is negative"),
            ));
        }
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let cents = (rounded * Decimal::ONE_HUNDRED)
            .to_u64()
            .ok_or_else(|| PaymentError::validation("amount", format!("{value} is out of range")))?;
        Ok(Self::from_cents(cents))
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    pub fn integer_part(&self) -> u64 {
        self.cents / 100
    }

    pub fn decimal_part(&self) -> u64 {
        self.cents % 100
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.cents), 2)
    }

    /// Display form used by the storefront, e.g. `Q. 123.45`.
    pub fn display_quetzales(&self) -> String {
        format!("Q. {self}")
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.integer_part(), self.decimal_part())
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.to_decimal()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parts_scale_is_units_and_cents() {
        let amount = Amount::from_parts(100, 50).unwrap();
        assert_eq!(amount.cents(), 10_050);
        assert_eq!(amount.to_decimal(), dec!(100.50));
        assert_eq!(amount.to_string(), "100.50");
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(Amount::from_parts(0, 0).unwrap().to_string(), "0.00");
        assert_eq!(Amount::from_parts(1000, 0).unwrap().to_string(), "1000.00");

        let max = Amount::from_parts(MAX_INTEGER_PART, 99).unwrap();
        assert_eq!(max.integer_part(), MAX_INTEGER_PART);
        assert_eq!(max.decimal_part(), 99);
        assert_eq!(max.to_decimal(), dec!(9999999999.99));
        assert_eq!(Amount::from_parts(1000, 0).unwrap().to_decimal().to_string(), "1000.00");
    }

    #[test]
    fn test_decimal_part_over_99_rejected() {
        assert!(matches!(
            Amount::from_parts(1, 100),
            Err(PaymentError::Validation { field: "amountDecimal", .. })
        ));
    }

    #[test]
    fn test_from_decimal_rounds_to_cents() {
        assert_eq!(Amount::from_decimal(dec!(19.995)).unwrap().cents(), 2000);
        assert_eq!(Amount::from_decimal(dec!(19.994)).unwrap().cents(), 1999);
        assert_eq!(Amount::from_decimal(dec!(7)).unwrap().cents(), 700);
        assert!(Amount::from_decimal(dec!(-1.00)).is_err());
    }

    #[test]
    fn test_display_quetzales() {
        let amount = Amount::from_parts(123, 45).unwrap();
        assert_eq!(amount.display_quetzales(), "Q. 123.45");
    }

    #[test]
    fn test_serializes_as_decimal() {
        let amount = Amount::from_parts(12, 5).unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"12.05\"");

        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
