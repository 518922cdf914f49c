//! Non-negative monetary amounts.
//!
//! Prices use decimal arithmetic so cart totals never drift. On the wire a
//! price is a plain JSON number (`1000`, `19.99`). Amounts are cents-exact
//! and bounded by the `NUMERIC(12, 2)` columns they are stored in.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),

    /// Prices above [`Price::MAX`] do not fit the stored column.
    #[error("price cannot exceed {max} (got {0})", max = Price::MAX.0)]
    TooLarge(Decimal),

    /// Prices are whole cents.
    #[error("price cannot have more than 2 decimal places (got {0})")]
    TooPrecise(Decimal),
}

/// A price or total, always `>= 0`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "PriceRepr", into = "PriceRepr")]
pub struct Price(Decimal);

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct PriceRepr(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest storable amount, `9999999999.99`.
    pub const MAX: Self = Self(Decimal::from_parts(3_567_587_327, 232, 0, false, 2));

    /// Create a price, rejecting negative, oversized and sub-cent amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount < 0`, `PriceError::TooLarge`
    /// if `amount > Price::MAX`, and `PriceError::TooPrecise` if it has
    /// fractions of a cent.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity (line totals).
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Subtract, flooring at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<PriceRepr> for Price {
    type Error = PriceError;

    fn try_from(value: PriceRepr) -> Result<Self, Self::Error> {
        Self::new(value.0)
    }
}

impl From<Price> for PriceRepr {
    fn from(price: Price) -> Self {
        Self(price.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-1, 0)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_bounded_by_stored_column() {
        assert_eq!(Price::MAX.amount(), Decimal::new(999_999_999_999, 2));
        assert!(Price::new(Decimal::new(999_999_999_999, 2)).is_ok());
        assert!(matches!(
            Price::new(Decimal::new(1_000_000_000_000, 2)),
            Err(PriceError::TooLarge(_))
        ));
    }

    #[test]
    fn test_rejects_fractions_of_a_cent() {
        assert!(matches!(
            Price::new(Decimal::new(19_999, 3)),
            Err(PriceError::TooPrecise(_))
        ));
        // Trailing zeros are not extra precision
        assert!(Price::new(Decimal::new(12_500, 3)).is_ok());
    }

    #[test]
    fn test_deserialize_rejects_unstorable_amounts() {
        assert!(serde_json::from_str::<Price>("1e12").is_err());
        assert!(serde_json::from_str::<Price>("10000000000").is_err());
        assert!(serde_json::from_str::<Price>("0.125").is_err());
        assert!(serde_json::from_str::<Price>("1234567.89").is_ok());
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Price::new(Decimal::new(1999, 2)).unwrap();
        assert_eq!(unit.times(3).amount(), Decimal::new(5997, 2));

        let total: Price = [unit, unit].into_iter().sum();
        assert_eq!(total.amount(), Decimal::new(3998, 2));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let small = Price::from_units(5);
        let big = Price::from_units(8);
        assert_eq!(big.saturating_sub(small), Price::from_units(3));
        assert_eq!(small.saturating_sub(big), Price::ZERO);
    }

    #[test]
    fn test_json_is_a_number() {
        let price = Price::new(Decimal::new(1250, 2)).unwrap();
        let json = serde_json::to_value(price).unwrap();
        assert!(json.is_number());
        assert!((json.as_f64().unwrap() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_numbers_and_rejects_negative() {
        let price: Price = serde_json::from_str("1000").unwrap();
        assert_eq!(price, Price::from_units(1000));

        let price: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(price.amount(), Decimal::new(1999, 2));

        assert!(serde_json::from_str::<Price>("-3").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_units(85000).to_string(), "$85000.00");
    }
}
