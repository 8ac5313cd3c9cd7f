//! Rate application
//!
//! Commodities are priced per 100 kg of adjusted weight. The amount owed for
//! a bill is `round(total_adjusted_kg * rate / 100, mode)`, rounded exactly
//! once on the total and never per bag, so the bill total can never drift
//! from the sum of its bags' weights.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SettlementError;
use crate::rounding::RoundingMode;

/// Kilograms covered by one unit of rate
pub const RATE_BASIS_KG: Decimal = dec!(100);

/// A non-negative price per 100 kg of adjusted weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct RatePer100Kg(Decimal);

impl RatePer100Kg {
    /// Creates a rate, rejecting negative values as a configuration error
    pub fn new(rate: Decimal) -> Result<Self, SettlementError> {
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(SettlementError::negative_rate(rate));
        }
        Ok(Self(rate.normalize()))
    }

    /// A rate of nothing; every amount computed with it is zero
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Price per 100 kg
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// True when no price has been configured
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for RatePer100Kg {
    type Error = SettlementError;

    fn try_from(rate: Decimal) -> Result<Self, Self::Error> {
        Self::new(rate)
    }
}

impl From<RatePer100Kg> for Decimal {
    fn from(rate: RatePer100Kg) -> Decimal {
        rate.0
    }
}

impl fmt::Display for RatePer100Kg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/100kg", self.0)
    }
}

/// Computes the amount owed for a total adjusted weight
///
/// # Arguments
///
/// * `total_adjusted_kg` - Sum of the bags' adjusted weights
/// * `rate` - Price per 100 kg
/// * `mode` - Rounding applied once to the final amount
///
/// # Errors
///
/// Returns a validation error if the weight is negative or the product does
/// not fit the decimal representation.
///
/// # Example
///
/// ```rust
/// use domain_settlement::rate::{compute_amount, RatePer100Kg};
/// use domain_settlement::rounding::RoundingMode;
/// use rust_decimal_macros::dec;
///
/// let rate = RatePer100Kg::new(dec!(3000)).unwrap();
/// let amount = compute_amount(dec!(147), rate, RoundingMode::Round).unwrap();
/// assert_eq!(amount, dec!(4410));
/// ```
pub fn compute_amount(
    total_adjusted_kg: Decimal,
    rate: RatePer100Kg,
    mode: RoundingMode,
) -> Result<Decimal, SettlementError> {
    if total_adjusted_kg.is_sign_negative() && !total_adjusted_kg.is_zero() {
        return Err(SettlementError::validation(format!(
            "total adjusted weight must not be negative, got {} kg",
            total_adjusted_kg
        )));
    }
    if total_adjusted_kg.is_zero() || rate.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let gross = total_adjusted_kg
        .checked_mul(rate.value())
        .ok_or_else(|| SettlementError::overflow("weight multiplied by rate"))?;
    let exact = gross
        .checked_div(RATE_BASIS_KG)
        .ok_or_else(|| SettlementError::overflow("amount"))?;

    Ok(mode.apply(exact))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(value: Decimal) -> RatePer100Kg {
        RatePer100Kg::new(value).unwrap()
    }

    #[test]
    fn test_compute_amount_exact() {
        let amount = compute_amount(dec!(147), rate(dec!(3000)), RoundingMode::Round).unwrap();
        assert_eq!(amount, dec!(4410));
    }

    #[test]
    fn test_compute_amount_rounds_once() {
        // 33.3 kg at 2505 = 834.165
        let kg = dec!(33.3);
        let r = rate(dec!(2505));
        assert_eq!(compute_amount(kg, r, RoundingMode::Floor).unwrap(), dec!(834));
        assert_eq!(compute_amount(kg, r, RoundingMode::Ceil).unwrap(), dec!(835));
        assert_eq!(compute_amount(kg, r, RoundingMode::Round).unwrap(), dec!(834));
    }

    #[test]
    fn test_compute_amount_half_rounds_up() {
        // 0.5 kg at 100 = 0.5
        let amount = compute_amount(dec!(0.5), rate(dec!(100)), RoundingMode::Round).unwrap();
        assert_eq!(amount, dec!(1));
    }

    #[test]
    fn test_zero_weight_or_rate_is_zero() {
        for mode in RoundingMode::ALL {
            assert_eq!(compute_amount(Decimal::ZERO, rate(dec!(3000)), mode).unwrap(), Decimal::ZERO);
            assert_eq!(compute_amount(dec!(147), RatePer100Kg::zero(), mode).unwrap(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_negative_rate_is_configuration_error() {
        let err = RatePer100Kg::new(dec!(-1)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_negative_weight_is_validation_error() {
        let err = compute_amount(dec!(-1), rate(dec!(3000)), RoundingMode::Round).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = compute_amount(Decimal::MAX, rate(dec!(3000)), RoundingMode::Round).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_rate_deserialization_rejects_negative() {
        assert!(serde_json::from_str::<RatePer100Kg>("\"-5\"").is_err());
        let ok: RatePer100Kg = serde_json::from_str("\"3000\"").unwrap();
        assert_eq!(ok.value(), dec!(3000));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn zero_inputs_give_zero(
            grams in 0i64..10_000_000i64,
            paise in 0i64..10_000_000i64,
            mode in prop::sample::select(RoundingMode::ALL.to_vec())
        ) {
            let kg = Decimal::new(grams, 3);
            let rate = RatePer100Kg::new(Decimal::new(paise, 2)).unwrap();

            prop_assert_eq!(compute_amount(Decimal::ZERO, rate, mode).unwrap(), Decimal::ZERO);
            prop_assert_eq!(compute_amount(kg, RatePer100Kg::zero(), mode).unwrap(), Decimal::ZERO);
        }

        #[test]
        fn amount_is_whole_and_within_one_unit(
            grams in 0i64..10_000_000i64,
            paise in 0i64..10_000_000i64,
            mode in prop::sample::select(RoundingMode::ALL.to_vec())
        ) {
            let kg = Decimal::new(grams, 3);
            let rate = RatePer100Kg::new(Decimal::new(paise, 2)).unwrap();
            let exact = kg * rate.value() / RATE_BASIS_KG;
            let amount = compute_amount(kg, rate, mode).unwrap();

            prop_assert!(amount.fract().is_zero());
            prop_assert!((amount - exact).abs() < Decimal::ONE);
        }
    }
}
