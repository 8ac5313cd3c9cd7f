//! Bag weight normalization
//!
//! Every bag loses a fixed deduction (tare, moisture) before it becomes
//! billable. The deduction is drawn from a closed set of 0, 1 or 2 kg.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SettlementError;

/// Fixed per-bag weight deduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DeductionPerBag {
    /// No deduction
    #[default]
    Zero,
    /// 1 kg per bag
    One,
    /// 2 kg per bag
    Two,
}

impl DeductionPerBag {
    /// Every permitted deduction, smallest first
    pub const ALL: [DeductionPerBag; 3] = [
        DeductionPerBag::Zero,
        DeductionPerBag::One,
        DeductionPerBag::Two,
    ];

    /// Returns the deduction in whole kilograms
    pub fn as_u8(&self) -> u8 {
        match self {
            DeductionPerBag::Zero => 0,
            DeductionPerBag::One => 1,
            DeductionPerBag::Two => 2,
        }
    }

    /// Returns the deduction in kilograms
    pub fn kilograms(&self) -> Decimal {
        Decimal::from(self.as_u8())
    }
}

impl TryFrom<u8> for DeductionPerBag {
    type Error = SettlementError;

    fn try_from(kg: u8) -> Result<Self, Self::Error> {
        match kg {
            0 => Ok(DeductionPerBag::Zero),
            1 => Ok(DeductionPerBag::One),
            2 => Ok(DeductionPerBag::Two),
            other => Err(SettlementError::configuration(format!(
                "deduction per bag must be 0, 1 or 2 kg, got {}",
                other
            ))),
        }
    }
}

impl From<DeductionPerBag> for u8 {
    fn from(deduction: DeductionPerBag) -> u8 {
        deduction.as_u8()
    }
}

impl fmt::Display for DeductionPerBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kg", self.as_u8())
    }
}

/// Converts a measured bag weight into its billable weight
///
/// The result is `max(0, original - deduction)`: a bag lighter than the
/// deduction yields zero billable weight rather than an error.
///
/// # Example
///
/// ```rust
/// use domain_settlement::weight::{adjust, DeductionPerBag};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(adjust(dec!(50), DeductionPerBag::One), dec!(49));
/// assert_eq!(adjust(dec!(1.5), DeductionPerBag::Two), dec!(0));
/// ```
pub fn adjust(original_weight: Decimal, deduction: DeductionPerBag) -> Decimal {
    (original_weight - deduction.kilograms()).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_adjust_subtracts_deduction() {
        assert_eq!(adjust(dec!(50), DeductionPerBag::One), dec!(49));
        assert_eq!(adjust(dec!(48.25), DeductionPerBag::Two), dec!(46.25));
        assert_eq!(adjust(dec!(52), DeductionPerBag::Zero), dec!(52));
    }

    #[test]
    fn test_adjust_floors_at_zero() {
        assert_eq!(adjust(dec!(1.5), DeductionPerBag::Two), Decimal::ZERO);
        assert_eq!(adjust(dec!(0), DeductionPerBag::One), Decimal::ZERO);
        assert_eq!(adjust(dec!(2), DeductionPerBag::Two), Decimal::ZERO);
    }

    #[test]
    fn test_deduction_from_u8() {
        assert_eq!(DeductionPerBag::try_from(2).unwrap(), DeductionPerBag::Two);
        let err = DeductionPerBag::try_from(3).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_deduction_serializes_as_kilograms() {
        assert_eq!(serde_json::to_string(&DeductionPerBag::One).unwrap(), "1");
        let parsed: DeductionPerBag = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, DeductionPerBag::Two);
        assert!(serde_json::from_str::<DeductionPerBag>("5").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn adjusted_weight_is_bounded(
            grams in 0i64..200_000i64,
            deduction in prop::sample::select(DeductionPerBag::ALL.to_vec())
        ) {
            let original = Decimal::new(grams, 3);
            let adjusted = adjust(original, deduction);

            prop_assert!(adjusted >= Decimal::ZERO);
            prop_assert!(adjusted <= original);
        }
    }
}
