//! Rounding policy
//!
//! Amounts are settled in whole currency units. The mode is chosen once in
//! settings and frozen onto each bill. All values are `Decimal`, so a given
//! `(value, mode)` pair rounds identically on every platform.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SettlementError;

/// How a fractional amount is brought to a whole unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Toward negative infinity
    Floor,
    /// Toward positive infinity
    Ceil,
    /// Nearest whole unit, ties away from zero
    #[default]
    Round,
}

impl RoundingMode {
    /// Every mode, in the order settings screens list them
    pub const ALL: [RoundingMode; 3] = [RoundingMode::Floor, RoundingMode::Ceil, RoundingMode::Round];

    fn strategy(&self) -> RoundingStrategy {
        match self {
            RoundingMode::Floor => RoundingStrategy::ToNegativeInfinity,
            RoundingMode::Ceil => RoundingStrategy::ToPositiveInfinity,
            RoundingMode::Round => RoundingStrategy::MidpointAwayFromZero,
        }
    }

    /// Rounds `value` to a whole number under this mode
    pub fn apply(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(0, self.strategy())
    }

    /// Lowercase name used in settings, the API and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingMode::Floor => "floor",
            RoundingMode::Ceil => "ceil",
            RoundingMode::Round => "round",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundingMode {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "floor" => Ok(RoundingMode::Floor),
            "ceil" => Ok(RoundingMode::Ceil),
            "round" => Ok(RoundingMode::Round),
            other => Err(SettlementError::configuration(format!(
                "unknown rounding mode '{}'",
                other
            ))),
        }
    }
}

/// Rounds `value` to a whole unit using `mode`
pub fn round(value: Decimal, mode: RoundingMode) -> Decimal {
    mode.apply(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_floor() {
        assert_eq!(round(dec!(4410.99), RoundingMode::Floor), dec!(4410));
        assert_eq!(round(dec!(-0.5), RoundingMode::Floor), dec!(-1));
    }

    #[test]
    fn test_ceil() {
        assert_eq!(round(dec!(4410.01), RoundingMode::Ceil), dec!(4411));
        assert_eq!(round(dec!(4410), RoundingMode::Ceil), dec!(4410));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round(dec!(2.5), RoundingMode::Round), dec!(3));
        assert_eq!(round(dec!(3.5), RoundingMode::Round), dec!(4));
        assert_eq!(round(dec!(2.49), RoundingMode::Round), dec!(2));
    }

    #[test]
    fn test_from_str_round_trip() {
        for mode in RoundingMode::ALL {
            assert_eq!(mode.as_str().parse::<RoundingMode>().unwrap(), mode);
        }
        assert!("truncate".parse::<RoundingMode>().unwrap_err().is_configuration());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&RoundingMode::Ceil).unwrap(), "\"ceil\"");
        let mode: RoundingMode = serde_json::from_str("\"floor\"").unwrap();
        assert_eq!(mode, RoundingMode::Floor);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn rounding_is_idempotent(
            mantissa in 0i64..10_000_000_000i64,
            scale in 0u32..6u32,
            mode in prop::sample::select(RoundingMode::ALL.to_vec())
        ) {
            let value = Decimal::new(mantissa, scale);
            let once = round(value, mode);

            prop_assert_eq!(round(once, mode), once);
            prop_assert!(once.fract().is_zero());
        }

        #[test]
        fn floor_and_ceil_bracket_the_value(
            mantissa in 0i64..10_000_000_000i64,
            scale in 0u32..6u32
        ) {
            let value = Decimal::new(mantissa, scale);
            let floor = round(value, RoundingMode::Floor);
            let ceil = round(value, RoundingMode::Ceil);

            prop_assert!(floor <= value && value <= ceil);
            prop_assert!(ceil - floor <= Decimal::ONE);
        }
    }
}
