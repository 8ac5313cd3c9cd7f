//! Frozen settlement policy
//!
//! A `SettlementPolicy` is the resolved `(deduction, rate, rounding)` triple a
//! bill was computed with. It is copied by value out of a settings snapshot
//! at creation time and stored on the bill, so later settings changes never
//! alter an existing bill.

use core_kernel::{Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SettlementError;
use crate::rate::{compute_amount, RatePer100Kg};
use crate::rounding::RoundingMode;
use crate::weight::{self, DeductionPerBag};

/// Resolved, immutable policy values for one bill or transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPolicy {
    pub deduction_per_bag: DeductionPerBag,
    pub rate_per_100kg: RatePer100Kg,
    pub rounding_mode: RoundingMode,
    #[serde(default)]
    pub currency: Currency,
}

impl SettlementPolicy {
    /// Builds a policy from raw values
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the rate is negative.
    pub fn new(
        deduction_per_bag: DeductionPerBag,
        rate_per_100kg: Decimal,
        rounding_mode: RoundingMode,
        currency: Currency,
    ) -> Result<Self, SettlementError> {
        Ok(Self {
            deduction_per_bag,
            rate_per_100kg: RatePer100Kg::new(rate_per_100kg)?,
            rounding_mode,
            currency,
        })
    }

    /// Billable weight of one bag under this policy
    pub fn adjust(&self, original_weight: Decimal) -> Decimal {
        weight::adjust(original_weight, self.deduction_per_bag)
    }

    /// Amount owed for a total adjusted weight under this policy
    pub fn amount_for(&self, total_adjusted_kg: Decimal) -> Result<Money, SettlementError> {
        let amount = compute_amount(total_adjusted_kg, self.rate_per_100kg, self.rounding_mode)?;
        Ok(Money::new(amount, self.currency))
    }

    /// Applies caller overrides on top of this policy
    pub fn with_overrides(mut self, overrides: &PolicyOverrides) -> Result<Self, SettlementError> {
        if let Some(deduction) = overrides.deduction_per_bag {
            self.deduction_per_bag = deduction;
        }
        if let Some(rate) = overrides.rate_per_100kg {
            self.rate_per_100kg = RatePer100Kg::new(rate)?;
        }
        Ok(self)
    }
}

/// Per-bill values that take precedence over the settings defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    #[serde(default)]
    pub deduction_per_bag: Option<DeductionPerBag>,
    #[serde(default)]
    pub rate_per_100kg: Option<Decimal>,
}

impl PolicyOverrides {
    pub fn is_empty(&self) -> bool {
        self.deduction_per_bag.is_none() && self.rate_per_100kg.is_none()
    }
}
