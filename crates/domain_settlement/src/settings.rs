//! Process-wide settlement settings
//!
//! There is a single active settings record. It is only ever read as a
//! snapshot: the service fetches it once per operation and resolves a
//! [`SettlementPolicy`] from it, which is then copied onto the bill.

use chrono::{DateTime, Utc};
use core_kernel::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SettlementError;
use crate::policy::{PolicyOverrides, SettlementPolicy};
use crate::rate::RatePer100Kg;
use crate::rounding::RoundingMode;
use crate::weight::DeductionPerBag;

/// The active settings record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSettings {
    /// Deduction applied per bag unless overridden at bill creation
    pub deduction_per_bag_default: DeductionPerBag,
    pub rounding_mode: RoundingMode,
    /// Default price per 100 kg of adjusted weight
    pub default_rate_per_100kg: Decimal,
    #[serde(default)]
    pub currency: Currency,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            deduction_per_bag_default: DeductionPerBag::One,
            rounding_mode: RoundingMode::Round,
            default_rate_per_100kg: Decimal::ZERO,
            currency: Currency::INR,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }
}

impl SettlementSettings {
    /// Creates validated settings
    pub fn new(
        deduction_per_bag_default: DeductionPerBag,
        rounding_mode: RoundingMode,
        default_rate_per_100kg: Decimal,
    ) -> Result<Self, SettlementError> {
        let settings = Self {
            deduction_per_bag_default,
            rounding_mode,
            default_rate_per_100kg,
            ..Default::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Sets the currency amounts are denominated in
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Checks the values an administrator may set
    pub fn validate(&self) -> Result<(), SettlementError> {
        RatePer100Kg::new(self.default_rate_per_100kg).map(|_| ())
    }

    /// Resolves the policy a new bill will be frozen with
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the default rate or an overriding
    /// rate is negative.
    pub fn resolve_policy(
        &self,
        overrides: &PolicyOverrides,
    ) -> Result<SettlementPolicy, SettlementError> {
        SettlementPolicy::new(
            self.deduction_per_bag_default,
            self.default_rate_per_100kg,
            self.rounding_mode,
            self.currency,
        )?
        .with_overrides(overrides)
    }
}
