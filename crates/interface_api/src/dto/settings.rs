//! Settings DTOs

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use core_kernel::Currency;
use domain_settlement::{DeductionPerBag, RoundingMode, SettlementSettings};

/// Body of `PUT /settings`
///
/// The audit fields are filled in by the server.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub deduction_per_bag_default: DeductionPerBag,
    pub rounding_mode: RoundingMode,
    pub default_rate_per_100kg: Decimal,
    #[serde(default)]
    pub currency: Option<Currency>,
}

impl UpdateSettingsRequest {
    /// Unvalidated settings record; the service validates before storing
    pub fn into_settings(self, current_currency: Currency) -> SettlementSettings {
        SettlementSettings {
            deduction_per_bag_default: self.deduction_per_bag_default,
            rounding_mode: self.rounding_mode,
            default_rate_per_100kg: self.default_rate_per_100kg,
            currency: self.currency.unwrap_or(current_currency),
            updated_at: Utc::now(),
            updated_by: None,
        }
    }
}
