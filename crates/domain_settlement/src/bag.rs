//! Bags and raw weighings

use std::collections::HashSet;

use core_kernel::{BagId, BillId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SettlementError;

/// One weighing as recorded by the admin at intake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagWeighing {
    /// Positive number, unique within the bill
    pub bag_number: u32,
    /// Measured weight in kilograms
    pub original_weight: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BagWeighing {
    pub fn new(bag_number: u32, original_weight: Decimal) -> Self {
        Self {
            bag_number,
            original_weight,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A settled bag belonging to exactly one bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    pub id: BagId,
    pub bill_id: BillId,
    pub bag_number: u32,
    /// Measured weight in kilograms
    pub original_weight: Decimal,
    /// Billable weight in kilograms, never above `original_weight`
    pub adjusted_weight: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Bag {
    /// Weight removed by the deduction
    pub fn deducted_weight(&self) -> Decimal {
        self.original_weight - self.adjusted_weight
    }
}

/// Checks a weighing set before any bag is built
///
/// `context` names the bill or farmer in error messages.
pub fn validate_weighings(context: &str, weighings: &[BagWeighing]) -> Result<(), SettlementError> {
    if weighings.is_empty() {
        return Err(SettlementError::no_bags(context));
    }

    let mut seen = HashSet::with_capacity(weighings.len());
    for weighing in weighings {
        if weighing.bag_number == 0 {
            return Err(SettlementError::validation(format!(
                "{}: bag numbers start at 1",
                context
            )));
        }
        if !seen.insert(weighing.bag_number) {
            return Err(SettlementError::duplicate_bag_number(context, weighing.bag_number));
        }
        if weighing.original_weight.is_sign_negative() && !weighing.original_weight.is_zero() {
            return Err(SettlementError::negative_weight(
                context,
                weighing.bag_number,
                weighing.original_weight,
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_weighings() {
        let weighings = vec![
            BagWeighing::new(1, dec!(50)),
            BagWeighing::new(2, dec!(0)).with_notes("torn sack"),
        ];
        assert!(validate_weighings("bill", &weighings).is_ok());
    }

    #[test]
    fn test_empty_rejected() {
        let err = validate_weighings("bill", &[]).unwrap_err();
        assert!(err.to_string().contains("no bags"));
    }

    #[test]
    fn test_zero_bag_number_rejected() {
        let err = validate_weighings("bill", &[BagWeighing::new(0, dec!(10))]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_duplicate_rejected() {
        let weighings = vec![BagWeighing::new(7, dec!(50)), BagWeighing::new(7, dec!(51))];
        let err = validate_weighings("bill", &weighings).unwrap_err();
        assert!(err.to_string().contains("bag number 7"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = validate_weighings("bill", &[BagWeighing::new(1, dec!(-0.5))]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_weighing_json_notes_optional() {
        let weighing: BagWeighing =
            serde_json::from_str(r#"{"bag_number": 3, "original_weight": "52.5"}"#).unwrap();
        assert_eq!(weighing.notes, None);
        assert_eq!(weighing.original_weight, dec!(52.5));
    }
}
