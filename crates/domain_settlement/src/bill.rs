//! Bill assembly
//!
//! `BillAssembler` turns an ordered set of weighings into a [`Bill`] under a
//! frozen [`SettlementPolicy`]. Assembly is all-or-nothing: every weighing is
//! validated before any bag is built, and a failure returns no bill at all.

use chrono::{DateTime, Utc};
use core_kernel::{BagId, BillId, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bag::{validate_weighings, Bag, BagWeighing};
use crate::error::SettlementError;
use crate::policy::SettlementPolicy;

/// Parties and commodity of a single-farmer bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillHeader {
    pub buyer_name: String,
    pub seller_name: String,
    pub commodity: String,
}

impl BillHeader {
    pub fn new(
        buyer_name: impl Into<String>,
        seller_name: impl Into<String>,
        commodity: impl Into<String>,
    ) -> Self {
        Self {
            buyer_name: buyer_name.into(),
            seller_name: seller_name.into(),
            commodity: commodity.into(),
        }
    }

    fn validate(&self) -> Result<(), SettlementError> {
        require_name("buyer name", &self.buyer_name)?;
        require_name("seller name", &self.seller_name)?;
        require_name("commodity", &self.commodity)
    }
}

pub(crate) fn require_name(field: &str, value: &str) -> Result<(), SettlementError> {
    if value.trim().is_empty() {
        return Err(SettlementError::validation(format!("{} must not be blank", field)));
    }
    Ok(())
}

/// A finalized settlement between one buyer and one farmer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    /// Human-readable bill number
    pub bill_number: String,
    pub buyer_name: String,
    pub seller_name: String,
    pub commodity: String,
    /// Policy values frozen at creation
    pub policy: SettlementPolicy,
    /// Non-empty, in weighing order
    pub bags: Vec<Bag>,
    pub total_original_weight: Decimal,
    pub total_adjusted_weight: Decimal,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    pub fn bag_count(&self) -> usize {
        self.bags.len()
    }

    pub fn header(&self) -> BillHeader {
        BillHeader::new(&self.buyer_name, &self.seller_name, &self.commodity)
    }

    /// Weighings that would reproduce this bill's bags
    pub fn weighings(&self) -> Vec<BagWeighing> {
        self.bags
            .iter()
            .map(|bag| BagWeighing {
                bag_number: bag.bag_number,
                original_weight: bag.original_weight,
                notes: bag.notes.clone(),
            })
            .collect()
    }

    /// Re-checks the invariants between the bags and the totals
    ///
    /// Used when a bill is loaded from storage.
    pub fn verify(&self) -> Result<(), SettlementError> {
        let recomputed = BillAssembler::new(self.policy).settle(self.id, "bill", &self.weighings())?;
        if recomputed.bags.iter().zip(&self.bags).any(|(a, b)| a.adjusted_weight != b.adjusted_weight)
            || recomputed.total_original_weight != self.total_original_weight
            || recomputed.total_adjusted_weight != self.total_adjusted_weight
            || recomputed.amount != self.total_amount
        {
            return Err(SettlementError::validation(format!(
                "bill {} totals do not match its bags",
                self.bill_number
            )));
        }
        Ok(())
    }
}

/// Bags and totals for one ordered weighing set settled under one policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagSettlement {
    pub bags: Vec<Bag>,
    pub total_original_weight: Decimal,
    pub total_adjusted_weight: Decimal,
    pub amount: Money,
}

/// Builds bills under a fixed policy
#[derive(Debug, Clone, Copy)]
pub struct BillAssembler {
    policy: SettlementPolicy,
}

impl BillAssembler {
    pub fn new(policy: SettlementPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SettlementPolicy {
        &self.policy
    }

    /// Assembles a new bill
    ///
    /// # Errors
    ///
    /// Returns a validation error when the weighings are empty, a bag number
    /// repeats or is zero, a weight is negative, or a header field is blank.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_kernel::Currency;
    /// use domain_settlement::{BagWeighing, BillAssembler, BillHeader, DeductionPerBag, RoundingMode, SettlementPolicy};
    /// use rust_decimal_macros::dec;
    ///
    /// let policy = SettlementPolicy::new(DeductionPerBag::One, dec!(3000), RoundingMode::Round, Currency::INR).unwrap();
    /// let bill = BillAssembler::new(policy)
    ///     .assemble(
    ///         BillHeader::new("Buyer", "Farmer", "Wheat"),
    ///         &[BagWeighing::new(1, dec!(50)), BagWeighing::new(2, dec!(48)), BagWeighing::new(3, dec!(52))],
    ///     )
    ///     .unwrap();
    ///
    /// assert_eq!(bill.total_adjusted_weight, dec!(147));
    /// assert_eq!(bill.total_amount.amount(), dec!(4410));
    /// ```
    pub fn assemble(
        &self,
        header: BillHeader,
        weighings: &[BagWeighing],
    ) -> Result<Bill, SettlementError> {
        header.validate()?;
        let id = BillId::new_v7();
        let context = format!("bill for {}", header.seller_name);
        let settlement = self.settle(id, &context, weighings)?;
        let now = Utc::now();

        debug!(
            bill_id = %id,
            bags = settlement.bags.len(),
            total_adjusted_kg = %settlement.total_adjusted_weight,
            amount = %settlement.amount,
            "Assembled bill"
        );

        Ok(Bill {
            id,
            bill_number: generate_bill_number("BILL", id),
            buyer_name: header.buyer_name,
            seller_name: header.seller_name,
            commodity: header.commodity,
            policy: self.policy,
            bags: settlement.bags,
            total_original_weight: settlement.total_original_weight,
            total_adjusted_weight: settlement.total_adjusted_weight,
            total_amount: settlement.amount,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an existing bill from new weighings
    ///
    /// The bill keeps its id, number and creation time; bags are recomputed
    /// from scratch under this assembler's policy.
    pub fn reassemble(
        &self,
        existing: &Bill,
        header: BillHeader,
        weighings: &[BagWeighing],
    ) -> Result<Bill, SettlementError> {
        header.validate()?;
        let context = format!("bill {}", existing.bill_number);
        let settlement = self.settle(existing.id, &context, weighings)?;

        Ok(Bill {
            id: existing.id,
            bill_number: existing.bill_number.clone(),
            buyer_name: header.buyer_name,
            seller_name: header.seller_name,
            commodity: header.commodity,
            policy: self.policy,
            bags: settlement.bags,
            total_original_weight: settlement.total_original_weight,
            total_adjusted_weight: settlement.total_adjusted_weight,
            total_amount: settlement.amount,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        })
    }

    /// Validates, adjusts and prices one weighing set
    pub fn settle(
        &self,
        bill_id: BillId,
        context: &str,
        weighings: &[BagWeighing],
    ) -> Result<BagSettlement, SettlementError> {
        validate_weighings(context, weighings)?;

        let bags: Vec<Bag> = weighings
            .iter()
            .map(|w| Bag {
                id: BagId::new_v7(),
                bill_id,
                bag_number: w.bag_number,
                original_weight: w.original_weight,
                adjusted_weight: self.policy.adjust(w.original_weight),
                notes: w.notes.clone(),
            })
            .collect();

        let total_original_weight = sum_weights(bags.iter().map(|b| b.original_weight))?;
        let total_adjusted_weight = sum_weights(bags.iter().map(|b| b.adjusted_weight))?;
        let amount = self.policy.amount_for(total_adjusted_weight)?;

        Ok(BagSettlement {
            bags,
            total_original_weight,
            total_adjusted_weight,
            amount,
        })
    }
}

pub(crate) fn sum_weights<I>(weights: I) -> Result<Decimal, SettlementError>
where
    I: IntoIterator<Item = Decimal>,
{
    weights
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, w| acc.checked_add(w))
        .ok_or_else(|| SettlementError::overflow("total weight"))
}

/// Generates a human-readable bill number
///
/// The millisecond stamp keeps numbers in creation order; the tail of the
/// v7 id's random bits separates bills created in the same millisecond.
pub(crate) fn generate_bill_number(prefix: &str, id: BillId) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let simple = id.as_uuid().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        duration.as_millis() % 10_000_000_000,
        simple[simple.len() - 12..].to_ascii_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounding::RoundingMode;
    use crate::weight::DeductionPerBag;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn assembler(deduction: DeductionPerBag) -> BillAssembler {
        BillAssembler::new(
            SettlementPolicy::new(deduction, dec!(3000), RoundingMode::Round, Currency::INR).unwrap(),
        )
    }

    fn header() -> BillHeader {
        BillHeader::new("Sharma Traders", "Ramesh", "Wheat")
    }

    fn weighings() -> Vec<BagWeighing> {
        vec![
            BagWeighing::new(1, dec!(50)),
            BagWeighing::new(2, dec!(48)),
            BagWeighing::new(3, dec!(52)),
        ]
    }

    #[test]
    fn test_assemble_scenario() {
        let bill = assembler(DeductionPerBag::One).assemble(header(), &weighings()).unwrap();

        let adjusted: Vec<Decimal> = bill.bags.iter().map(|b| b.adjusted_weight).collect();
        assert_eq!(adjusted, vec![dec!(49), dec!(47), dec!(51)]);
        assert_eq!(bill.total_original_weight, dec!(150));
        assert_eq!(bill.total_adjusted_weight, dec!(147));
        assert_eq!(bill.total_amount, Money::new(dec!(4410), Currency::INR));
        assert!(bill.bill_number.starts_with("BILL-"));
        assert!(bill.bags.iter().all(|b| b.bill_id == bill.id));
    }

    #[test]
    fn test_back_to_back_bills_get_distinct_numbers() {
        let assembler = assembler(DeductionPerBag::One);
        let first = assembler.assemble(header(), &weighings()).unwrap();
        let second = assembler.assemble(header(), &weighings()).unwrap();

        assert_ne!(first.bill_number, second.bill_number);
        let suffix = first.bill_number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 12);
        assert!(first.id.as_uuid().simple().to_string().ends_with(&suffix.to_ascii_lowercase()));
    }

    #[test]
    fn test_short_bag_floors_at_zero() {
        let mut w = weighings();
        w.push(BagWeighing::new(4, dec!(1.5)));
        let bill = assembler(DeductionPerBag::Two).assemble(header(), &w).unwrap();

        assert_eq!(bill.bags[3].adjusted_weight, Decimal::ZERO);
        assert_eq!(bill.total_adjusted_weight, dec!(144));
    }

    #[test]
    fn test_blank_header_rejected() {
        let err = assembler(DeductionPerBag::One)
            .assemble(BillHeader::new("  ", "Ramesh", "Wheat"), &weighings())
            .unwrap_err();
        assert!(err.to_string().contains("buyer name"));
    }

    #[test]
    fn test_reassemble_keeps_identity() {
        let a = assembler(DeductionPerBag::One);
        let bill = a.assemble(header(), &weighings()).unwrap();
        let edited = a
            .reassemble(&bill, header(), &[BagWeighing::new(1, dec!(101))])
            .unwrap();

        assert_eq!(edited.id, bill.id);
        assert_eq!(edited.bill_number, bill.bill_number);
        assert_eq!(edited.created_at, bill.created_at);
        assert_eq!(edited.total_adjusted_weight, dec!(100));
        assert_eq!(edited.total_amount.amount(), dec!(3000));
    }

    #[test]
    fn test_verify_detects_tampering() {
        let mut bill = assembler(DeductionPerBag::One).assemble(header(), &weighings()).unwrap();
        assert!(bill.verify().is_ok());

        bill.total_adjusted_weight = dec!(150);
        assert!(bill.verify().is_err());
    }
}
