//! Multi-farmer allocation
//!
//! One buyer purchases from several farmers in a single transaction. Each
//! farmer's bags are settled on their own under the transaction's shared
//! policy, so a farmer's payable amount depends only on that farmer's bags.
//! The transaction summary is derived afterwards as a plain sum.

use chrono::{DateTime, Utc};
use core_kernel::{BillId, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bag::{Bag, BagWeighing};
use crate::bill::{generate_bill_number, require_name, sum_weights, BillAssembler};
use crate::error::SettlementError;
use crate::policy::SettlementPolicy;

/// One farmer's weighings within a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerBagGroup {
    pub farmer_name: String,
    pub weighings: Vec<BagWeighing>,
}

impl FarmerBagGroup {
    pub fn new(farmer_name: impl Into<String>, weighings: Vec<BagWeighing>) -> Self {
        Self {
            farmer_name: farmer_name.into(),
            weighings,
        }
    }
}

/// Ordered mapping from farmer to weighings
///
/// Farmer names are non-blank and unique; insertion order is preserved and
/// becomes the order of the bill's partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FarmerBagGroup>", into = "Vec<FarmerBagGroup>")]
pub struct FarmerBagGroups {
    groups: Vec<FarmerBagGroup>,
}

impl FarmerBagGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a farmer's weighings
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is blank or already present.
    pub fn insert(
        &mut self,
        farmer_name: impl Into<String>,
        weighings: Vec<BagWeighing>,
    ) -> Result<(), SettlementError> {
        let farmer_name = farmer_name.into();
        require_name("farmer name", &farmer_name)?;
        if self.get(&farmer_name).is_some() {
            return Err(SettlementError::validation(format!(
                "farmer '{}' is listed more than once",
                farmer_name
            )));
        }
        self.groups.push(FarmerBagGroup::new(farmer_name, weighings));
        Ok(())
    }

    /// Builder-style insert
    pub fn with_farmer(
        mut self,
        farmer_name: impl Into<String>,
        weighings: Vec<BagWeighing>,
    ) -> Result<Self, SettlementError> {
        self.insert(farmer_name, weighings)?;
        Ok(self)
    }

    pub fn get(&self, farmer_name: &str) -> Option<&[BagWeighing]> {
        self.groups
            .iter()
            .find(|g| g.farmer_name == farmer_name)
            .map(|g| g.weighings.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FarmerBagGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl TryFrom<Vec<FarmerBagGroup>> for FarmerBagGroups {
    type Error = SettlementError;

    fn try_from(groups: Vec<FarmerBagGroup>) -> Result<Self, Self::Error> {
        groups
            .into_iter()
            .try_fold(FarmerBagGroups::new(), |acc, g| acc.with_farmer(g.farmer_name, g.weighings))
    }
}

impl From<FarmerBagGroups> for Vec<FarmerBagGroup> {
    fn from(groups: FarmerBagGroups) -> Self {
        groups.groups
    }
}

/// One farmer's independently computed share of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerSettlement {
    pub farmer_name: String,
    pub bags: Vec<Bag>,
    pub total_original_weight: Decimal,
    pub total_adjusted_weight: Decimal,
    /// Payable to this farmer
    pub amount: Money,
}

/// Transaction-wide totals, derived from the farmer settlements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub farmer_count: usize,
    pub bag_count: usize,
    pub total_original_weight: Decimal,
    pub total_adjusted_weight: Decimal,
    /// Sum of the farmers' rounded amounts
    pub total_amount: Money,
}

impl TransactionSummary {
    fn from_farmers(
        farmers: &[FarmerSettlement],
        policy: &SettlementPolicy,
    ) -> Result<Self, SettlementError> {
        let total_amount = Money::checked_sum(policy.currency, farmers.iter().map(|f| &f.amount))
            .map_err(|_| SettlementError::overflow("transaction amount"))?;

        Ok(Self {
            farmer_count: farmers.len(),
            bag_count: farmers.iter().map(|f| f.bags.len()).sum(),
            total_original_weight: sum_weights(farmers.iter().map(|f| f.total_original_weight))?,
            total_adjusted_weight: sum_weights(farmers.iter().map(|f| f.total_adjusted_weight))?,
            total_amount,
        })
    }
}

/// A bill whose bags are partitioned by farmer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiFarmerBill {
    pub id: BillId,
    pub bill_number: String,
    pub buyer_name: String,
    pub commodity: String,
    /// Shared by every partition
    pub policy: SettlementPolicy,
    /// Partitions in the order the farmers were given
    pub farmers: Vec<FarmerSettlement>,
    pub summary: TransactionSummary,
    pub created_at: DateTime<Utc>,
}

impl MultiFarmerBill {
    pub fn farmer(&self, farmer_name: &str) -> Option<&FarmerSettlement> {
        self.farmers.iter().find(|f| f.farmer_name == farmer_name)
    }

    /// Every bag across all partitions
    pub fn bags(&self) -> impl Iterator<Item = &Bag> {
        self.farmers.iter().flat_map(|f| f.bags.iter())
    }

    /// Re-checks partition totals and the summary against the bags
    pub fn verify(&self) -> Result<(), SettlementError> {
        let assembler = BillAssembler::new(self.policy);
        for farmer in &self.farmers {
            let weighings: Vec<BagWeighing> = farmer
                .bags
                .iter()
                .map(|b| BagWeighing {
                    bag_number: b.bag_number,
                    original_weight: b.original_weight,
                    notes: b.notes.clone(),
                })
                .collect();
            let recomputed = assembler.settle(self.id, &farmer.farmer_name, &weighings)?;
            if recomputed.total_adjusted_weight != farmer.total_adjusted_weight
                || recomputed.total_original_weight != farmer.total_original_weight
                || recomputed.amount != farmer.amount
            {
                return Err(SettlementError::validation(format!(
                    "partition for '{}' does not match its bags",
                    farmer.farmer_name
                )));
            }
        }
        if TransactionSummary::from_farmers(&self.farmers, &self.policy)? != self.summary {
            return Err(SettlementError::validation(format!(
                "summary of {} does not match its partitions",
                self.bill_number
            )));
        }
        Ok(())
    }
}

/// Splits a transaction across farmers under one shared policy
#[derive(Debug, Clone, Copy)]
pub struct MultiFarmerAllocator {
    assembler: BillAssembler,
}

impl MultiFarmerAllocator {
    pub fn new(policy: SettlementPolicy) -> Self {
        Self {
            assembler: BillAssembler::new(policy),
        }
    }

    /// Settles every farmer's bags and builds the consolidated bill
    ///
    /// # Errors
    ///
    /// Returns a validation error, and no bill, if the mapping is empty, the
    /// buyer or commodity is blank, or any single farmer's weighings fail
    /// validation.
    pub fn allocate(
        &self,
        groups: &FarmerBagGroups,
        buyer_name: impl Into<String>,
        commodity: impl Into<String>,
    ) -> Result<MultiFarmerBill, SettlementError> {
        let buyer_name = buyer_name.into();
        let commodity = commodity.into();
        require_name("buyer name", &buyer_name)?;
        require_name("commodity", &commodity)?;
        if groups.is_empty() {
            return Err(SettlementError::validation("multi-farmer bill has no farmers"));
        }

        let id = BillId::new_v7();
        let policy = *self.assembler.policy();

        let farmers = groups
            .iter()
            .map(|group| {
                let context = format!("farmer '{}'", group.farmer_name);
                let settled = self.assembler.settle(id, &context, &group.weighings)?;
                Ok(FarmerSettlement {
                    farmer_name: group.farmer_name.clone(),
                    bags: settled.bags,
                    total_original_weight: settled.total_original_weight,
                    total_adjusted_weight: settled.total_adjusted_weight,
                    amount: settled.amount,
                })
            })
            .collect::<Result<Vec<_>, SettlementError>>()?;

        let summary = TransactionSummary::from_farmers(&farmers, &policy)?;

        debug!(
            bill_id = %id,
            farmers = summary.farmer_count,
            bags = summary.bag_count,
            amount = %summary.total_amount,
            "Allocated multi-farmer bill"
        );

        Ok(MultiFarmerBill {
            id,
            bill_number: generate_bill_number("MFB", id),
            buyer_name,
            commodity,
            policy,
            farmers,
            summary,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounding::RoundingMode;
    use crate::weight::DeductionPerBag;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn allocator() -> MultiFarmerAllocator {
        MultiFarmerAllocator::new(
            SettlementPolicy::new(DeductionPerBag::Zero, dec!(3000), RoundingMode::Floor, Currency::INR)
                .unwrap(),
        )
    }

    fn groups() -> FarmerBagGroups {
        FarmerBagGroups::new()
            .with_farmer("A", vec![BagWeighing::new(1, dec!(60)), BagWeighing::new(2, dec!(40))])
            .unwrap()
            .with_farmer("B", vec![BagWeighing::new(1, dec!(50))])
            .unwrap()
    }

    #[test]
    fn test_two_farmer_allocation() {
        let bill = allocator().allocate(&groups(), "Buyer", "Paddy").unwrap();

        assert_eq!(bill.farmer("A").unwrap().amount.amount(), dec!(3000));
        assert_eq!(bill.farmer("B").unwrap().amount.amount(), dec!(1500));
        assert_eq!(bill.summary.total_amount.amount(), dec!(4500));
        assert_eq!(bill.summary.bag_count, 3);
        assert!(bill.bags().all(|b| b.bill_id == bill.id));
        assert!(bill.verify().is_ok());
    }

    #[test]
    fn test_duplicate_farmer_rejected() {
        let err = groups().with_farmer("A", vec![BagWeighing::new(9, dec!(1))]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_empty_mapping_rejected() {
        let err = allocator().allocate(&FarmerBagGroups::new(), "Buyer", "Paddy").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_one_bad_farmer_fails_everything() {
        let groups = groups().with_farmer("C", vec![]).unwrap();
        let err = allocator().allocate(&groups, "Buyer", "Paddy").unwrap_err();
        assert!(err.to_string().contains("farmer 'C'"));
    }

    #[test]
    fn test_groups_deserialize_rejects_duplicates() {
        let json = r#"[
            {"farmer_name": "A", "weighings": [{"bag_number": 1, "original_weight": "10"}]},
            {"farmer_name": "A", "weighings": [{"bag_number": 2, "original_weight": "10"}]}
        ]"#;
        assert!(serde_json::from_str::<FarmerBagGroups>(json).is_err());
    }
}
