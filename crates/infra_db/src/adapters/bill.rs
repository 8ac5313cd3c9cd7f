//! PostgreSQL Bill Adapter
//!
//! Implements `BillRepositoryPort` on top of [`BillRepository`]. Every bill
//! read back from the database is re-verified against its own bags before it
//! is handed to the domain, so a row edited behind the engine's back is
//! reported instead of served.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    BagId, BillId, DomainPort, HealthCheckResult, HealthCheckable, Money, OperationMetadata,
    PortError,
};
use domain_settlement::{
    Bag, Bill, BillQuery, BillRepositoryPort, FarmerSettlement, MultiFarmerBill,
    SettlementPolicy, TransactionSummary,
};

use super::{check_pool, deduction_to_db, policy_from_db};
use crate::error::DatabaseError;
use crate::repositories::bill::{
    BagRow, BillFilter, BillRepository, BillRow, FarmerPartitionRow, MultiFarmerBillRow,
};

/// Page size used when a query gives no limit
const DEFAULT_PAGE_SIZE: i64 = 100;

/// PostgreSQL-backed implementation of the BillRepositoryPort trait
#[derive(Debug, Clone)]
pub struct PostgresBillAdapter {
    repository: BillRepository,
    pool: PgPool,
}

impl PostgresBillAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &BillRepository {
        &self.repository
    }
}

impl DomainPort for PostgresBillAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBillAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-bill-adapter").await
    }
}

#[async_trait]
impl BillRepositoryPort for PostgresBillAdapter {
    #[instrument(skip(self, bill, _metadata), fields(bill_id = %bill.id))]
    async fn save_bill(
        &self,
        bill: &Bill,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let (row, bags) = bill_to_rows(bill).map_err(|e| e.into_port_error("Bill", bill.id))?;
        self.repository
            .insert_bill(&row, &bags)
            .await
            .map_err(|e| e.into_port_error("Bill", bill.id))
    }

    #[instrument(skip(self, _metadata), fields(bill_id = %id))]
    async fn get_bill(
        &self,
        id: BillId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Bill, PortError> {
        debug!("Fetching bill by ID");

        self.repository
            .get_bill(*id.as_uuid())
            .await
            .and_then(|(row, bags)| rows_to_bill(row, bags))
            .map_err(|e| e.into_port_error("Bill", id))
    }

    #[instrument(skip(self, bill, _metadata), fields(bill_id = %bill.id))]
    async fn replace_bill(
        &self,
        bill: &Bill,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let (row, bags) = bill_to_rows(bill).map_err(|e| e.into_port_error("Bill", bill.id))?;
        self.repository
            .replace_bill(&row, &bags)
            .await
            .map_err(|e| e.into_port_error("Bill", bill.id))
    }

    #[instrument(skip(self, _metadata), fields(bill_id = %id))]
    async fn delete_bill(
        &self,
        id: BillId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.repository
            .delete_bill(*id.as_uuid())
            .await
            .map_err(|e| e.into_port_error("Bill", id))
    }

    #[instrument(skip(self, _metadata))]
    async fn find_bills(
        &self,
        query: BillQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Bill>, PortError> {
        debug!("Finding bills with query: {:?}", query);

        let filter = BillFilter {
            buyer_name: query.buyer_name,
            seller_name: query.seller_name,
            commodity: query.commodity,
            limit: query.limit.map_or(DEFAULT_PAGE_SIZE, i64::from),
            offset: query.offset.map_or(0, i64::from),
        };

        self.repository
            .find_bills(&filter)
            .await
            .and_then(|rows| {
                rows.into_iter()
                    .map(|(row, bags)| rows_to_bill(row, bags))
                    .collect()
            })
            .map_err(|e| e.into_port_error("Bill", "query"))
    }

    #[instrument(skip(self, bill, _metadata), fields(bill_id = %bill.id, farmers = bill.farmers.len()))]
    async fn save_multi_farmer_bill(
        &self,
        bill: &MultiFarmerBill,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let (row, partitions, bags) = multi_farmer_bill_to_rows(bill)
            .map_err(|e| e.into_port_error("MultiFarmerBill", bill.id))?;
        self.repository
            .insert_multi_farmer_bill(&row, &partitions, &bags)
            .await
            .map_err(|e| e.into_port_error("MultiFarmerBill", bill.id))
    }

    #[instrument(skip(self, _metadata), fields(bill_id = %id))]
    async fn get_multi_farmer_bill(
        &self,
        id: BillId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<MultiFarmerBill, PortError> {
        self.repository
            .get_multi_farmer_bill(*id.as_uuid())
            .await
            .and_then(|(row, partitions, bags)| rows_to_multi_farmer_bill(row, partitions, bags))
            .map_err(|e| e.into_port_error("MultiFarmerBill", id))
    }

    #[instrument(skip(self, _metadata), fields(bill_id = %id))]
    async fn delete_multi_farmer_bill(
        &self,
        id: BillId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.repository
            .delete_multi_farmer_bill(*id.as_uuid())
            .await
            .map_err(|e| e.into_port_error("MultiFarmerBill", id))
    }
}

// ============================================================================
// Domain -> row
// ============================================================================

/// Narrows a count or position to an INTEGER column
fn to_db_int(field: &str, value: usize) -> Result<i32, DatabaseError> {
    i32::try_from(value).map_err(|_| {
        DatabaseError::ConstraintViolation(format!("{} {} exceeds the storable range", field, value))
    })
}

/// Widens a stored INTEGER back to a count or position
fn from_db_int(entity: &str, id: uuid::Uuid, field: &str, value: i32) -> Result<usize, DatabaseError> {
    usize::try_from(value).map_err(|_| DatabaseError::corrupt(entity, id, format!("negative {}", field)))
}

fn bag_to_row(bag: &Bag, farmer_position: Option<i32>, position: usize) -> Result<BagRow, DatabaseError> {
    Ok(BagRow {
        bag_id: *bag.id.as_uuid(),
        bill_id: *bag.bill_id.as_uuid(),
        farmer_position,
        position: to_db_int("bag position", position)?,
        bag_number: i64::from(bag.bag_number),
        original_weight: bag.original_weight,
        adjusted_weight: bag.adjusted_weight,
        notes: bag.notes.clone(),
    })
}

fn bill_to_rows(bill: &Bill) -> Result<(BillRow, Vec<BagRow>), DatabaseError> {
    let row = BillRow {
        bill_id: *bill.id.as_uuid(),
        bill_number: bill.bill_number.clone(),
        buyer_name: bill.buyer_name.clone(),
        seller_name: bill.seller_name.clone(),
        commodity: bill.commodity.clone(),
        deduction_per_bag: deduction_to_db(bill.policy.deduction_per_bag),
        rate_per_100kg: bill.policy.rate_per_100kg.value(),
        rounding_mode: bill.policy.rounding_mode.as_str().to_string(),
        currency: bill.policy.currency.code().to_string(),
        total_original_weight: bill.total_original_weight,
        total_adjusted_weight: bill.total_adjusted_weight,
        total_amount: bill.total_amount.amount(),
        created_at: bill.created_at,
        updated_at: bill.updated_at,
    };
    let bags = bill
        .bags
        .iter()
        .enumerate()
        .map(|(i, bag)| bag_to_row(bag, None, i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((row, bags))
}

fn multi_farmer_bill_to_rows(
    bill: &MultiFarmerBill,
) -> Result<(MultiFarmerBillRow, Vec<FarmerPartitionRow>, Vec<BagRow>), DatabaseError> {
    let row = MultiFarmerBillRow {
        bill_id: *bill.id.as_uuid(),
        bill_number: bill.bill_number.clone(),
        buyer_name: bill.buyer_name.clone(),
        commodity: bill.commodity.clone(),
        deduction_per_bag: deduction_to_db(bill.policy.deduction_per_bag),
        rate_per_100kg: bill.policy.rate_per_100kg.value(),
        rounding_mode: bill.policy.rounding_mode.as_str().to_string(),
        currency: bill.policy.currency.code().to_string(),
        farmer_count: to_db_int("farmer count", bill.summary.farmer_count)?,
        bag_count: to_db_int("bag count", bill.summary.bag_count)?,
        total_original_weight: bill.summary.total_original_weight,
        total_adjusted_weight: bill.summary.total_adjusted_weight,
        total_amount: bill.summary.total_amount.amount(),
        created_at: bill.created_at,
    };

    let mut partitions = Vec::with_capacity(bill.farmers.len());
    let mut bags = Vec::with_capacity(bill.summary.bag_count);
    for (p, farmer) in bill.farmers.iter().enumerate() {
        let position = to_db_int("farmer position", p)?;
        partitions.push(FarmerPartitionRow {
            bill_id: row.bill_id,
            position,
            farmer_name: farmer.farmer_name.clone(),
            total_original_weight: farmer.total_original_weight,
            total_adjusted_weight: farmer.total_adjusted_weight,
            amount: farmer.amount.amount(),
        });
        for (i, bag) in farmer.bags.iter().enumerate() {
            bags.push(bag_to_row(bag, Some(position), i)?);
        }
    }
    Ok((row, partitions, bags))
}

// ============================================================================
// Row -> domain
// ============================================================================

fn row_to_bag(row: BagRow) -> Result<Bag, DatabaseError> {
    let bag_number = u32::try_from(row.bag_number)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| DatabaseError::corrupt("Bag", row.bag_id, "bag number out of range"))?;
    Ok(Bag {
        id: BagId::from_uuid(row.bag_id),
        bill_id: BillId::from_uuid(row.bill_id),
        bag_number,
        original_weight: row.original_weight,
        adjusted_weight: row.adjusted_weight,
        notes: row.notes,
    })
}

fn rows_to_bill(row: BillRow, bags: Vec<BagRow>) -> Result<Bill, DatabaseError> {
    let policy = policy_from_db(
        "Bill",
        row.bill_id,
        row.deduction_per_bag,
        row.rate_per_100kg,
        &row.rounding_mode,
        &row.currency,
    )?;
    let bags = bags.into_iter().map(row_to_bag).collect::<Result<Vec<_>, _>>()?;

    let bill = Bill {
        id: BillId::from_uuid(row.bill_id),
        bill_number: row.bill_number,
        buyer_name: row.buyer_name,
        seller_name: row.seller_name,
        commodity: row.commodity,
        policy,
        bags,
        total_original_weight: row.total_original_weight,
        total_adjusted_weight: row.total_adjusted_weight,
        total_amount: Money::new(row.total_amount, policy.currency),
        created_at: row.created_at,
        updated_at: row.updated_at,
    };

    bill.verify()
        .map_err(|e| DatabaseError::corrupt("Bill", row.bill_id, e))?;
    Ok(bill)
}

fn rows_to_multi_farmer_bill(
    row: MultiFarmerBillRow,
    partitions: Vec<FarmerPartitionRow>,
    bags: Vec<BagRow>,
) -> Result<MultiFarmerBill, DatabaseError> {
    let policy = policy_from_db(
        "MultiFarmerBill",
        row.bill_id,
        row.deduction_per_bag,
        row.rate_per_100kg,
        &row.rounding_mode,
        &row.currency,
    )?;

    let mut farmers: Vec<FarmerSettlement> = partitions
        .into_iter()
        .map(|p| FarmerSettlement {
            farmer_name: p.farmer_name,
            bags: Vec::new(),
            total_original_weight: p.total_original_weight,
            total_adjusted_weight: p.total_adjusted_weight,
            amount: Money::new(p.amount, policy.currency),
        })
        .collect();

    for bag in bags {
        let slot = bag
            .farmer_position
            .and_then(|p| usize::try_from(p).ok())
            .and_then(|p| farmers.get_mut(p))
            .ok_or_else(|| {
                DatabaseError::corrupt("MultiFarmerBill", row.bill_id, "bag without a farmer partition")
            })?;
        slot.bags.push(row_to_bag(bag)?);
    }

    let bill = MultiFarmerBill {
        id: BillId::from_uuid(row.bill_id),
        bill_number: row.bill_number,
        buyer_name: row.buyer_name,
        commodity: row.commodity,
        policy,
        farmers,
        summary: TransactionSummary {
            farmer_count: from_db_int("MultiFarmerBill", row.bill_id, "farmer count", row.farmer_count)?,
            bag_count: from_db_int("MultiFarmerBill", row.bill_id, "bag count", row.bag_count)?,
            total_original_weight: row.total_original_weight,
            total_adjusted_weight: row.total_adjusted_weight,
            total_amount: Money::new(row.total_amount, policy.currency),
        },
        created_at: row.created_at,
    };

    bill.verify()
        .map_err(|e| DatabaseError::corrupt("MultiFarmerBill", row.bill_id, e))?;
    Ok(bill)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use domain_settlement::{
        BagWeighing, BillAssembler, BillHeader, DeductionPerBag, FarmerBagGroups,
        MultiFarmerAllocator, RoundingMode,
    };
    use rust_decimal_macros::dec;

    fn policy() -> SettlementPolicy {
        SettlementPolicy::new(DeductionPerBag::One, dec!(3000), RoundingMode::Round, Currency::INR)
            .unwrap()
    }

    fn bill() -> Bill {
        BillAssembler::new(policy())
            .assemble(
                BillHeader::new("Buyer", "Ramesh", "Wheat"),
                &[
                    BagWeighing::new(1, dec!(50)),
                    BagWeighing::new(2, dec!(48)).with_notes("wet"),
                ],
            )
            .unwrap()
    }

    #[test]
    fn test_bill_rows_round_trip() {
        let bill = bill();
        let (row, bags) = bill_to_rows(&bill).unwrap();

        assert_eq!(row.deduction_per_bag, 1);
        assert_eq!(row.rounding_mode, "round");
        assert_eq!(bags[1].position, 1);
        assert!(bags.iter().all(|b| b.farmer_position.is_none()));

        assert_eq!(rows_to_bill(row, bags).unwrap(), bill);
    }

    #[test]
    fn test_tampered_total_is_rejected() {
        let (mut row, bags) = bill_to_rows(&bill()).unwrap();
        row.total_amount = dec!(1);
        assert!(matches!(rows_to_bill(row, bags), Err(DatabaseError::CorruptRow(_))));
    }

    #[test]
    fn test_multi_farmer_rows_round_trip() {
        let groups = FarmerBagGroups::new()
            .with_farmer("A", vec![BagWeighing::new(1, dec!(60)), BagWeighing::new(2, dec!(40))])
            .unwrap()
            .with_farmer("B", vec![BagWeighing::new(1, dec!(50))])
            .unwrap();
        let bill = MultiFarmerAllocator::new(policy())
            .allocate(&groups, "Buyer", "Paddy")
            .unwrap();

        let (row, partitions, bags) = multi_farmer_bill_to_rows(&bill).unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(bags.iter().filter(|b| b.farmer_position == Some(0)).count(), 2);

        assert_eq!(rows_to_multi_farmer_bill(row, partitions, bags).unwrap(), bill);
    }

    #[test]
    fn test_bag_numbers_above_i32_are_stored_intact() {
        let bill = BillAssembler::new(policy())
            .assemble(
                BillHeader::new("Buyer", "Ramesh", "Wheat"),
                &[BagWeighing::new(3_000_000_000, dec!(50)), BagWeighing::new(u32::MAX, dec!(40))],
            )
            .unwrap();

        let (row, bags) = bill_to_rows(&bill).unwrap();
        assert_eq!(bags[0].bag_number, 3_000_000_000);
        assert_eq!(bags[1].bag_number, i64::from(u32::MAX));

        let loaded = rows_to_bill(row, bags).unwrap();
        assert_eq!(loaded.bags[0].bag_number, 3_000_000_000);
        assert_eq!(loaded, bill);
    }

    #[test]
    fn test_out_of_range_stored_bag_number_is_corrupt() {
        for stored in [0, -1, i64::from(u32::MAX) + 1] {
            let (row, mut bags) = bill_to_rows(&bill()).unwrap();
            bags[0].bag_number = stored;
            assert!(
                matches!(rows_to_bill(row, bags), Err(DatabaseError::CorruptRow(_))),
                "bag number {stored} accepted"
            );
        }
    }

    #[test]
    fn test_oversized_count_is_a_constraint_violation() {
        let too_many = usize::try_from(i64::from(i32::MAX) + 1).unwrap();
        let err = to_db_int("bag count", too_many).unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(matches!(err.into_port_error("Bill", "x"), PortError::Validation { .. }));
        assert_eq!(to_db_int("bag count", 7).unwrap(), 7);
    }

    #[test]
    fn test_negative_stored_count_is_corrupt() {
        let err = from_db_int("MultiFarmerBill", uuid::Uuid::nil(), "bag count", -3).unwrap_err();
        assert!(matches!(err, DatabaseError::CorruptRow(_)));
    }
}
