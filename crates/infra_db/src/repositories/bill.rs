//! Bill repository implementation
//!
//! This module provides database access for single- and multi-farmer bills.
//! A bill row, its farmer partitions and its bags are always written in one
//! transaction so a reader never sees a bill without its bags.
//!
//! Both bill kinds share the `bill_bags` table. Bags of a multi-farmer bill
//! carry the position of the farmer partition they belong to.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for bills and their bags
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: PgPool,
}

/// Filters for listing bills
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub buyer_name: Option<String>,
    pub seller_name: Option<String>,
    pub commodity: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

const BILL_COLUMNS: &str = r#"
    bill_id, bill_number, buyer_name, seller_name, commodity,
    deduction_per_bag, rate_per_100kg, rounding_mode, currency,
    total_original_weight, total_adjusted_weight, total_amount,
    created_at, updated_at
"#;

const BAG_COLUMNS: &str = r#"
    bag_id, bill_id, farmer_position, position, bag_number,
    original_weight, adjusted_weight, notes
"#;

impl BillRepository {
    /// Creates a new BillRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a bill and its bags in a single transaction
    pub async fn insert_bill(&self, bill: &BillRow, bags: &[BagRow]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bills (
                bill_id, bill_number, buyer_name, seller_name, commodity,
                deduction_per_bag, rate_per_100kg, rounding_mode, currency,
                total_original_weight, total_adjusted_weight, total_amount,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(bill.bill_id)
        .bind(&bill.bill_number)
        .bind(&bill.buyer_name)
        .bind(&bill.seller_name)
        .bind(&bill.commodity)
        .bind(bill.deduction_per_bag)
        .bind(bill.rate_per_100kg)
        .bind(&bill.rounding_mode)
        .bind(&bill.currency)
        .bind(bill.total_original_weight)
        .bind(bill.total_adjusted_weight)
        .bind(bill.total_amount)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_bags(&mut tx, bags).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Retrieves a bill with its bags in weighing order
    pub async fn get_bill(&self, bill_id: Uuid) -> Result<(BillRow, Vec<BagRow>), DatabaseError> {
        let bill = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {} FROM bills WHERE bill_id = $1",
            BILL_COLUMNS
        ))
        .bind(bill_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Bill", bill_id))?;

        let bags = self.bags_for(bill_id).await?;
        Ok((bill, bags))
    }

    /// Replaces a bill's header, totals and every bag
    ///
    /// The old bags are deleted and the new ones inserted inside the same
    /// transaction as the header update.
    pub async fn replace_bill(&self, bill: &BillRow, bags: &[BagRow]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE bills SET
                buyer_name = $2, seller_name = $3, commodity = $4,
                deduction_per_bag = $5, rate_per_100kg = $6, rounding_mode = $7, currency = $8,
                total_original_weight = $9, total_adjusted_weight = $10, total_amount = $11,
                updated_at = $12
            WHERE bill_id = $1
            "#,
        )
        .bind(bill.bill_id)
        .bind(&bill.buyer_name)
        .bind(&bill.seller_name)
        .bind(&bill.commodity)
        .bind(bill.deduction_per_bag)
        .bind(bill.rate_per_100kg)
        .bind(&bill.rounding_mode)
        .bind(&bill.currency)
        .bind(bill.total_original_weight)
        .bind(bill.total_adjusted_weight)
        .bind(bill.total_amount)
        .bind(bill.updated_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Bill", bill.bill_id));
        }

        sqlx::query("DELETE FROM bill_bags WHERE bill_id = $1")
            .bind(bill.bill_id)
            .execute(&mut *tx)
            .await?;
        insert_bags(&mut tx, bags).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a bill and its bags
    pub async fn delete_bill(&self, bill_id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM bill_bags WHERE bill_id = $1")
            .bind(bill_id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM bills WHERE bill_id = $1")
            .bind(bill_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Bill", bill_id));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Lists bills newest first
    pub async fn find_bills(&self, filter: &BillFilter) -> Result<Vec<(BillRow, Vec<BagRow>)>, DatabaseError> {
        let bills = sqlx::query_as::<_, BillRow>(&format!(
            r#"
            SELECT {} FROM bills
            WHERE ($1::text IS NULL OR buyer_name = $1)
              AND ($2::text IS NULL OR seller_name = $2)
              AND ($3::text IS NULL OR commodity = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            BILL_COLUMNS
        ))
        .bind(&filter.buyer_name)
        .bind(&filter.seller_name)
        .bind(&filter.commodity)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(bills.len());
        for bill in bills {
            let bags = self.bags_for(bill.bill_id).await?;
            results.push((bill, bags));
        }
        Ok(results)
    }

    /// Inserts a multi-farmer bill with its partitions and bags
    pub async fn insert_multi_farmer_bill(
        &self,
        bill: &MultiFarmerBillRow,
        partitions: &[FarmerPartitionRow],
        bags: &[BagRow],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO multi_farmer_bills (
                bill_id, bill_number, buyer_name, commodity,
                deduction_per_bag, rate_per_100kg, rounding_mode, currency,
                farmer_count, bag_count,
                total_original_weight, total_adjusted_weight, total_amount,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(bill.bill_id)
        .bind(&bill.bill_number)
        .bind(&bill.buyer_name)
        .bind(&bill.commodity)
        .bind(bill.deduction_per_bag)
        .bind(bill.rate_per_100kg)
        .bind(&bill.rounding_mode)
        .bind(&bill.currency)
        .bind(bill.farmer_count)
        .bind(bill.bag_count)
        .bind(bill.total_original_weight)
        .bind(bill.total_adjusted_weight)
        .bind(bill.total_amount)
        .bind(bill.created_at)
        .execute(&mut *tx)
        .await?;

        for partition in partitions {
            sqlx::query(
                r#"
                INSERT INTO farmer_partitions (
                    bill_id, position, farmer_name,
                    total_original_weight, total_adjusted_weight, amount
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(partition.bill_id)
            .bind(partition.position)
            .bind(&partition.farmer_name)
            .bind(partition.total_original_weight)
            .bind(partition.total_adjusted_weight)
            .bind(partition.amount)
            .execute(&mut *tx)
            .await?;
        }

        insert_bags(&mut tx, bags).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Retrieves a multi-farmer bill with partitions and bags
    pub async fn get_multi_farmer_bill(
        &self,
        bill_id: Uuid,
    ) -> Result<(MultiFarmerBillRow, Vec<FarmerPartitionRow>, Vec<BagRow>), DatabaseError> {
        let bill = sqlx::query_as::<_, MultiFarmerBillRow>(
            r#"
            SELECT
                bill_id, bill_number, buyer_name, commodity,
                deduction_per_bag, rate_per_100kg, rounding_mode, currency,
                farmer_count, bag_count,
                total_original_weight, total_adjusted_weight, total_amount,
                created_at
            FROM multi_farmer_bills
            WHERE bill_id = $1
            "#,
        )
        .bind(bill_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("MultiFarmerBill", bill_id))?;

        let partitions = sqlx::query_as::<_, FarmerPartitionRow>(
            r#"
            SELECT bill_id, position, farmer_name,
                   total_original_weight, total_adjusted_weight, amount
            FROM farmer_partitions
            WHERE bill_id = $1
            ORDER BY position
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        let bags = self.bags_for(bill_id).await?;
        Ok((bill, partitions, bags))
    }

    /// Deletes a multi-farmer bill with its partitions and bags
    pub async fn delete_multi_farmer_bill(&self, bill_id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM bill_bags WHERE bill_id = $1")
            .bind(bill_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM farmer_partitions WHERE bill_id = $1")
            .bind(bill_id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM multi_farmer_bills WHERE bill_id = $1")
            .bind(bill_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::not_found("MultiFarmerBill", bill_id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn bags_for(&self, bill_id: Uuid) -> Result<Vec<BagRow>, DatabaseError> {
        let bags = sqlx::query_as::<_, BagRow>(&format!(
            "SELECT {} FROM bill_bags WHERE bill_id = $1 ORDER BY farmer_position NULLS FIRST, position",
            BAG_COLUMNS
        ))
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bags)
    }
}

async fn insert_bags(tx: &mut Transaction<'_, Postgres>, bags: &[BagRow]) -> Result<(), DatabaseError> {
    for bag in bags {
        sqlx::query(
            r#"
            INSERT INTO bill_bags (
                bag_id, bill_id, farmer_position, position, bag_number,
                original_weight, adjusted_weight, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(bag.bag_id)
        .bind(bag.bill_id)
        .bind(bag.farmer_position)
        .bind(bag.position)
        .bind(bag.bag_number)
        .bind(bag.original_weight)
        .bind(bag.adjusted_weight)
        .bind(&bag.notes)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// ============================================================================
// Row types
// ============================================================================

/// Database row for a single-farmer bill
#[derive(Debug, Clone, FromRow)]
pub struct BillRow {
    pub bill_id: Uuid,
    pub bill_number: String,
    pub buyer_name: String,
    pub seller_name: String,
    pub commodity: String,
    pub deduction_per_bag: i16,
    pub rate_per_100kg: Decimal,
    pub rounding_mode: String,
    pub currency: String,
    pub total_original_weight: Decimal,
    pub total_adjusted_weight: Decimal,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a multi-farmer bill header and summary
#[derive(Debug, Clone, FromRow)]
pub struct MultiFarmerBillRow {
    pub bill_id: Uuid,
    pub bill_number: String,
    pub buyer_name: String,
    pub commodity: String,
    pub deduction_per_bag: i16,
    pub rate_per_100kg: Decimal,
    pub rounding_mode: String,
    pub currency: String,
    pub farmer_count: i32,
    pub bag_count: i32,
    pub total_original_weight: Decimal,
    pub total_adjusted_weight: Decimal,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Database row for one farmer's share of a multi-farmer bill
#[derive(Debug, Clone, FromRow)]
pub struct FarmerPartitionRow {
    pub bill_id: Uuid,
    pub position: i32,
    pub farmer_name: String,
    pub total_original_weight: Decimal,
    pub total_adjusted_weight: Decimal,
    pub amount: Decimal,
}

/// Database row for a bag
#[derive(Debug, Clone, FromRow)]
pub struct BagRow {
    pub bag_id: Uuid,
    pub bill_id: Uuid,
    /// Partition position for multi-farmer bills, NULL otherwise
    pub farmer_position: Option<i32>,
    /// Weighing order within the bill or partition
    pub position: i32,
    pub bag_number: i64,
    pub original_weight: Decimal,
    pub adjusted_weight: Decimal,
    pub notes: Option<String>,
}
