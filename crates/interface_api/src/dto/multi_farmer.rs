//! Multi-farmer bill DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use domain_settlement::{FarmerSettlement, MultiFarmerBill, TransactionSummary};

use super::bill::{BagResponse, PolicyResponse};

#[derive(Debug, Serialize)]
pub struct FarmerResponse {
    pub farmer_name: String,
    pub bags: Vec<BagResponse>,
    pub total_original_weight: Decimal,
    pub total_adjusted_weight: Decimal,
    pub amount: Decimal,
}

impl From<&FarmerSettlement> for FarmerResponse {
    fn from(farmer: &FarmerSettlement) -> Self {
        Self {
            farmer_name: farmer.farmer_name.clone(),
            bags: farmer.bags.iter().map(BagResponse::from).collect(),
            total_original_weight: farmer.total_original_weight,
            total_adjusted_weight: farmer.total_adjusted_weight,
            amount: farmer.amount.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub farmer_count: usize,
    pub bag_count: usize,
    pub total_original_weight: Decimal,
    pub total_adjusted_weight: Decimal,
    pub total_amount: Decimal,
}

impl From<&TransactionSummary> for SummaryResponse {
    fn from(summary: &TransactionSummary) -> Self {
        Self {
            farmer_count: summary.farmer_count,
            bag_count: summary.bag_count,
            total_original_weight: summary.total_original_weight,
            total_adjusted_weight: summary.total_adjusted_weight,
            total_amount: summary.total_amount.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MultiFarmerBillResponse {
    pub id: Uuid,
    pub bill_number: String,
    pub buyer_name: String,
    pub commodity: String,
    pub policy: PolicyResponse,
    pub farmers: Vec<FarmerResponse>,
    pub summary: SummaryResponse,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<MultiFarmerBill> for MultiFarmerBillResponse {
    fn from(bill: MultiFarmerBill) -> Self {
        Self {
            id: *bill.id.as_uuid(),
            policy: PolicyResponse::from(&bill.policy),
            farmers: bill.farmers.iter().map(FarmerResponse::from).collect(),
            summary: SummaryResponse::from(&bill.summary),
            currency: bill.policy.currency.code().to_string(),
            created_at: bill.created_at,
            bill_number: bill.bill_number,
            buyer_name: bill.buyer_name,
            commodity: bill.commodity,
        }
    }
}
