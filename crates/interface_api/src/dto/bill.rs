//! Bill DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_settlement::{Bag, Bill, BillQuery, RoundingMode, SettlementPolicy};

/// Query string for `GET /bills`
#[derive(Debug, Default, Deserialize)]
pub struct ListBillsParams {
    pub buyer: Option<String>,
    pub seller: Option<String>,
    pub commodity: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<ListBillsParams> for BillQuery {
    fn from(params: ListBillsParams) -> Self {
        BillQuery {
            buyer_name: params.buyer,
            seller_name: params.seller,
            commodity: params.commodity,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub deduction_per_bag: u8,
    pub rate_per_100kg: Decimal,
    pub rounding_mode: RoundingMode,
    pub currency: String,
}

impl From<&SettlementPolicy> for PolicyResponse {
    fn from(policy: &SettlementPolicy) -> Self {
        Self {
            deduction_per_bag: policy.deduction_per_bag.as_u8(),
            rate_per_100kg: policy.rate_per_100kg.value(),
            rounding_mode: policy.rounding_mode,
            currency: policy.currency.code().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BagResponse {
    pub id: Uuid,
    pub bag_number: u32,
    pub original_weight: Decimal,
    pub adjusted_weight: Decimal,
    pub deducted_weight: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&Bag> for BagResponse {
    fn from(bag: &Bag) -> Self {
        Self {
            id: *bag.id.as_uuid(),
            bag_number: bag.bag_number,
            original_weight: bag.original_weight,
            adjusted_weight: bag.adjusted_weight,
            deducted_weight: bag.deducted_weight(),
            notes: bag.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BillResponse {
    pub id: Uuid,
    pub bill_number: String,
    pub buyer_name: String,
    pub seller_name: String,
    pub commodity: String,
    pub policy: PolicyResponse,
    pub bags: Vec<BagResponse>,
    pub bag_count: usize,
    pub total_original_weight: Decimal,
    pub total_adjusted_weight: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        Self {
            id: *bill.id.as_uuid(),
            policy: PolicyResponse::from(&bill.policy),
            bags: bill.bags.iter().map(BagResponse::from).collect(),
            bag_count: bill.bag_count(),
            total_original_weight: bill.total_original_weight,
            total_adjusted_weight: bill.total_adjusted_weight,
            total_amount: bill.total_amount.amount(),
            currency: bill.total_amount.currency().code().to_string(),
            created_at: bill.created_at,
            updated_at: bill.updated_at,
            bill_number: bill.bill_number,
            buyer_name: bill.buyer_name,
            seller_name: bill.seller_name,
            commodity: bill.commodity,
        }
    }
}
