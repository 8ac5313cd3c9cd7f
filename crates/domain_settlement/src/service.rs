//! Settlement application service
//!
//! Orchestrates one settlement operation end to end: read the settings once,
//! resolve the frozen policy, run the engine, persist the result and then
//! append an audit event. The engine never sees a port; the ports never see
//! a half-computed bill.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, instrument, warn};

use core_kernel::{BillId, OperationMetadata, PortError};

use crate::audit::{AuditAction, AuditEvent};
use crate::bag::BagWeighing;
use crate::bill::{Bill, BillAssembler, BillHeader};
use crate::error::SettlementError;
use crate::multi_farmer::{FarmerBagGroups, MultiFarmerAllocator, MultiFarmerBill};
use crate::policy::PolicyOverrides;
use crate::ports::{AuditPort, BillQuery, BillRepositoryPort, SettingsPort};
use crate::settings::SettlementSettings;

/// Errors surfaced by [`SettlementService`]
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Port(e) if e.is_not_found())
    }
}

/// Input for a new single-farmer bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBill {
    #[serde(flatten)]
    pub header: BillHeader,
    pub weighings: Vec<BagWeighing>,
    #[serde(default)]
    pub overrides: PolicyOverrides,
}

/// Replacement header and weighings for an existing bill
///
/// Without overrides the bill is recomputed under the policy it was frozen
/// with; any override is applied on top of that frozen policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBill {
    #[serde(flatten)]
    pub header: BillHeader,
    pub weighings: Vec<BagWeighing>,
    #[serde(default)]
    pub overrides: PolicyOverrides,
}

/// Input for a multi-farmer bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMultiFarmerBill {
    pub buyer_name: String,
    pub commodity: String,
    pub farmers: FarmerBagGroups,
    #[serde(default)]
    pub overrides: PolicyOverrides,
}

/// Settlement use cases over the configured ports
pub struct SettlementService {
    settings: Arc<dyn SettingsPort>,
    bills: Arc<dyn BillRepositoryPort>,
    audit: Arc<dyn AuditPort>,
}

impl SettlementService {
    pub fn new(
        settings: Arc<dyn SettingsPort>,
        bills: Arc<dyn BillRepositoryPort>,
        audit: Arc<dyn AuditPort>,
    ) -> Self {
        Self {
            settings,
            bills,
            audit,
        }
    }

    /// Computes a bill under the current settings without storing it
    #[instrument(skip(self, request), fields(bags = request.weighings.len()))]
    pub async fn preview_bill(&self, request: CreateBill) -> Result<Bill, ServiceError> {
        let settings = self.settings.current_settings().await?;
        let policy = settings.resolve_policy(&request.overrides)?;
        Ok(BillAssembler::new(policy).assemble(request.header, &request.weighings)?)
    }

    /// Assembles and stores a new bill
    #[instrument(skip(self, request, metadata), fields(seller = %request.header.seller_name, bags = request.weighings.len()))]
    pub async fn create_bill(
        &self,
        request: CreateBill,
        metadata: Option<OperationMetadata>,
    ) -> Result<Bill, ServiceError> {
        let settings = self.settings.current_settings().await?;
        let policy = settings.resolve_policy(&request.overrides)?;
        let bill = BillAssembler::new(policy).assemble(request.header, &request.weighings)?;

        self.bills.save_bill(&bill, metadata.clone()).await?;
        info!(bill_number = %bill.bill_number, amount = %bill.total_amount, "Bill created");

        self.record_audit(
            AuditEvent::new(AuditAction::BillCreated, bill.id.as_uuid().to_string(), actor(&metadata))
                .with_details(bill_details(&bill)),
        )
        .await;
        Ok(bill)
    }

    /// Replaces a bill's header and weighings and recomputes it
    #[instrument(skip(self, request, metadata), fields(bill_id = %id))]
    pub async fn edit_bill(
        &self,
        id: BillId,
        request: EditBill,
        metadata: Option<OperationMetadata>,
    ) -> Result<Bill, ServiceError> {
        let existing = self.bills.get_bill(id, metadata.clone()).await?;
        let policy = existing.policy.with_overrides(&request.overrides)?;
        let bill = BillAssembler::new(policy).reassemble(&existing, request.header, &request.weighings)?;

        self.bills.replace_bill(&bill, metadata.clone()).await?;
        info!(bill_number = %bill.bill_number, amount = %bill.total_amount, "Bill updated");

        self.record_audit(
            AuditEvent::new(AuditAction::BillUpdated, bill.id.as_uuid().to_string(), actor(&metadata)).with_details(
                json!({
                    "bill_number": bill.bill_number,
                    "previous_amount": existing.total_amount.amount(),
                    "amount": bill.total_amount.amount(),
                    "bag_count": bill.bag_count(),
                }),
            ),
        )
        .await;
        Ok(bill)
    }

    #[instrument(skip(self), fields(bill_id = %id))]
    pub async fn get_bill(&self, id: BillId) -> Result<Bill, ServiceError> {
        Ok(self.bills.get_bill(id, None).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_bills(&self, query: BillQuery) -> Result<Vec<Bill>, ServiceError> {
        Ok(self.bills.find_bills(query, None).await?)
    }

    #[instrument(skip(self, metadata), fields(bill_id = %id))]
    pub async fn delete_bill(
        &self,
        id: BillId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), ServiceError> {
        let bill = self.bills.get_bill(id, metadata.clone()).await?;
        self.bills.delete_bill(id, metadata.clone()).await?;
        info!(bill_number = %bill.bill_number, "Bill deleted");

        self.record_audit(
            AuditEvent::new(AuditAction::BillDeleted, bill.id.as_uuid().to_string(), actor(&metadata))
                .with_details(json!({ "bill_number": bill.bill_number })),
        )
        .await;
        Ok(())
    }

    /// Allocates and stores a bill covering several farmers
    #[instrument(skip(self, request, metadata), fields(farmers = request.farmers.len()))]
    pub async fn create_multi_farmer_bill(
        &self,
        request: CreateMultiFarmerBill,
        metadata: Option<OperationMetadata>,
    ) -> Result<MultiFarmerBill, ServiceError> {
        let settings = self.settings.current_settings().await?;
        let policy = settings.resolve_policy(&request.overrides)?;
        let bill = MultiFarmerAllocator::new(policy).allocate(
            &request.farmers,
            request.buyer_name,
            request.commodity,
        )?;

        self.bills.save_multi_farmer_bill(&bill, metadata.clone()).await?;
        info!(
            bill_number = %bill.bill_number,
            farmers = bill.summary.farmer_count,
            amount = %bill.summary.total_amount,
            "Multi-farmer bill created"
        );

        let farmers: Vec<_> = bill
            .farmers
            .iter()
            .map(|f| json!({ "farmer_name": f.farmer_name, "amount": f.amount.amount() }))
            .collect();
        self.record_audit(
            AuditEvent::new(AuditAction::MultiFarmerBillCreated, bill.id.as_uuid().to_string(), actor(&metadata))
                .with_details(json!({
                    "bill_number": bill.bill_number,
                    "farmers": farmers,
                    "total_amount": bill.summary.total_amount.amount(),
                })),
        )
        .await;
        Ok(bill)
    }

    #[instrument(skip(self), fields(bill_id = %id))]
    pub async fn get_multi_farmer_bill(&self, id: BillId) -> Result<MultiFarmerBill, ServiceError> {
        Ok(self.bills.get_multi_farmer_bill(id, None).await?)
    }

    #[instrument(skip(self, metadata), fields(bill_id = %id))]
    pub async fn delete_multi_farmer_bill(
        &self,
        id: BillId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), ServiceError> {
        let bill = self.bills.get_multi_farmer_bill(id, metadata.clone()).await?;
        self.bills.delete_multi_farmer_bill(id, metadata.clone()).await?;
        info!(bill_number = %bill.bill_number, "Multi-farmer bill deleted");

        self.record_audit(
            AuditEvent::new(AuditAction::MultiFarmerBillDeleted, bill.id.as_uuid().to_string(), actor(&metadata))
                .with_details(json!({ "bill_number": bill.bill_number })),
        )
        .await;
        Ok(())
    }

    pub async fn current_settings(&self) -> Result<SettlementSettings, ServiceError> {
        Ok(self.settings.current_settings().await?)
    }

    /// Replaces the active settings
    ///
    /// Existing bills keep the policy they were frozen with.
    #[instrument(skip(self, settings, metadata))]
    pub async fn update_settings(
        &self,
        settings: SettlementSettings,
        metadata: Option<OperationMetadata>,
    ) -> Result<SettlementSettings, ServiceError> {
        settings.validate()?;
        let saved = self.settings.update_settings(settings, metadata.clone()).await?;
        info!(
            deduction = %saved.deduction_per_bag_default,
            rounding = %saved.rounding_mode,
            rate = %saved.default_rate_per_100kg,
            "Settings updated"
        );

        self.record_audit(
            AuditEvent::new(AuditAction::SettingsUpdated, "settings", actor(&metadata)).with_details(json!({
                "deduction_per_bag_default": saved.deduction_per_bag_default.as_u8(),
                "rounding_mode": saved.rounding_mode.as_str(),
                "default_rate_per_100kg": saved.default_rate_per_100kg,
                "currency": saved.currency.code(),
            })),
        )
        .await;
        Ok(saved)
    }

    pub async fn recent_audit_events(&self, limit: u32) -> Result<Vec<AuditEvent>, ServiceError> {
        Ok(self.audit.recent(limit).await?)
    }

    /// The change is already persisted, so a failed write is logged only
    async fn record_audit(&self, event: AuditEvent) {
        let action = event.action;
        let entity_id = event.entity_id.clone();
        if let Err(e) = self.audit.record(event).await {
            warn!(%action, %entity_id, error = %e, "Failed to record audit event");
        }
    }
}

fn actor(metadata: &Option<OperationMetadata>) -> String {
    metadata
        .as_ref()
        .map_or("system", |m| m.actor())
        .to_string()
}

fn bill_details(bill: &Bill) -> serde_json::Value {
    json!({
        "bill_number": bill.bill_number,
        "seller_name": bill.seller_name,
        "bag_count": bill.bag_count(),
        "total_adjusted_weight": bill.total_adjusted_weight,
        "amount": bill.total_amount.amount(),
    })
}
