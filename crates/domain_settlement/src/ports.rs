//! Settlement Domain Ports
//!
//! The settlement engine itself performs no I/O. Everything it needs from
//! the outside world goes through the traits below:
//!
//! - **SettingsPort**: the single active settings record
//! - **BillRepositoryPort**: storage for single- and multi-farmer bills
//! - **AuditPort**: an append-only trail of changes
//!
//! `infra_db` implements them on PostgreSQL; the [`mock`] module provides
//! in-memory versions for tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_settlement::ports::{AuditPort, BillRepositoryPort, SettingsPort};
//! use std::sync::Arc;
//!
//! let service = SettlementService::new(
//!     Arc::new(PostgresSettingsAdapter::new(pool.clone())),
//!     Arc::new(PostgresBillAdapter::new(pool.clone())),
//!     Arc::new(PostgresAuditAdapter::new(pool)),
//! );
//! ```

use async_trait::async_trait;

use core_kernel::{BillId, DomainPort, HealthCheckable, OperationMetadata, PortError};

use crate::audit::AuditEvent;
use crate::bill::Bill;
use crate::multi_farmer::MultiFarmerBill;
use crate::settings::SettlementSettings;

/// Query parameters for finding bills
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillQuery {
    /// Filter by buyer name (exact match)
    pub buyer_name: Option<String>,
    /// Filter by seller name (exact match)
    pub seller_name: Option<String>,
    /// Filter by commodity (exact match)
    pub commodity: Option<String>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl BillQuery {
    /// Creates a query to find by buyer
    pub fn by_buyer(buyer_name: impl Into<String>) -> Self {
        Self {
            buyer_name: Some(buyer_name.into()),
            ..Default::default()
        }
    }

    /// Creates a query to find by seller
    pub fn by_seller(seller_name: impl Into<String>) -> Self {
        Self {
            seller_name: Some(seller_name.into()),
            ..Default::default()
        }
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Returns true if the bill passes every filter
    pub fn matches(&self, bill: &Bill) -> bool {
        fn eq(filter: &Option<String>, value: &str) -> bool {
            filter.as_deref().map_or(true, |f| f == value)
        }
        eq(&self.buyer_name, &bill.buyer_name)
            && eq(&self.seller_name, &bill.seller_name)
            && eq(&self.commodity, &bill.commodity)
    }
}

/// Access to the active settings record
#[async_trait]
pub trait SettingsPort: DomainPort + HealthCheckable {
    /// Returns a snapshot of the active settings
    ///
    /// Adapters return `SettlementSettings::default()` when nothing has been
    /// stored yet.
    async fn current_settings(&self) -> Result<SettlementSettings, PortError>;

    /// Replaces the active settings
    async fn update_settings(
        &self,
        settings: SettlementSettings,
        metadata: Option<OperationMetadata>,
    ) -> Result<SettlementSettings, PortError>;
}

/// Storage for bills
///
/// Writes are atomic: a bill is stored together with all of its bags or not
/// at all.
#[async_trait]
pub trait BillRepositoryPort: DomainPort + HealthCheckable {
    /// Stores a newly assembled bill
    async fn save_bill(
        &self,
        bill: &Bill,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Retrieves a bill by ID, or `PortError::NotFound`
    async fn get_bill(
        &self,
        id: BillId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Bill, PortError>;

    /// Replaces a stored bill and all of its bags
    async fn replace_bill(
        &self,
        bill: &Bill,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Deletes a bill and its bags
    async fn delete_bill(
        &self,
        id: BillId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Finds bills matching the query, newest first
    async fn find_bills(
        &self,
        query: BillQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Bill>, PortError>;

    /// Stores a multi-farmer bill with every partition and bag
    async fn save_multi_farmer_bill(
        &self,
        bill: &MultiFarmerBill,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Retrieves a multi-farmer bill by ID, or `PortError::NotFound`
    async fn get_multi_farmer_bill(
        &self,
        id: BillId,
        metadata: Option<OperationMetadata>,
    ) -> Result<MultiFarmerBill, PortError>;

    /// Deletes a multi-farmer bill with its partitions and bags
    async fn delete_multi_farmer_bill(
        &self,
        id: BillId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;
}

/// Append-only audit trail
#[async_trait]
pub trait AuditPort: DomainPort {
    /// Appends an event
    async fn record(&self, event: AuditEvent) -> Result<(), PortError>;

    /// Returns up to `limit` events, newest first
    async fn recent(&self, limit: u32) -> Result<Vec<AuditEvent>, PortError>;
}

/// In-memory port implementations for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory settings record
    #[derive(Debug, Default)]
    pub struct InMemorySettingsPort {
        settings: Arc<RwLock<SettlementSettings>>,
    }

    impl InMemorySettingsPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Starts from the given settings
        pub fn with_settings(settings: SettlementSettings) -> Self {
            Self {
                settings: Arc::new(RwLock::new(settings)),
            }
        }
    }

    impl DomainPort for InMemorySettingsPort {}

    #[async_trait]
    impl HealthCheckable for InMemorySettingsPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-settings-port", 0)
        }
    }

    #[async_trait]
    impl SettingsPort for InMemorySettingsPort {
        async fn current_settings(&self) -> Result<SettlementSettings, PortError> {
            Ok(self.settings.read().await.clone())
        }

        async fn update_settings(
            &self,
            mut settings: SettlementSettings,
            metadata: Option<OperationMetadata>,
        ) -> Result<SettlementSettings, PortError> {
            settings.updated_at = Utc::now();
            settings.updated_by = metadata.and_then(|m| m.initiated_by);
            *self.settings.write().await = settings.clone();
            Ok(settings)
        }
    }

    /// In-memory bill storage
    #[derive(Debug, Default)]
    pub struct InMemoryBillRepository {
        bills: Arc<RwLock<HashMap<BillId, Bill>>>,
        multi_farmer_bills: Arc<RwLock<HashMap<BillId, MultiFarmerBill>>>,
    }

    impl InMemoryBillRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with bills for testing
        pub async fn with_bills(bills: Vec<Bill>) -> Self {
            let repo = Self::new();
            for bill in bills {
                repo.bills.write().await.insert(bill.id, bill);
            }
            repo
        }

        pub async fn bill_count(&self) -> usize {
            self.bills.read().await.len()
        }

        pub async fn multi_farmer_bill_count(&self) -> usize {
            self.multi_farmer_bills.read().await.len()
        }
    }

    impl DomainPort for InMemoryBillRepository {}

    #[async_trait]
    impl HealthCheckable for InMemoryBillRepository {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-bill-repository", 0)
        }
    }

    #[async_trait]
    impl BillRepositoryPort for InMemoryBillRepository {
        async fn save_bill(
            &self,
            bill: &Bill,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut bills = self.bills.write().await;
            if bills.contains_key(&bill.id) {
                return Err(PortError::Conflict {
                    message: format!("bill {} already exists", bill.id),
                });
            }
            bills.insert(bill.id, bill.clone());
            Ok(())
        }

        async fn get_bill(
            &self,
            id: BillId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Bill, PortError> {
            self.bills
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Bill", id))
        }

        async fn replace_bill(
            &self,
            bill: &Bill,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut bills = self.bills.write().await;
            let slot = bills
                .get_mut(&bill.id)
                .ok_or_else(|| PortError::not_found("Bill", bill.id))?;
            *slot = bill.clone();
            Ok(())
        }

        async fn delete_bill(
            &self,
            id: BillId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.bills
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Bill", id))
        }

        async fn find_bills(
            &self,
            query: BillQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Bill>, PortError> {
            let bills = self.bills.read().await;
            let mut results: Vec<_> = bills.values().filter(|b| query.matches(b)).cloned().collect();
            results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            // Apply pagination
            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map_or(usize::MAX, |l| l as usize);
            Ok(results.into_iter().skip(offset).take(limit).collect())
        }

        async fn save_multi_farmer_bill(
            &self,
            bill: &MultiFarmerBill,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut bills = self.multi_farmer_bills.write().await;
            if bills.contains_key(&bill.id) {
                return Err(PortError::Conflict {
                    message: format!("multi-farmer bill {} already exists", bill.id),
                });
            }
            bills.insert(bill.id, bill.clone());
            Ok(())
        }

        async fn get_multi_farmer_bill(
            &self,
            id: BillId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<MultiFarmerBill, PortError> {
            self.multi_farmer_bills
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("MultiFarmerBill", id))
        }

        async fn delete_multi_farmer_bill(
            &self,
            id: BillId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.multi_farmer_bills
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("MultiFarmerBill", id))
        }
    }

    /// In-memory audit trail
    ///
    /// `fail_writes` makes every `record` call fail, for exercising the
    /// service's handling of a broken audit sink.
    #[derive(Debug, Default)]
    pub struct InMemoryAuditLog {
        events: Arc<RwLock<Vec<AuditEvent>>>,
        fail_writes: AtomicBool,
    }

    impl InMemoryAuditLog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let log = Self::default();
            log.fail_writes.store(true, Ordering::SeqCst);
            log
        }

        pub async fn events(&self) -> Vec<AuditEvent> {
            self.events.read().await.clone()
        }
    }

    impl DomainPort for InMemoryAuditLog {}

    #[async_trait]
    impl AuditPort for InMemoryAuditLog {
        async fn record(&self, event: AuditEvent) -> Result<(), PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::ServiceUnavailable {
                    service: "audit".to_string(),
                });
            }
            self.events.write().await.push(event);
            Ok(())
        }

        async fn recent(&self, limit: u32) -> Result<Vec<AuditEvent>, PortError> {
            let events = self.events.read().await;
            Ok(events.iter().rev().take(limit as usize).cloned().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;
    use crate::audit::AuditAction;
    use crate::bag::BagWeighing;
    use crate::bill::{BillAssembler, BillHeader};
    use crate::policy::SettlementPolicy;
    use crate::rounding::RoundingMode;
    use crate::weight::DeductionPerBag;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn bill(seller: &str) -> Bill {
        let policy =
            SettlementPolicy::new(DeductionPerBag::One, dec!(3000), RoundingMode::Round, Currency::INR)
                .unwrap();
        BillAssembler::new(policy)
            .assemble(BillHeader::new("Buyer", seller, "Wheat"), &[BagWeighing::new(1, dec!(50))])
            .unwrap()
    }

    #[tokio::test]
    async fn test_bill_crud() {
        let repo = InMemoryBillRepository::new();
        let mut b = bill("Ramesh");
        repo.save_bill(&b, None).await.unwrap();
        assert!(repo.save_bill(&b, None).await.is_err());

        b.commodity = "Paddy".to_string();
        repo.replace_bill(&b, None).await.unwrap();
        assert_eq!(repo.get_bill(b.id, None).await.unwrap().commodity, "Paddy");

        repo.delete_bill(b.id, None).await.unwrap();
        assert!(repo.get_bill(b.id, None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_find_bills_filters_and_paginates() {
        let repo = InMemoryBillRepository::with_bills(vec![bill("A"), bill("B"), bill("A")]).await;

        let a = repo.find_bills(BillQuery::by_seller("A"), None).await.unwrap();
        assert_eq!(a.len(), 2);

        let page = repo
            .find_bills(BillQuery::default().paginate(1, 1), None)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_settings_update_records_actor() {
        let port = InMemorySettingsPort::new();
        let settings = port.current_settings().await.unwrap();
        assert_eq!(settings.deduction_per_bag_default, DeductionPerBag::One);

        let updated = port
            .update_settings(settings, Some(OperationMetadata::initiated_by("admin")))
            .await
            .unwrap();
        assert_eq!(updated.updated_by.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_audit_recent_newest_first() {
        let log = InMemoryAuditLog::new();
        log.record(AuditEvent::new(AuditAction::BillCreated, "BILL-1", "a")).await.unwrap();
        log.record(AuditEvent::new(AuditAction::BillDeleted, "BILL-1", "a")).await.unwrap();

        let recent = log.recent(1).await.unwrap();
        assert_eq!(recent[0].action, AuditAction::BillDeleted);
    }
}
