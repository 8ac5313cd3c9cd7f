//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use std::sync::Arc;

use domain_settlement::ports::mock::{InMemoryAuditLog, InMemoryBillRepository, InMemorySettingsPort};
use domain_settlement::{
    BagWeighing, BillHeader, CreateBill, DeductionPerBag, PolicyOverrides, SettlementService,
    SettlementSettings,
};
use rust_decimal::Decimal;

use crate::fixtures::{HeaderFixtures, STANDARD_SETTINGS};

/// Builder for bill creation requests
pub struct CreateBillBuilder {
    header: BillHeader,
    weighings: Vec<BagWeighing>,
    overrides: PolicyOverrides,
}

impl Default for CreateBillBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateBillBuilder {
    /// Creates a builder for a wheat bill with no bags
    pub fn new() -> Self {
        Self {
            header: HeaderFixtures::wheat(),
            weighings: Vec::new(),
            overrides: PolicyOverrides::default(),
        }
    }

    pub fn with_seller(mut self, seller_name: impl Into<String>) -> Self {
        self.header.seller_name = seller_name.into();
        self
    }

    pub fn with_buyer(mut self, buyer_name: impl Into<String>) -> Self {
        self.header.buyer_name = buyer_name.into();
        self
    }

    /// Appends a bag numbered after the last one
    pub fn bag(mut self, weight: Decimal) -> Self {
        let next = self.weighings.iter().map(|w| w.bag_number).max().unwrap_or(0) + 1;
        self.weighings.push(BagWeighing::new(next, weight));
        self
    }

    /// Replaces the weighings
    pub fn with_weighings(mut self, weighings: Vec<BagWeighing>) -> Self {
        self.weighings = weighings;
        self
    }

    pub fn with_deduction(mut self, deduction: DeductionPerBag) -> Self {
        self.overrides.deduction_per_bag = Some(deduction);
        self
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.overrides.rate_per_100kg = Some(rate);
        self
    }

    pub fn build(self) -> CreateBill {
        CreateBill {
            header: self.header,
            weighings: self.weighings,
            overrides: self.overrides,
        }
    }
}

/// A service over in-memory ports, with handles to inspect them
pub struct TestService {
    pub service: Arc<SettlementService>,
    pub settings: Arc<InMemorySettingsPort>,
    pub bills: Arc<InMemoryBillRepository>,
    pub audit: Arc<InMemoryAuditLog>,
}

/// Builder for a [`SettlementService`] backed by in-memory ports
pub struct TestServiceBuilder {
    settings: SettlementSettings,
    failing_audit: bool,
}

impl Default for TestServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestServiceBuilder {
    /// Starts from the standard settings
    pub fn new() -> Self {
        Self {
            settings: STANDARD_SETTINGS.clone(),
            failing_audit: false,
        }
    }

    pub fn with_settings(mut self, settings: SettlementSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Makes every audit write fail
    pub fn with_failing_audit(mut self) -> Self {
        self.failing_audit = true;
        self
    }

    pub fn build(self) -> TestService {
        let settings = Arc::new(InMemorySettingsPort::with_settings(self.settings));
        let bills = Arc::new(InMemoryBillRepository::new());
        let audit = Arc::new(if self.failing_audit {
            InMemoryAuditLog::failing()
        } else {
            InMemoryAuditLog::new()
        });
        let service = Arc::new(SettlementService::new(
            settings.clone(),
            bills.clone(),
            audit.clone(),
        ));

        TestService {
            service,
            settings,
            bills,
            audit,
        }
    }
}
