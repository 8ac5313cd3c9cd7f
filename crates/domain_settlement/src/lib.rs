//! Settlement Domain - Weight Deductions, Rates and Bills
//!
//! This crate settles commodity purchases weighed bag by bag. A buyer pays
//! for the adjusted weight of every bag at a rate per 100 kg, with the final
//! amount rounded to a whole currency unit.
//!
//! # Pipeline
//!
//! - **WeightAdjuster** ([`weight::adjust`]): subtracts the per-bag deduction
//!   (0, 1 or 2 kg), flooring at zero
//! - **RoundingPolicy** ([`RoundingMode`]): floor, ceil or half-away-from-zero
//! - **RateCalculator** ([`rate::compute_amount`]): `kg × rate / 100`, rounded
//!   once on the total
//! - **BillAssembler** ([`BillAssembler`]): validates weighings and builds a
//!   [`Bill`] under a frozen [`SettlementPolicy`]
//! - **MultiFarmerAllocator** ([`MultiFarmerAllocator`]): settles each
//!   farmer's bags independently and sums the results
//!
//! The engine is pure and synchronous. [`SettlementService`] wires it to the
//! settings, storage and audit ports.
//!
//! # Example
//!
//! ```rust
//! use core_kernel::Currency;
//! use domain_settlement::{
//!     BagWeighing, FarmerBagGroups, MultiFarmerAllocator, DeductionPerBag, RoundingMode,
//!     SettlementPolicy,
//! };
//! use rust_decimal_macros::dec;
//!
//! let policy = SettlementPolicy::new(DeductionPerBag::Zero, dec!(3000), RoundingMode::Floor, Currency::INR).unwrap();
//! let groups = FarmerBagGroups::new()
//!     .with_farmer("A", vec![BagWeighing::new(1, dec!(100))]).unwrap()
//!     .with_farmer("B", vec![BagWeighing::new(1, dec!(50))]).unwrap();
//!
//! let bill = MultiFarmerAllocator::new(policy).allocate(&groups, "Buyer", "Paddy").unwrap();
//! assert_eq!(bill.summary.total_amount.amount(), dec!(4500));
//! ```

pub mod audit;
pub mod bag;
pub mod bill;
pub mod error;
pub mod multi_farmer;
pub mod policy;
pub mod ports;
pub mod rate;
pub mod rounding;
pub mod service;
pub mod settings;
pub mod weight;

pub use audit::{AuditAction, AuditEvent};
pub use bag::{validate_weighings, Bag, BagWeighing};
pub use bill::{BagSettlement, Bill, BillAssembler, BillHeader};
pub use error::SettlementError;
pub use multi_farmer::{
    FarmerBagGroup, FarmerBagGroups, FarmerSettlement, MultiFarmerAllocator, MultiFarmerBill,
    TransactionSummary,
};
pub use policy::{PolicyOverrides, SettlementPolicy};
pub use ports::{AuditPort, BillQuery, BillRepositoryPort, SettingsPort};
pub use rate::{compute_amount, RatePer100Kg, RATE_BASIS_KG};
pub use rounding::{round, RoundingMode};
pub use service::{CreateBill, CreateMultiFarmerBill, EditBill, ServiceError, SettlementService};
pub use settings::SettlementSettings;
pub use weight::{adjust, DeductionPerBag};
