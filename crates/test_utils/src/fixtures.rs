//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the settlement engine. The weighings
//! mirror the worked examples used throughout the test suite so expected
//! totals can be written down by hand.

use core_kernel::{BillId, Currency};
use domain_settlement::{
    BagWeighing, BillHeader, DeductionPerBag, FarmerBagGroups, RoundingMode, SettlementPolicy,
    SettlementSettings,
};
use once_cell::sync::Lazy;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Settings with a 1 kg deduction, half-up rounding and 3000 per 100 kg
pub static STANDARD_SETTINGS: Lazy<SettlementSettings> = Lazy::new(|| {
    SettlementSettings::new(DeductionPerBag::One, RoundingMode::Round, dec!(3000))
        .expect("standard settings are valid")
});

/// Fixture for policy test data
pub struct PolicyFixtures;

impl PolicyFixtures {
    /// 1 kg deduction, 3000 per 100 kg, round
    pub fn standard() -> SettlementPolicy {
        SettlementPolicy::new(DeductionPerBag::One, dec!(3000), RoundingMode::Round, Currency::INR)
            .expect("valid policy")
    }

    /// No deduction, 3000 per 100 kg, floor
    pub fn no_deduction_floor() -> SettlementPolicy {
        SettlementPolicy::new(DeductionPerBag::Zero, dec!(3000), RoundingMode::Floor, Currency::INR)
            .expect("valid policy")
    }

    /// 2 kg deduction, 3000 per 100 kg, round
    pub fn two_kg_deduction() -> SettlementPolicy {
        SettlementPolicy::new(DeductionPerBag::Two, dec!(3000), RoundingMode::Round, Currency::INR)
            .expect("valid policy")
    }

    /// Fractional rate that makes floor, ceil and round disagree
    pub fn fractional_rate(mode: RoundingMode) -> SettlementPolicy {
        SettlementPolicy::new(DeductionPerBag::Zero, dec!(2505), mode, Currency::INR)
            .expect("valid policy")
    }
}

/// Fixture for weighing test data
pub struct WeighingFixtures;

impl WeighingFixtures {
    /// 50, 48 and 52 kg
    pub fn three_bags() -> Vec<BagWeighing> {
        vec![
            BagWeighing::new(1, dec!(50)),
            BagWeighing::new(2, dec!(48)),
            BagWeighing::new(3, dec!(52)),
        ]
    }

    /// `three_bags` plus a 1.5 kg fourth bag
    pub fn with_short_bag() -> Vec<BagWeighing> {
        let mut weighings = Self::three_bags();
        weighings.push(BagWeighing::new(4, dec!(1.5)).with_notes("mostly empty sack"));
        weighings
    }

    /// Two bags sharing bag number 2
    pub fn duplicate_numbers() -> Vec<BagWeighing> {
        vec![BagWeighing::new(2, dec!(40)), BagWeighing::new(2, dec!(41))]
    }

    /// Farmer A with 100 kg over two bags, farmer B with one 50 kg bag
    pub fn two_farmers() -> FarmerBagGroups {
        FarmerBagGroups::new()
            .with_farmer("A", vec![BagWeighing::new(1, dec!(60)), BagWeighing::new(2, dec!(40))])
            .and_then(|g| g.with_farmer("B", vec![BagWeighing::new(1, dec!(50))]))
            .expect("distinct farmers")
    }
}

/// Fixture for header and identifier test data
pub struct HeaderFixtures;

impl HeaderFixtures {
    pub fn wheat() -> BillHeader {
        BillHeader::new("Sharma Traders", "Ramesh Kumar", "Wheat")
    }

    /// Creates a deterministic bill ID for testing
    pub fn bill_id() -> BillId {
        BillId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").expect("valid uuid"))
    }
}
