//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use domain_settlement::{BagWeighing, DeductionPerBag, FarmerBagGroups, RoundingMode};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating deduction values
pub fn deduction_strategy() -> impl Strategy<Value = DeductionPerBag> {
    prop_oneof![
        Just(DeductionPerBag::Zero),
        Just(DeductionPerBag::One),
        Just(DeductionPerBag::Two),
    ]
}

/// Strategy for generating rounding modes
pub fn rounding_mode_strategy() -> impl Strategy<Value = RoundingMode> {
    prop_oneof![
        Just(RoundingMode::Floor),
        Just(RoundingMode::Ceil),
        Just(RoundingMode::Round),
    ]
}

/// Strategy for bag weights from 0 to 200 kg with up to 2 decimal places
pub fn bag_weight_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..20_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for rates per 100 kg from 0 to 10000 with up to 2 decimal places
pub fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a valid weighing set of 1 to `max_bags` bags numbered from 1
pub fn weighings_strategy(max_bags: usize) -> impl Strategy<Value = Vec<BagWeighing>> {
    proptest::collection::vec(bag_weight_strategy(), 1..=max_bags).prop_map(|weights| {
        weights
            .into_iter()
            .enumerate()
            .map(|(i, w)| BagWeighing::new(i as u32 + 1, w))
            .collect()
    })
}

/// Strategy for 1 to `max_farmers` farmers, each with a valid weighing set
pub fn farmer_groups_strategy(max_farmers: usize) -> impl Strategy<Value = FarmerBagGroups> {
    proptest::collection::vec(weighings_strategy(8), 1..=max_farmers).prop_map(|sets| {
        sets.into_iter()
            .enumerate()
            .fold(FarmerBagGroups::new(), |mut groups, (i, weighings)| {
                // names are distinct by construction
                let _ = groups.insert(format!("Farmer {}", i + 1), weighings);
                groups
            })
    })
}
