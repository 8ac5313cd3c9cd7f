//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for settlement types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_settlement::{Bill, MultiFarmerBill};
use rust_decimal::Decimal;

/// Asserts that a Money value has the given amount
pub fn assert_amount(money: &Money, expected: Decimal) {
    assert_eq!(
        money.amount(),
        expected,
        "Expected amount {}, got {}",
        expected,
        money
    );
}

/// Asserts that a bill's totals are consistent with its bags
///
/// # Panics
///
/// Panics if the totals differ from the bag sums, any adjusted weight is
/// negative or above its original weight, a bag points at another bill, or
/// the amount is not a whole number.
pub fn assert_bill_consistent(bill: &Bill) {
    assert!(!bill.bags.is_empty(), "Bill {} has no bags", bill.bill_number);

    for bag in &bill.bags {
        assert_eq!(bag.bill_id, bill.id, "Bag {} belongs to another bill", bag.bag_number);
        assert!(
            bag.adjusted_weight >= Decimal::ZERO && bag.adjusted_weight <= bag.original_weight,
            "Bag {} adjusted weight {} outside [0, {}]",
            bag.bag_number,
            bag.adjusted_weight,
            bag.original_weight
        );
    }

    let original: Decimal = bill.bags.iter().map(|b| b.original_weight).sum();
    let adjusted: Decimal = bill.bags.iter().map(|b| b.adjusted_weight).sum();
    assert_eq!(bill.total_original_weight, original, "Original weight total mismatch");
    assert_eq!(bill.total_adjusted_weight, adjusted, "Adjusted weight total mismatch");
    assert!(bill.total_amount.is_whole(), "Amount {} is not whole", bill.total_amount);
    assert!(bill.verify().is_ok(), "Bill {} fails verification", bill.bill_number);
}

/// Asserts that the summary of a multi-farmer bill is the plain sum of its
/// partitions
pub fn assert_partition_sums(bill: &MultiFarmerBill) {
    let total: Decimal = bill.farmers.iter().map(|f| f.amount.amount()).sum();
    let adjusted: Decimal = bill.farmers.iter().map(|f| f.total_adjusted_weight).sum();
    let bags: usize = bill.farmers.iter().map(|f| f.bags.len()).sum();

    assert_eq!(
        bill.summary.total_amount.amount(),
        total,
        "Summary amount does not equal the sum of farmer amounts"
    );
    assert_eq!(bill.summary.total_adjusted_weight, adjusted);
    assert_eq!(bill.summary.bag_count, bags);
    assert_eq!(bill.summary.farmer_count, bill.farmers.len());
}
