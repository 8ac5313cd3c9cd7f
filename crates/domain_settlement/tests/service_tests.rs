//! SettlementService tests against the in-memory ports

use rust_decimal_macros::dec;

use core_kernel::{BillId, OperationMetadata};
use domain_settlement::{
    AuditAction, BagWeighing, BillQuery, CreateMultiFarmerBill, DeductionPerBag, EditBill,
    PolicyOverrides, RoundingMode, ServiceError, SettlementSettings,
};
use test_utils::{
    assert_amount, assert_bill_consistent, assert_partition_sums, CreateBillBuilder,
    HeaderFixtures, TestServiceBuilder, WeighingFixtures,
};

fn clerk() -> Option<OperationMetadata> {
    Some(OperationMetadata::initiated_by("clerk@mandi"))
}

// ============================================================================
// Bill Lifecycle Tests
// ============================================================================

mod bill_lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_uses_current_settings() {
        let t = TestServiceBuilder::new().build();
        let request = CreateBillBuilder::new()
            .with_weighings(WeighingFixtures::three_bags())
            .build();

        let bill = t.service.create_bill(request, clerk()).await.unwrap();

        assert_eq!(bill.policy.deduction_per_bag, DeductionPerBag::One);
        assert_amount(&bill.total_amount, dec!(4410));
        assert_bill_consistent(&bill);
        assert_eq!(t.bills.bill_count().await, 1);
    }

    #[tokio::test]
    async fn test_overrides_take_precedence() {
        let t = TestServiceBuilder::new().build();
        let request = CreateBillBuilder::new()
            .bag(dec!(50))
            .bag(dec!(50))
            .with_deduction(DeductionPerBag::Zero)
            .with_rate(dec!(2000))
            .build();

        let bill = t.service.create_bill(request, None).await.unwrap();

        assert_eq!(bill.total_adjusted_weight, dec!(100));
        assert_amount(&bill.total_amount, dec!(2000));
    }

    #[tokio::test]
    async fn test_settings_change_does_not_touch_existing_bill() {
        let t = TestServiceBuilder::new().build();
        let bill = t
            .service
            .create_bill(CreateBillBuilder::new().bag(dec!(101)).build(), None)
            .await
            .unwrap();

        let new_settings =
            SettlementSettings::new(DeductionPerBag::Two, RoundingMode::Floor, dec!(5000)).unwrap();
        t.service.update_settings(new_settings, clerk()).await.unwrap();

        let stored = t.service.get_bill(bill.id).await.unwrap();
        assert_eq!(stored.policy, bill.policy);
        assert_amount(&stored.total_amount, dec!(3000));
    }

    #[tokio::test]
    async fn test_edit_recomputes_under_frozen_policy() {
        let t = TestServiceBuilder::new().build();
        let bill = t
            .service
            .create_bill(CreateBillBuilder::new().bag(dec!(51)).build(), None)
            .await
            .unwrap();

        let changed =
            SettlementSettings::new(DeductionPerBag::Zero, RoundingMode::Round, dec!(9000)).unwrap();
        t.service.update_settings(changed, None).await.unwrap();

        let edit = EditBill {
            header: HeaderFixtures::wheat(),
            weighings: vec![BagWeighing::new(1, dec!(51)), BagWeighing::new(2, dec!(51))],
            overrides: PolicyOverrides::default(),
        };
        let edited = t.service.edit_bill(bill.id, edit, clerk()).await.unwrap();

        assert_eq!(edited.bill_number, bill.bill_number);
        assert_eq!(edited.total_adjusted_weight, dec!(100));
        assert_amount(&edited.total_amount, dec!(3000));
    }

    #[tokio::test]
    async fn test_edit_with_override_rate() {
        let t = TestServiceBuilder::new().build();
        let bill = t
            .service
            .create_bill(CreateBillBuilder::new().bag(dec!(101)).build(), None)
            .await
            .unwrap();

        let edit = EditBill {
            header: bill.header(),
            weighings: bill.weighings(),
            overrides: PolicyOverrides {
                deduction_per_bag: None,
                rate_per_100kg: Some(dec!(2500)),
            },
        };
        let edited = t.service.edit_bill(bill.id, edit, None).await.unwrap();

        assert_eq!(edited.policy.deduction_per_bag, DeductionPerBag::One);
        assert_amount(&edited.total_amount, dec!(2500));
    }

    #[tokio::test]
    async fn test_invalid_edit_leaves_bill_unchanged() {
        let t = TestServiceBuilder::new().build();
        let bill = t
            .service
            .create_bill(CreateBillBuilder::new().bag(dec!(50)).build(), None)
            .await
            .unwrap();

        let edit = EditBill {
            header: bill.header(),
            weighings: WeighingFixtures::duplicate_numbers(),
            overrides: PolicyOverrides::default(),
        };
        assert!(t.service.edit_bill(bill.id, edit, None).await.is_err());
        assert_eq!(t.service.get_bill(bill.id).await.unwrap(), bill);
    }

    #[tokio::test]
    async fn test_preview_does_not_store() {
        let t = TestServiceBuilder::new().build();
        let preview = t
            .service
            .preview_bill(CreateBillBuilder::new().with_weighings(WeighingFixtures::three_bags()).build())
            .await
            .unwrap();

        assert_amount(&preview.total_amount, dec!(4410));
        assert_eq!(t.bills.bill_count().await, 0);
        assert!(t.audit.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let t = TestServiceBuilder::new().build();
        let bill = t
            .service
            .create_bill(CreateBillBuilder::new().bag(dec!(50)).build(), None)
            .await
            .unwrap();

        t.service.delete_bill(bill.id, clerk()).await.unwrap();

        assert!(t.service.get_bill(bill.id).await.unwrap_err().is_not_found());
        assert!(t.service.delete_bill(bill.id, None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_filters_by_seller() {
        let t = TestServiceBuilder::new().build();
        for seller in ["Ramesh", "Suresh", "Ramesh"] {
            t.service
                .create_bill(CreateBillBuilder::new().with_seller(seller).bag(dec!(40)).build(), None)
                .await
                .unwrap();
        }

        let bills = t.service.list_bills(BillQuery::by_seller("Ramesh")).await.unwrap();
        assert_eq!(bills.len(), 2);
        assert!(bills.iter().all(|b| b.seller_name == "Ramesh"));
    }
}

// ============================================================================
// Multi-Farmer Tests
// ============================================================================

mod multi_farmer_tests {
    use super::*;

    fn request() -> CreateMultiFarmerBill {
        CreateMultiFarmerBill {
            buyer_name: "Sharma Traders".to_string(),
            commodity: "Paddy".to_string(),
            farmers: WeighingFixtures::two_farmers(),
            overrides: PolicyOverrides {
                deduction_per_bag: Some(DeductionPerBag::Zero),
                rate_per_100kg: None,
            },
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let t = TestServiceBuilder::new().build();
        let bill = t.service.create_multi_farmer_bill(request(), clerk()).await.unwrap();

        assert!(bill.bill_number.starts_with("MFB-"));
        assert_amount(&bill.summary.total_amount, dec!(4500));
        assert_partition_sums(&bill);

        let stored = t.service.get_multi_farmer_bill(bill.id).await.unwrap();
        assert_eq!(stored, bill);
    }

    #[tokio::test]
    async fn test_delete() {
        let t = TestServiceBuilder::new().build();
        let bill = t.service.create_multi_farmer_bill(request(), None).await.unwrap();

        t.service.delete_multi_farmer_bill(bill.id, None).await.unwrap();
        assert_eq!(t.bills.multi_farmer_bill_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let t = TestServiceBuilder::new().build();
        let err = t.service.get_multi_farmer_bill(BillId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }
}

// ============================================================================
// Settings and Audit Tests
// ============================================================================

mod settings_and_audit_tests {
    use super::*;

    #[tokio::test]
    async fn test_negative_rate_rejected() {
        let t = TestServiceBuilder::new().build();
        let mut settings = t.service.current_settings().await.unwrap();
        settings.default_rate_per_100kg = dec!(-100);

        let err = t.service.update_settings(settings, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Settlement(ref e) if e.is_configuration()));
        assert_eq!(t.service.current_settings().await.unwrap().default_rate_per_100kg, dec!(3000));
    }

    #[tokio::test]
    async fn test_audit_trail_follows_operations() {
        let t = TestServiceBuilder::new().build();
        let bill = t
            .service
            .create_bill(CreateBillBuilder::new().bag(dec!(50)).build(), clerk())
            .await
            .unwrap();
        t.service.delete_bill(bill.id, clerk()).await.unwrap();
        let settings = t.service.current_settings().await.unwrap();
        t.service.update_settings(settings, clerk()).await.unwrap();

        let events = t.service.recent_audit_events(10).await.unwrap();
        let actions: Vec<_> = events.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![AuditAction::SettingsUpdated, AuditAction::BillDeleted, AuditAction::BillCreated]
        );
        assert!(events.iter().all(|e| e.actor == "clerk@mandi"));
    }

    #[tokio::test]
    async fn test_failing_audit_keeps_bill() {
        let t = TestServiceBuilder::new().with_failing_audit().build();
        let bill = t
            .service
            .create_bill(CreateBillBuilder::new().bag(dec!(50)).build(), None)
            .await
            .unwrap();

        assert!(t.service.get_bill(bill.id).await.is_ok());
        assert!(t.audit.events().await.is_empty());
    }
}
