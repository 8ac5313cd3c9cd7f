//! HTTP tests for the settlement API against in-memory ports

use std::str::FromStr;

use axum::http::StatusCode;
use axum_test::TestServer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use interface_api::{auth::create_token, config::ApiConfig, create_router, AppState};
use test_utils::{TestService, TestServiceBuilder};

const ACTOR: &str = "clerk@mandi";

struct Harness {
    server: TestServer,
    token: String,
    backend: TestService,
}

fn harness() -> Harness {
    harness_with(TestServiceBuilder::new())
}

fn harness_with(builder: TestServiceBuilder) -> Harness {
    let backend = builder.build();
    let config = ApiConfig::default();
    let token = create_token(ACTOR, &config.jwt_secret, 300).unwrap();

    let state = AppState::new(backend.service.clone(), config)
        .with_health_check(backend.bills.clone())
        .with_health_check(backend.settings.clone());
    let server = TestServer::new(create_router(state)).unwrap();

    Harness {
        server,
        token,
        backend,
    }
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

fn three_bag_request() -> Value {
    json!({
        "buyer_name": "Sharma Traders",
        "seller_name": "Ramesh",
        "commodity": "Wheat",
        "weighings": [
            { "bag_number": 1, "original_weight": "50" },
            { "bag_number": 2, "original_weight": "48" },
            { "bag_number": 3, "original_weight": "52" }
        ]
    })
}

// ============================================================================
// Health and Auth Tests
// ============================================================================

mod health_and_auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let h = harness();
        let response = h.server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_reports_adapters() {
        let h = harness();
        let response = h.server.get("/health/ready").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["adapters"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let h = harness();
        h.server
            .get("/api/v1/bills")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_token_is_unauthorized() {
        let h = harness();
        h.server
            .get("/api/v1/settings")
            .authorization_bearer("not-a-token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

// ============================================================================
// Bill Tests
// ============================================================================

mod bill_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_bill() {
        let h = harness();
        let response = h
            .server
            .post("/api/v1/bills")
            .authorization_bearer(&h.token)
            .json(&three_bag_request())
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(decimal(&body["total_adjusted_weight"]), dec!(147));
        assert_eq!(decimal(&body["total_amount"]), dec!(4410));
        assert_eq!(body["currency"], "INR");
        assert_eq!(body["policy"]["deduction_per_bag"], 1);
        assert_eq!(body["policy"]["rounding_mode"], "round");
        assert_eq!(body["bags"].as_array().unwrap().len(), 3);
        assert_eq!(h.backend.bills.bill_count().await, 1);
    }

    #[tokio::test]
    async fn test_preview_does_not_store() {
        let h = harness();
        let response = h
            .server
            .post("/api/v1/bills/preview")
            .authorization_bearer(&h.token)
            .json(&three_bag_request())
            .await;

        response.assert_status_ok();
        assert_eq!(decimal(&response.json::<Value>()["total_amount"]), dec!(4410));
        assert_eq!(h.backend.bills.bill_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_bag_numbers_are_unprocessable() {
        let h = harness();
        let response = h
            .server
            .post("/api/v1/bills")
            .authorization_bearer(&h.token)
            .json(&json!({
                "buyer_name": "Sharma Traders",
                "seller_name": "Ramesh",
                "commodity": "Wheat",
                "weighings": [
                    { "bag_number": 1, "original_weight": "50" },
                    { "bag_number": 1, "original_weight": "48" }
                ]
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "validation_error");
        assert_eq!(h.backend.bills.bill_count().await, 0);
    }

    #[tokio::test]
    async fn test_get_edit_delete() {
        let h = harness();
        let created = h
            .server
            .post("/api/v1/bills")
            .authorization_bearer(&h.token)
            .json(&three_bag_request())
            .await
            .json::<Value>();
        let path = format!("/api/v1/bills/{}", created["id"].as_str().unwrap());

        let fetched = h.server.get(&path).authorization_bearer(&h.token).await;
        fetched.assert_status_ok();
        assert_eq!(fetched.json::<Value>()["bill_number"], created["bill_number"]);

        let edited = h
            .server
            .put(&path)
            .authorization_bearer(&h.token)
            .json(&json!({
                "buyer_name": "Sharma Traders",
                "seller_name": "Ramesh",
                "commodity": "Wheat",
                "weighings": [{ "bag_number": 1, "original_weight": "101" }]
            }))
            .await;
        edited.assert_status_ok();
        assert_eq!(decimal(&edited.json::<Value>()["total_amount"]), dec!(3000));

        h.server
            .delete(&path)
            .authorization_bearer(&h.token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        h.server
            .get(&path)
            .authorization_bearer(&h.token)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_list_filters_by_seller() {
        let h = harness();
        for seller in ["Ramesh", "Suresh"] {
            let mut request = three_bag_request();
            request["seller_name"] = json!(seller);
            h.server
                .post("/api/v1/bills")
                .authorization_bearer(&h.token)
                .json(&request)
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = h
            .server
            .get("/api/v1/bills")
            .add_query_param("seller", "Suresh")
            .authorization_bearer(&h.token)
            .await;
        response.assert_status_ok();
        let bills = response.json::<Vec<Value>>();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0]["seller_name"], "Suresh");
    }
}

// ============================================================================
// Multi-Farmer Tests
// ============================================================================

mod multi_farmer_tests {
    use super::*;

    #[tokio::test]
    async fn test_two_farmer_bill() {
        let h = harness();
        let response = h
            .server
            .post("/api/v1/multi-farmer-bills")
            .authorization_bearer(&h.token)
            .json(&json!({
                "buyer_name": "Sharma Traders",
                "commodity": "Paddy",
                "farmers": [
                    { "farmer_name": "A", "weighings": [
                        { "bag_number": 1, "original_weight": "60" },
                        { "bag_number": 2, "original_weight": "40" }
                    ]},
                    { "farmer_name": "B", "weighings": [
                        { "bag_number": 1, "original_weight": "50" }
                    ]}
                ],
                "overrides": { "deduction_per_bag": 0 }
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(decimal(&body["farmers"][0]["amount"]), dec!(3000));
        assert_eq!(decimal(&body["farmers"][1]["amount"]), dec!(1500));
        assert_eq!(decimal(&body["summary"]["total_amount"]), dec!(4500));
        assert_eq!(body["summary"]["farmer_count"], 2);

        let path = format!("/api/v1/multi-farmer-bills/{}", body["id"].as_str().unwrap());
        h.server.get(&path).authorization_bearer(&h.token).await.assert_status_ok();
        h.server
            .delete(&path)
            .authorization_bearer(&h.token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        assert_eq!(h.backend.bills.multi_farmer_bill_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_mapping_is_unprocessable() {
        let h = harness();
        h.server
            .post("/api/v1/multi-farmer-bills")
            .authorization_bearer(&h.token)
            .json(&json!({ "buyer_name": "Sharma Traders", "commodity": "Paddy", "farmers": [] }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

// ============================================================================
// Settings and Audit Tests
// ============================================================================

mod settings_and_audit_tests {
    use super::*;

    #[tokio::test]
    async fn test_negative_rate_is_configuration_error() {
        let h = harness();
        let response = h
            .server
            .put("/api/v1/settings")
            .authorization_bearer(&h.token)
            .json(&json!({
                "deduction_per_bag_default": 1,
                "rounding_mode": "round",
                "default_rate_per_100kg": "-5"
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "configuration_error");
    }

    #[tokio::test]
    async fn test_update_settings_records_actor() {
        let h = harness();
        let response = h
            .server
            .put("/api/v1/settings")
            .authorization_bearer(&h.token)
            .json(&json!({
                "deduction_per_bag_default": 2,
                "rounding_mode": "floor",
                "default_rate_per_100kg": "2500"
            }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["updated_by"], ACTOR);

        let settings = h
            .server
            .get("/api/v1/settings")
            .authorization_bearer(&h.token)
            .await
            .json::<Value>();
        assert_eq!(settings["deduction_per_bag_default"], 2);
        assert_eq!(settings["rounding_mode"], "floor");

        let events = h
            .server
            .get("/api/v1/audit-events")
            .add_query_param("limit", 5)
            .authorization_bearer(&h.token)
            .await
            .json::<Vec<Value>>();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["action"], "settings_updated");
        assert_eq!(events[0]["actor"], ACTOR);
    }

    #[tokio::test]
    async fn test_bill_events_are_keyed_by_bill_id() {
        let h = harness();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let created = h
                .server
                .post("/api/v1/bills")
                .authorization_bearer(&h.token)
                .json(&three_bag_request())
                .await
                .json::<Value>();
            ids.push((created["id"].clone(), created["bill_number"].clone()));
        }
        assert_ne!(ids[0].1, ids[1].1);

        let events = h
            .server
            .get("/api/v1/audit-events")
            .authorization_bearer(&h.token)
            .await
            .json::<Vec<Value>>();
        assert_eq!(events.len(), 2);
        for (id, bill_number) in &ids {
            let event = events
                .iter()
                .find(|e| &e["entity_id"] == id)
                .expect("event for bill");
            assert_eq!(&event["details"]["bill_number"], bill_number);
        }
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_request() {
        let h = harness_with(TestServiceBuilder::new().with_failing_audit());
        h.server
            .post("/api/v1/bills")
            .authorization_bearer(&h.token)
            .json(&three_bag_request())
            .await
            .assert_status(StatusCode::CREATED);
        assert_eq!(h.backend.bills.bill_count().await, 1);
    }
}

