//! HTTP API Layer
//!
//! This crate provides the REST API for the settlement engine using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: thin wrappers over `SettlementService`
//! - **Middleware**: bearer authentication and request logging
//! - **DTOs**: flattened response bodies
//! - **Error Handling**: `ApiError` maps service errors to status codes
//!
//! The router only knows the service, so tests wire it to in-memory ports
//! and the binary wires it to PostgreSQL.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(service, config).with_health_check(bills_adapter);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_settlement::SettlementService;

use crate::config::ApiConfig;
use crate::handlers::{audit, bills, health, multi_farmer, settings};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SettlementService>,
    pub health_checks: Vec<Arc<dyn HealthCheckable>>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(service: Arc<SettlementService>, config: ApiConfig) -> Self {
        Self {
            service,
            health_checks: Vec::new(),
            config,
        }
    }

    /// Registers an adapter for the readiness probe
    pub fn with_health_check(mut self, adapter: Arc<dyn HealthCheckable>) -> Self {
        self.health_checks.push(adapter);
        self
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let bill_routes = Router::new()
        .route("/", post(bills::create_bill).get(bills::list_bills))
        .route("/preview", post(bills::preview_bill))
        .route(
            "/:id",
            get(bills::get_bill)
                .put(bills::edit_bill)
                .delete(bills::delete_bill),
        );

    let multi_farmer_routes = Router::new()
        .route("/", post(multi_farmer::create_multi_farmer_bill))
        .route(
            "/:id",
            get(multi_farmer::get_multi_farmer_bill).delete(multi_farmer::delete_multi_farmer_bill),
        );

    let api_routes = Router::new()
        .nest("/bills", bill_routes)
        .nest("/multi-farmer-bills", multi_farmer_routes)
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route("/audit-events", get(audit::recent_events))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
