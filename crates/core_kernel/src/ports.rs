//! Ports and Adapters Infrastructure
//!
//! Shared types for the hexagonal layout of the workspace. The settlement
//! domain declares its port traits (settings, bill storage, audit trail) on
//! top of the marker and error types here; `infra_db` provides PostgreSQL
//! adapters and the domain crate ships in-memory adapters for tests.
//!
//! ```text
//!   SettlementService ──▶ SettingsPort / BillRepositoryPort / AuditPort
//!                                   ▲                 ▲
//!                        PostgreSQL adapters     in-memory adapters
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by every port
///
/// Adapters translate their native failures into one of these variants so
/// the service layer can tell "absent" from "conflicting" from "broken".
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The store rejected the data, e.g. a check constraint
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The record already exists
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Service unavailable: {service}")]
    ServiceUnavailable { service: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// True when retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. } | PortError::ServiceUnavailable { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Outcome of one adapter health probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        }
    }

    pub fn unhealthy(adapter_id: impl Into<String>, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(message.into()),
            checked_at: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Adapters that can probe their backing system
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

/// Who asked for a port operation
///
/// The API fills `initiated_by` from the bearer token subject; the settings
/// port stores it as `updated_by` and the service copies it onto audit
/// events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationMetadata {
    pub initiated_by: Option<String>,
}

impl OperationMetadata {
    pub fn initiated_by(actor: impl Into<String>) -> Self {
        Self {
            initiated_by: Some(actor.into()),
        }
    }

    /// Returns the actor, or "system" when none was recorded
    pub fn actor(&self) -> &str {
        self.initiated_by.as_deref().unwrap_or("system")
    }
}
