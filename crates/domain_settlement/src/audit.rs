//! Audit trail entries

use std::fmt;

use chrono::{DateTime, Utc};
use core_kernel::AuditEventId;
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    BillCreated,
    BillUpdated,
    BillDeleted,
    MultiFarmerBillCreated,
    MultiFarmerBillDeleted,
    SettingsUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::BillCreated => "bill_created",
            AuditAction::BillUpdated => "bill_updated",
            AuditAction::BillDeleted => "bill_deleted",
            AuditAction::MultiFarmerBillCreated => "multi_farmer_bill_created",
            AuditAction::MultiFarmerBillDeleted => "multi_farmer_bill_deleted",
            AuditAction::SettingsUpdated => "settings_updated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bill_created" => Some(AuditAction::BillCreated),
            "bill_updated" => Some(AuditAction::BillUpdated),
            "bill_deleted" => Some(AuditAction::BillDeleted),
            "multi_farmer_bill_created" => Some(AuditAction::MultiFarmerBillCreated),
            "multi_farmer_bill_deleted" => Some(AuditAction::MultiFarmerBillDeleted),
            "settings_updated" => Some(AuditAction::SettingsUpdated),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded change to a bill or to the settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub action: AuditAction,
    /// Bill id, or "settings"
    pub entity_id: String,
    pub actor: String,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, entity_id: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            id: AuditEventId::new_v7(),
            action,
            entity_id: entity_id.into(),
            actor: actor.into(),
            details: serde_json::Value::Null,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
