//! Audit DTOs

use serde::Deserialize;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

/// Query string for `GET /audit-events`
#[derive(Debug, Default, Deserialize)]
pub struct AuditEventsParams {
    pub limit: Option<u32>,
}

impl AuditEventsParams {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}
