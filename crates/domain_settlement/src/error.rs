//! Settlement domain errors
//!
//! The engine has exactly two failure families. Validation errors mean the
//! caller handed over malformed or inconsistent weighings and must correct
//! them; configuration errors mean a resolved policy value is invalid. The
//! engine performs no I/O, so nothing here is ever transient.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while settling bags into a bill
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// Malformed or inconsistent input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid resolved policy value
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SettlementError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        SettlementError::Validation(message.into())
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        SettlementError::Configuration(message.into())
    }

    pub(crate) fn no_bags(context: &str) -> Self {
        SettlementError::Validation(format!("{} has no bags", context))
    }

    pub(crate) fn duplicate_bag_number(context: &str, bag_number: u32) -> Self {
        SettlementError::Validation(format!(
            "{}: bag number {} appears more than once",
            context, bag_number
        ))
    }

    pub(crate) fn negative_weight(context: &str, bag_number: u32, weight: Decimal) -> Self {
        SettlementError::Validation(format!(
            "{}: bag {} has negative weight {} kg",
            context, bag_number, weight
        ))
    }

    pub(crate) fn negative_rate(rate: Decimal) -> Self {
        SettlementError::Configuration(format!(
            "rate per 100 kg must not be negative, got {}",
            rate
        ))
    }

    pub(crate) fn overflow(what: &str) -> Self {
        SettlementError::Validation(format!("{} exceeds the representable range", what))
    }

    /// Returns true for caller-correctable input errors
    pub fn is_validation(&self) -> bool {
        matches!(self, SettlementError::Validation(_))
    }

    /// Returns true for invalid policy values
    pub fn is_configuration(&self) -> bool {
        matches!(self, SettlementError::Configuration(_))
    }
}
