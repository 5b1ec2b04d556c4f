//! Core error types for fieldtime.
//!
//! The taxonomy distinguishes failures that are never retried (validation,
//! conflict, authorization) from transient infrastructure failures the sync
//! engine retries with backoff.

use std::collections::BTreeMap;

use thiserror::Error;

/// Core error type shared by the queue, sync engine, and services.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input violates an invariant. Never retried; surfaced to the
    /// submitting actor before anything is queued.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Network or remote-service unavailability. Retried with exponential
    /// backoff up to the configured cap.
    #[error("Transient failure: {message}")]
    Transient { message: String },

    /// A concurrent actor already advanced the record, or a referenced
    /// entity no longer exists. Never retried automatically.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The actor lacks permission for the requested operation or stage.
    /// Fatal for that operation.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Not found: {entity} with {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Whether the sync engine may retry the operation that produced this.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Field-keyed validation errors, accumulated by contracts.
///
/// A `BTreeMap` keeps `full_messages` output stable for error rendering and
/// for tests.
#[derive(Error, Debug, Default, Clone)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field name -> messages.
    pub errors: BTreeMap<String, Vec<String>>,
    /// Errors not tied to a specific field.
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    /// Flatten into `"<field> <message>"` strings for display.
    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// Finish a validation pass: `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_field_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("start_time", "must align to a 15 minute boundary");
        errors.add("start_time", "must be before finish_time");
        errors.add_base("project and plant are mutually exclusive");

        assert!(!errors.is_empty());
        assert!(errors.has_error("start_time"));
        assert_eq!(errors.get("start_time").map(Vec::len), Some(2));
        assert_eq!(errors.full_messages().len(), 3);
    }

    #[test]
    fn into_result_passes_clean_value_through() {
        let errors = ValidationErrors::new();
        assert_eq!(errors.into_result(42).unwrap(), 42);
    }

    #[test]
    fn retryable_classification() {
        assert!(CoreError::transient("socket closed").is_retryable());
        assert!(!CoreError::conflict("already approved").is_retryable());
        assert!(!CoreError::unauthorized("wrong stage").is_retryable());
    }
}
