use serde_json::{Value, json};
use thiserror::Error;

use tally_core::DomainError;
use tally_infra::{LedgerError, StorageError};

/// Errors reported to the presentation layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Consistency(String),

    #[error("{0}")]
    Storage(String),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidRequest(_) => "invalid_request",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Consistency(_) => "consistency_error",
            ServiceError::Storage(_) => "storage_error",
        }
    }

    pub fn to_json(&self) -> Value {
        json_error(self.code(), self.to_string())
    }
}

pub fn json_error(code: &'static str, message: impl Into<String>) -> Value {
    json!({
        "error": code,
        "message": message.into(),
    })
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(format!("{what} not found")),
            DomainError::Consistency(msg) => ServiceError::Consistency(msg),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Domain(e) => e.into(),
            LedgerError::Storage(e) => e.into(),
        }
    }
}
