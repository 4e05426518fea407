use std::path::PathBuf;

use thiserror::Error;

/// Reasons a submitted draft is rejected before it reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("every appointment field is required")]
    MissingFields,
    #[error("phone must be 9 digits starting with 9")]
    InvalidPhone,
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::MissingFields => "All fields are required",
            ValidationError::InvalidPhone => "Invalid phone number",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("appointment store is not open")]
    NotInitialized,
    #[error("opening appointment store {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },
    #[error("{operation} failed: {reason}")]
    OperationFailed {
        operation: &'static str,
        reason: String,
    },
    #[error("appointment {0} could not be deleted")]
    DeleteFailed(i64),
    #[error("appointment has no id to update")]
    MissingId,
}

impl StoreError {
    pub(crate) fn operation(operation: &'static str, err: anyhow::Error) -> Self {
        StoreError::OperationFailed {
            operation,
            reason: format!("{err:#}"),
        }
    }
}
