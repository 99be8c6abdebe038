use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// User input was rejected before anything was written.
    #[error("invalid input: {0}")]
    Validation(String),
    /// A read or write against the store failed.
    #[error("storage failure")]
    Storage(#[source] StorageError),
    /// The ledger and the roster disagree; this points at a bug.
    #[error("inconsistent state: {0}")]
    Consistency(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A second submission arrived inside the debounce window.
    #[error("submission ignored: too soon after the previous one")]
    Debounced,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Storage(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::Validation(describe_validation(&err))
    }
}

/// Machine-checkable classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad user input.
    Validation,
    /// Persistence failure.
    Storage,
    /// Ledger/roster mismatch.
    Consistency,
    /// Operation not allowed right now.
    InvalidState,
    /// Unknown resource.
    NotFound,
    /// Double submission.
    Debounced,
}

impl ServiceError {
    /// Classification of the error for callers that branch on it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Storage(_) => ErrorKind::Storage,
            ServiceError::Consistency(_) => ErrorKind::Consistency,
            ServiceError::InvalidState(_) => ErrorKind::InvalidState,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Debounced => ErrorKind::Debounced,
        }
    }

    /// Message suitable for showing to the player.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Validation(message) => message.clone(),
            ServiceError::Storage(source) => format!("Could not save the game: {source}"),
            ServiceError::Consistency(message) => {
                format!("Game data is out of sync ({message}); please restart the game")
            }
            ServiceError::InvalidState(message) | ServiceError::NotFound(message) => {
                message.clone()
            }
            ServiceError::Debounced => "Please wait a moment before submitting again".into(),
        }
    }
}

/// Error payload handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// What went wrong, for branching.
    pub kind: ErrorKind,
    /// What went wrong, for humans.
    pub message: String,
}

impl From<&ServiceError> for ErrorReport {
    fn from(err: &ServiceError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
        }
    }
}

impl From<ServiceError> for ErrorReport {
    fn from(err: ServiceError) -> Self {
        (&err).into()
    }
}

/// Flatten validator output into the first human readable message.
fn describe_validation(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid ({})", err.code),
            })
        })
        .next()
        .unwrap_or_else(|| format!("validation failed: {errors}"))
}
