//! Workflow error taxonomy and HTTP status mapping.

use actix_web::http::StatusCode;
use thiserror::Error;

/// The workflow-level error taxonomy (spec §7). Each variant carries only the
/// detail the handlers are allowed to surface; everything else is logged.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Request failed validation (400). May carry a list of missing fields.
    #[error("validation: {message}")]
    Validation {
        message: String,
        missing_fields: Vec<String>,
    },

    /// The user lacks the credits required for the operation (402).
    #[error("insufficient credit: balance {balance}")]
    InsufficientCredit { balance: i64 },

    /// A referenced entity does not exist (404).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A downstream provider (PayPal/OpenAI/Gemini) returned a failure (502).
    #[error("provider {provider}: {detail}")]
    Provider {
        provider: &'static str,
        detail: String,
    },

    /// Malformed planning output or order metadata (500).
    #[error("parse: {0}")]
    Parse(String),

    /// Database failure (500).
    #[error("persistence: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Object-storage failure (500).
    #[error("storage: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// A validation error with no specific missing-field list.
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            message: message.into(),
            missing_fields: Vec::new(),
        }
    }

    /// A validation error naming the required fields that were absent.
    pub fn missing_fields(missing: Vec<String>) -> Self {
        WorkflowError::Validation {
            message: "Missing required fields".to_string(),
            missing_fields: missing,
        }
    }

    /// The HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::Validation { .. } => StatusCode::BAD_REQUEST,
            WorkflowError::InsufficientCredit { .. } => StatusCode::PAYMENT_REQUIRED,
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::Provider { .. } => StatusCode::BAD_GATEWAY,
            WorkflowError::Parse(_)
            | WorkflowError::Persistence(_)
            | WorkflowError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
