pub mod credits;
pub mod gemini_client;
pub mod openai_client;
pub mod payments;
pub mod paypal_client;
pub mod products;
pub mod users;

use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::error::WorkflowError;

/// Transport-level failure talking to an external API. Non-2xx responses
/// keep the raw body so provider rejects stay debuggable from the logs.
#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api error status={status} body={body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiClientError {
    pub fn into_workflow(self, provider: &'static str) -> WorkflowError {
        match self {
            ApiClientError::InvalidResponse(detail) => {
                WorkflowError::Parse(format!("{provider}: {detail}"))
            }
            other => WorkflowError::Provider {
                provider,
                detail: other.to_string(),
            },
        }
    }
}

/// Shared handler tail: log the real error, answer with the taxonomy's
/// status and a generic message. Only missing-fields and the current
/// balance are considered safe detail.
pub(crate) fn error_response(context: &str, message: &str, err: &WorkflowError) -> HttpResponse {
    log::error!("{context}: {err}");

    let body = match err {
        WorkflowError::Validation { missing_fields, .. } if !missing_fields.is_empty() => json!({
            "success": false,
            "message": "Missing required fields",
            "missingFields": missing_fields,
        }),
        WorkflowError::Validation { message, .. } => json!({
            "success": false,
            "message": message,
        }),
        WorkflowError::InsufficientCredit { balance } => json!({
            "success": false,
            "message": "Insufficient credits. Please purchase more credits to continue.",
            "currentBalance": balance,
        }),
        WorkflowError::NotFound(what) => json!({
            "success": false,
            "message": format!("{what} not found"),
        }),
        _ => json!({
            "success": false,
            "message": message,
        }),
    };

    HttpResponse::build(err.status_code()).json(body)
}
