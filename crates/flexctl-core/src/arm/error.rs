//! ARM error classification
//!
//! Maps HTTP status codes and the `{"error": {"code", "message"}}` body ARM
//! returns onto typed variants so callers can branch without string
//! matching.

use super::wire::ErrorResponse;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`super::ArmClient`]
#[derive(Debug, Error)]
pub enum ArmError {
    /// Token request rejected, or the API answered 401/403
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// 404
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// 409, e.g. a name that is already in use
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// 429
    #[error("Throttled: {message}")]
    Throttled { message: String },

    /// 5xx
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status
    #[error("HTTP {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A long-running operation finished as Failed or Canceled
    #[error("Operation {status}: {message}")]
    OperationFailed { status: String, message: String },

    /// A configured endpoint is not an absolute URL
    #[error("Invalid endpoint '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    /// A long-running operation did not finish in time
    #[error("Operation timed out after {0:?}")]
    OperationTimeout(Duration),
}

impl ArmError {
    /// Build an error from a non-success response
    pub fn from_response(status: u16, body: &str) -> Self {
        let (code, detail) = match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) => (parsed.error.code.clone(), parsed.error.to_string()),
            Err(_) if body.trim().is_empty() => (String::new(), format!("HTTP {}", status)),
            Err(_) => (String::new(), body.trim().to_string()),
        };

        match status {
            401 | 403 => ArmError::Authentication { message: detail },
            404 => ArmError::NotFound { message: detail },
            409 => ArmError::Conflict { message: detail },
            429 => ArmError::Throttled { message: detail },
            500..=599 => ArmError::Server {
                status,
                message: detail,
            },
            _ => ArmError::Api {
                status,
                code,
                message: detail,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ArmError::NotFound { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ArmError::Authentication { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ArmError::Conflict { .. })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ArmError::OperationTimeout(_) => true,
            ArmError::Request(e) => e.is_timeout(),
            _ => false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ArmError::Throttled { .. } | ArmError::Server { .. } => true,
            ArmError::OperationTimeout(_) => true,
            ArmError::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
