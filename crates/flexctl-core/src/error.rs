//! Unified error handling for flexctl-core
//!
//! Every remote call surfaces as [`CoreError::Remote`]; the workflow adds
//! its own conditions on top.
//!
//! # Example
//!
//! ```rust
//! use flexctl_core::{CoreError, Result};
//! use flexctl_core::arm::ArmError;
//!
//! fn handle_error(err: CoreError) {
//!     if err.is_not_found() {
//!         println!("Resource not found");
//!     } else if err.is_retryable() {
//!         println!("Temporary error, can retry");
//!     }
//! }
//!
//! // ARM errors are automatically converted
//! let arm_err = ArmError::NotFound { message: "server not found".to_string() };
//! let core_err: CoreError = arm_err.into();
//! assert!(core_err.is_not_found());
//! ```

use crate::arm::ArmError;
use crate::config::ConfigError;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// A create/update/delete/get call against the management API failed
    #[error("Remote operation failed: {0}")]
    Remote(#[from] ArmError),

    /// The provider reported the chosen server name as taken
    #[error("Server name '{name}' is not available: {message}")]
    NameUnavailable { name: String, message: String },

    /// Input rejected before any remote call was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            CoreError::Remote(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            CoreError::Remote(e) => e.is_unauthorized(),
            _ => false,
        }
    }

    /// Returns true if this is a conflict error (409)
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            CoreError::Remote(e) => e.is_conflict(),
            _ => false,
        }
    }

    /// Returns true if a long-running operation timed out
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Remote(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if the server name was reported as taken
    #[must_use]
    pub fn is_name_unavailable(&self) -> bool {
        matches!(self, CoreError::NameUnavailable { .. })
    }

    /// Returns true if this error is potentially retryable
    ///
    /// The lifecycle workflow never retries; callers driving individual
    /// operations may.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Remote(e) => e.is_retryable(),
            _ => false,
        }
    }
}
