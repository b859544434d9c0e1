//! Progress tracking and polling for long-running ARM operations
//!
//! Creates, updates and deletes of servers and resource groups answer with
//! `201`/`202` and a status URL that must be polled until the operation
//! finishes. This module does that polling with optional progress callbacks
//! for UI updates.

use crate::arm::{ArmClient, ArmError};
use crate::config::PollingConfig;
use std::time::{Duration, Instant};

/// Progress events emitted while waiting on an operation
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The provider accepted the request and handed back a status URL
    Started { operation: String },
    /// Polling iteration with current status
    Polling {
        operation: String,
        status: String,
        elapsed: Duration,
    },
    /// Operation finished successfully
    Completed { operation: String, elapsed: Duration },
    /// Operation failed or was cancelled
    Failed { operation: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive a spinner; library callers usually pass none.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Where to look for the outcome of an accepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    /// `Azure-AsyncOperation` header: a status document with a `status` field
    AsyncOperation { url: String },
    /// `Location` header: answers `202` until the operation is done
    Location { url: String },
}

/// Normalised operation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationState {
    /// Classify a provider status string (case-insensitive)
    pub fn from_status(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "succeeded" | "success" | "completed" => OperationState::Succeeded,
            "failed" | "error" => OperationState::Failed,
            "canceled" | "cancelled" => OperationState::Canceled,
            _ => OperationState::InProgress,
        }
    }
}

/// Poll an accepted operation until it finishes
///
/// # Arguments
///
/// * `client` - The ARM client (supplies the bearer token)
/// * `operation` - Label used in progress events, e.g. `PUT flexibleServers/netserver01`
/// * `pending` - Status URL taken from the initial response
/// * `polling` - Timeout and interval
/// * `on_progress` - Optional callback for progress updates
///
/// # Example
///
/// ```rust,ignore
/// let pending = PendingOperation::AsyncOperation { url };
/// poll_operation(
///     &client,
///     "DELETE resourcegroups/rgMySql01",
///     &pending,
///     PollingConfig::default(),
///     Some(&callback),
/// ).await?;
/// ```
pub async fn poll_operation(
    client: &ArmClient,
    operation: &str,
    pending: &PendingOperation,
    polling: PollingConfig,
    on_progress: Option<&ProgressCallback>,
) -> Result<(), ArmError> {
    let start = Instant::now();
    let timeout = polling.timeout();

    emit(
        on_progress,
        ProgressEvent::Started {
            operation: operation.to_string(),
        },
    );

    loop {
        let (state, status, error) = match pending {
            PendingOperation::AsyncOperation { url } => {
                let doc = client.get_operation_status(url).await?;
                let state = OperationState::from_status(&doc.status);
                let error = doc.error.map(|e| e.to_string());
                (state, doc.status, error)
            }
            PendingOperation::Location { url } => {
                if client.location_is_pending(url).await? {
                    (OperationState::InProgress, "InProgress".to_string(), None)
                } else {
                    (OperationState::Succeeded, "Succeeded".to_string(), None)
                }
            }
        };

        let elapsed = start.elapsed();
        emit(
            on_progress,
            ProgressEvent::Polling {
                operation: operation.to_string(),
                status: status.clone(),
                elapsed,
            },
        );

        match state {
            OperationState::Succeeded => {
                emit(
                    on_progress,
                    ProgressEvent::Completed {
                        operation: operation.to_string(),
                        elapsed: start.elapsed(),
                    },
                );
                return Ok(());
            }
            OperationState::Failed | OperationState::Canceled => {
                let message =
                    error.unwrap_or_else(|| format!("Operation ended with status: {}", status));
                emit(
                    on_progress,
                    ProgressEvent::Failed {
                        operation: operation.to_string(),
                        error: message.clone(),
                    },
                );
                return Err(ArmError::OperationFailed { status, message });
            }
            OperationState::InProgress if elapsed >= timeout => {
                emit(
                    on_progress,
                    ProgressEvent::Failed {
                        operation: operation.to_string(),
                        error: format!("timed out after {:?}", timeout),
                    },
                );
                return Err(ArmError::OperationTimeout(timeout));
            }
            OperationState::InProgress => {
                tokio::time::sleep(polling.interval()).await;
            }
        }
    }
}

fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
