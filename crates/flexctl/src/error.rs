//! Error types for flexctl
//!
//! Every failure the binary reports goes through [`FlexCtlError`] so the
//! user gets one message plus concrete next steps.

use colored::Colorize;
use flexctl_core::arm::ArmError;
use flexctl_core::lifecycle::{CleanupOutcome, LifecycleError};
use flexctl_core::{ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Step 4 (create server) failed: Conflict: ServerNameAlreadyExists
///   cleanup: resource group rgMySql5kq0w8dp2zv7 was not deleted
///
///   tip: delete it by hand:
///       flexctl cleanup rgMySql5kq0w8dp2zv7
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the flexctl application
#[derive(Error, Debug)]
pub enum FlexCtlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured and AZURE_* credentials are not set")]
    NoProfileConfigured,

    #[error("Missing credentials: {message}")]
    MissingCredentials { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Server name '{name}' is not available: {message}")]
    NameUnavailable { name: String, message: String },

    /// A lifecycle step failed; `leftover_group` is set when cleanup failed too
    #[error("{message}")]
    LifecycleFailed {
        message: String,
        cleanup_error: Option<String>,
        leftover_group: Option<String>,
    },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for flexctl operations
pub type Result<T> = std::result::Result<T, FlexCtlError>;

impl FlexCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            FlexCtlError::ProfileNotFound { name } => vec![
                "List available profiles: flexctl profile list".to_string(),
                format!(
                    "Create profile '{}': flexctl profile set {} --tenant-id <id> --client-id <id> --subscription-id <id>",
                    name, name
                ),
            ],
            FlexCtlError::NoProfileConfigured => vec![
                "Export AZURE_TENANT_ID, AZURE_CLIENT_ID, AZURE_SECRET and AZURE_SUBSCRIPTION_ID".to_string(),
                "Or create a profile: flexctl profile set <name> --tenant-id <id> --client-id <id> --subscription-id <id>".to_string(),
                "Rehearse without credentials: flexctl run --dry-run".to_string(),
            ],
            FlexCtlError::MissingCredentials { .. } => vec![
                "Check profile details: flexctl profile show <profile>".to_string(),
                "Verify environment variables are set correctly".to_string(),
            ],
            FlexCtlError::AuthenticationFailed { .. } => vec![
                "Check the service principal: flexctl profile show <profile>".to_string(),
                "Verify the client secret has not expired".to_string(),
                "Ensure the principal has Contributor rights on the subscription".to_string(),
            ],
            FlexCtlError::ApiError { message } if message.contains("404") => vec![
                "Verify the resource name is correct".to_string(),
                "Check that you're using the correct subscription".to_string(),
            ],
            FlexCtlError::NameUnavailable { .. } => vec![
                "Run again to get a fresh generated name".to_string(),
                "Or pick another name: flexctl run --server-name <name>".to_string(),
            ],
            FlexCtlError::LifecycleFailed {
                leftover_group: Some(group),
                ..
            } => vec![format!(
                "The resource group is still there. Delete it with: flexctl cleanup {}",
                group
            )],
            FlexCtlError::Timeout { .. } => vec![
                "Raise the wait limit: flexctl run --wait-timeout <secs>".to_string(),
                "Check the operation in the Azure portal".to_string(),
            ],
            FlexCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: flexctl <command> --help".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        if let FlexCtlError::LifecycleFailed {
            cleanup_error: Some(cleanup),
            leftover_group: Some(group),
            ..
        } = self
        {
            diag = diag.detail(&format!(
                "cleanup: resource group {} was not deleted: {}",
                group, cleanup
            ));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<ArmError> for FlexCtlError {
    fn from(err: ArmError) -> Self {
        match err {
            ArmError::Authentication { message } => FlexCtlError::AuthenticationFailed { message },
            ArmError::OperationTimeout(duration) => FlexCtlError::Timeout {
                message: format!("Operation timed out after {} seconds", duration.as_secs()),
            },
            ArmError::InvalidEndpoint { .. } => FlexCtlError::Config(err.to_string()),
            _ => FlexCtlError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for FlexCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => FlexCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => FlexCtlError::NoProfileConfigured,
            ConfigError::MissingCredential { .. } | ConfigError::CredentialError(_) => {
                FlexCtlError::MissingCredentials {
                    message: err.to_string(),
                }
            }
            _ => FlexCtlError::Config(err.to_string()),
        }
    }
}

impl From<CoreError> for FlexCtlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Remote(arm_err) => FlexCtlError::from(arm_err),
            CoreError::NameUnavailable { name, message } => {
                FlexCtlError::NameUnavailable { name, message }
            }
            CoreError::Validation(message) => FlexCtlError::InvalidInput { message },
            CoreError::Config(config_err) => FlexCtlError::from(config_err),
        }
    }
}

impl From<LifecycleError> for FlexCtlError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidPlan(cause) => FlexCtlError::from(cause),
            LifecycleError::StepFailed {
                ref resource_group,
                ref cleanup,
                ..
            } => {
                let (cleanup_error, leftover_group) = match cleanup {
                    CleanupOutcome::Deleted => (None, None),
                    CleanupOutcome::Failed(e) => {
                        (Some(e.to_string()), Some(resource_group.clone()))
                    }
                };
                FlexCtlError::LifecycleFailed {
                    message: err.to_string(),
                    cleanup_error,
                    leftover_group,
                }
            }
        }
    }
}

impl From<serde_json::Error> for FlexCtlError {
    fn from(err: serde_json::Error) -> Self {
        FlexCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for FlexCtlError {
    fn from(err: std::io::Error) -> Self {
        FlexCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for FlexCtlError {
    fn from(err: anyhow::Error) -> Self {
        FlexCtlError::Config(err.to_string())
    }
}
