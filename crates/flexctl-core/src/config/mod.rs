//! Configuration and profile management
//!
//! - Named profiles of service principal credentials
//! - `keyring:` secret references (optional `secure-storage` feature)
//! - `${VAR}` expansion in the config file
//! - `AZURE_*` environment variables as a complete or partial override

// Allow nested config module - the file mirrors the subsystem name
#![allow(clippy::module_inception)]

pub mod config;
pub mod credential;
pub mod error;
pub mod polling;

pub use config::{
    Config, DEFAULT_AUTHORITY_HOST, DEFAULT_MANAGEMENT_ENDPOINT, ENV_AUTHORITY_HOST,
    ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_MANAGEMENT_ENDPOINT, ENV_SECRET, ENV_SUBSCRIPTION_ID,
    ENV_TENANT_ID, Profile, ServicePrincipal,
};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
pub use polling::PollingConfig;
