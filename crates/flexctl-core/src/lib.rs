//! # flexctl-core
//!
//! Shared engine behind the `flexctl` CLI. It provisions a managed MySQL
//! flexible server, exercises its firewall rules and configuration, and
//! tears everything down again, deleting the owning resource group as a
//! compensating action when any step fails.
//!
//! ## Layers
//!
//! - [`client`] - the [`ResourceClient`] capability set the workflow needs
//! - [`arm`] - a [`ResourceClient`] over the Azure Resource Manager REST API
//! - [`testing`] - an in-memory [`ResourceClient`] for tests and dry runs
//! - [`lifecycle`] - the provision/configure/teardown workflow itself
//! - [`config`] - profiles, credentials, polling settings
//!
//! ## Example
//!
//! ```rust,no_run
//! use flexctl_core::arm::ArmClient;
//! use flexctl_core::config::ServicePrincipal;
//! use flexctl_core::lifecycle::{LifecyclePlan, LoggingHooks, run_lifecycle};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let principal = ServicePrincipal::from_env()?;
//! let client = ArmClient::new(&principal)?;
//!
//! let plan = LifecyclePlan::generate();
//! let report = run_lifecycle(&client, &plan, &LoggingHooks).await?;
//! println!("{} deleted", report.resource_group);
//! # Ok(())
//! # }
//! ```

pub mod arm;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod names;
pub mod progress;
pub mod testing;

pub use client::ResourceClient;
pub use config::{Config, ConfigError, PollingConfig, Profile, ServicePrincipal};
pub use error::{CoreError, Result};
pub use progress::{ProgressCallback, ProgressEvent};
