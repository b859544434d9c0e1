//! Azure Resource Manager access
//!
//! [`ArmClient`] authenticates as a service principal, issues the REST
//! calls behind [`crate::ResourceClient`] and waits out any long-running
//! operation before returning.

pub(crate) mod auth;
mod client;
pub mod error;
pub mod wire;

pub use client::{ArmClient, ArmClientBuilder, MYSQL_API_VERSION, RESOURCES_API_VERSION};
pub use error::ArmError;
