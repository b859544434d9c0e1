//! Handles returned by the management API and the request shapes sent to it
//!
//! These are provider-neutral; the ARM wire format lives in
//! [`crate::arm::wire`].

use serde::{Deserialize, Serialize};

/// Resource type string used for server-name availability checks
pub const FLEXIBLE_SERVER_TYPE: &str = "Microsoft.DBforMySQL/flexibleServers";

/// A resource group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// Result of a name availability check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAvailability {
    /// `None` when the provider did not say; treated as available
    pub available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NameAvailability {
    /// A definite "available" answer
    pub fn available() -> Self {
        Self {
            available: Some(true),
            ..Self::default()
        }
    }

    /// A definite "taken" answer
    pub fn taken(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            available: Some(false),
            reason: Some(reason.into()),
            message: Some(message.into()),
        }
    }

    /// Only an explicit `false` counts as unavailable
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.unwrap_or(true)
    }
}

/// Pricing tier of a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,
    pub tier: String,
}

impl Sku {
    pub fn new(name: impl Into<String>, tier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier: tier.into(),
        }
    }
}

/// Everything needed to create a server
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub region: String,
    pub sku: Sku,
    pub administrator_login: String,
    pub administrator_password: String,
    pub version: String,
    pub storage_mb: u64,
}

impl std::fmt::Debug for ServerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSpec")
            .field("region", &self.region)
            .field("sku", &self.sku)
            .field("administrator_login", &self.administrator_login)
            .field("administrator_password", &"[redacted]")
            .field("version", &self.version)
            .field("storage_mb", &self.storage_mb)
            .finish()
    }
}

/// Partial server update; only `Some` fields are sent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerUpdate {
    pub storage_mb: Option<u64>,
}

impl ServerUpdate {
    /// Create empty update
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new storage size
    #[must_use]
    pub fn with_storage_mb(mut self, storage_mb: u64) -> Self {
        self.storage_mb = Some(storage_mb);
        self
    }
}

/// A flexible server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrator_login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_qualified_domain_name: Option<String>,
}

/// A firewall rule allowing an IPv4 range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub name: String,
    pub start_ip_address: String,
    pub end_ip_address: String,
}

impl FirewallRule {
    /// The rule as a `(start, end)` pair
    pub fn range(&self) -> (&str, &str) {
        (&self.start_ip_address, &self.end_ip_address)
    }
}

/// A server configuration parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<String>,
}

impl Configuration {
    /// Value as a string slice, empty when unset
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}
