//! Fixed inputs of a lifecycle run

use crate::error::{CoreError, Result};
use crate::model::{ServerSpec, Sku};
use crate::names::{MIN_RANDOM_CHARS, random_password};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

pub const DEFAULT_REGION: &str = "northeurope";
pub const DEFAULT_SKU_NAME: &str = "Standard_D16ds_v4";
pub const DEFAULT_SKU_TIER: &str = "GeneralPurpose";
pub const DEFAULT_ADMIN_LOGIN: &str = "mysqlsqladmin3423";
pub const DEFAULT_ENGINE_VERSION: &str = "5.7";
pub const DEFAULT_STORAGE_MB: u64 = 524_288;
pub const DEFAULT_UPDATED_STORAGE_MB: u64 = 1_048_576;
pub const DEFAULT_FIREWALL_RULE: &str = "FirewallRule";
pub const DEFAULT_CONFIGURATION: &str = "innodb_lru_scan_depth";
pub const DEFAULT_CONFIGURATION_VALUE: &str = "512";
pub const DEFAULT_CONFIGURATION_SOURCE: &str = "user-override";
pub const DEFAULT_RESOURCE_GROUP_PREFIX: &str = "rgMySql";
pub const DEFAULT_SERVER_PREFIX: &str = "netserver";
pub const DEFAULT_NAME_LENGTH: usize = 20;

/// Length of generated administrator passwords
pub const GENERATED_PASSWORD_LENGTH: usize = 16;

/// Inclusive IPv4 range of a firewall rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    pub start: String,
    pub end: String,
}

impl IpRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// A range covering exactly one address
    pub fn single(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            start: address.clone(),
            end: address,
        }
    }

    fn validate(&self, what: &str) -> Result<()> {
        let start = parse_ipv4(&self.start, what)?;
        let end = parse_ipv4(&self.end, what)?;
        if start > end {
            return Err(CoreError::Validation(format!(
                "{}: start address {} is after end address {}",
                what, self.start, self.end
            )));
        }
        Ok(())
    }
}

/// A configuration parameter and the value/source to persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationChange {
    pub name: String,
    pub value: String,
    pub source: String,
}

/// Everything a lifecycle run needs besides the client
///
/// Resource names are generated when the run starts unless pinned with
/// [`LifecyclePlan::with_names`].
#[derive(Clone, PartialEq, Eq)]
pub struct LifecyclePlan {
    pub resource_group_prefix: String,
    pub server_prefix: String,
    pub name_length: usize,
    pub resource_group_name: Option<String>,
    pub server_name: Option<String>,
    pub region: String,
    pub sku: Sku,
    pub administrator_login: String,
    pub administrator_password: String,
    pub version: String,
    pub storage_mb: u64,
    pub updated_storage_mb: u64,
    pub firewall_rule: String,
    pub firewall_range: IpRange,
    pub updated_firewall_range: IpRange,
    pub configuration: ConfigurationChange,
}

impl LifecyclePlan {
    /// Default plan with a freshly generated administrator password
    pub fn generate() -> Self {
        Self::with_password(random_password(GENERATED_PASSWORD_LENGTH))
    }

    /// Default plan with the given administrator password
    pub fn with_password(administrator_password: impl Into<String>) -> Self {
        Self {
            resource_group_prefix: DEFAULT_RESOURCE_GROUP_PREFIX.to_string(),
            server_prefix: DEFAULT_SERVER_PREFIX.to_string(),
            name_length: DEFAULT_NAME_LENGTH,
            resource_group_name: None,
            server_name: None,
            region: DEFAULT_REGION.to_string(),
            sku: Sku::new(DEFAULT_SKU_NAME, DEFAULT_SKU_TIER),
            administrator_login: DEFAULT_ADMIN_LOGIN.to_string(),
            administrator_password: administrator_password.into(),
            version: DEFAULT_ENGINE_VERSION.to_string(),
            storage_mb: DEFAULT_STORAGE_MB,
            updated_storage_mb: DEFAULT_UPDATED_STORAGE_MB,
            firewall_rule: DEFAULT_FIREWALL_RULE.to_string(),
            firewall_range: IpRange::single("10.0.0.1"),
            updated_firewall_range: IpRange::single("10.0.0.255"),
            configuration: ConfigurationChange {
                name: DEFAULT_CONFIGURATION.to_string(),
                value: DEFAULT_CONFIGURATION_VALUE.to_string(),
                source: DEFAULT_CONFIGURATION_SOURCE.to_string(),
            },
        }
    }

    /// Pin the resource group and server names instead of generating them
    #[must_use]
    pub fn with_names(
        mut self,
        resource_group: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        self.resource_group_name = Some(resource_group.into());
        self.server_name = Some(server.into());
        self
    }

    /// The create request for the server
    pub fn server_spec(&self) -> ServerSpec {
        ServerSpec {
            region: self.region.clone(),
            sku: self.sku.clone(),
            administrator_login: self.administrator_login.clone(),
            administrator_password: self.administrator_password.clone(),
            version: self.version.clone(),
            storage_mb: self.storage_mb,
        }
    }

    /// Check the plan before any remote call is made
    pub fn validate(&self) -> Result<()> {
        require("resource group prefix", &self.resource_group_prefix)?;
        require("server prefix", &self.server_prefix)?;
        if self.name_length <= MIN_RANDOM_CHARS {
            return Err(CoreError::Validation(format!(
                "name length must be greater than {}",
                MIN_RANDOM_CHARS
            )));
        }
        if let Some(ref name) = self.resource_group_name {
            require("resource group name", name)?;
        }
        if let Some(ref name) = self.server_name {
            require("server name", name)?;
        }

        require("region", &self.region)?;
        require("SKU name", &self.sku.name)?;
        require("SKU tier", &self.sku.tier)?;
        require("administrator login", &self.administrator_login)?;
        require("administrator password", &self.administrator_password)?;
        require("engine version", &self.version)?;

        if self.storage_mb == 0 {
            return Err(CoreError::Validation(
                "storage size must be greater than zero".to_string(),
            ));
        }
        if self.updated_storage_mb < self.storage_mb {
            return Err(CoreError::Validation(format!(
                "storage can only grow: {} MB -> {} MB",
                self.storage_mb, self.updated_storage_mb
            )));
        }

        require("firewall rule name", &self.firewall_rule)?;
        self.firewall_range.validate("firewall range")?;
        self.updated_firewall_range.validate("updated firewall range")?;

        require("configuration name", &self.configuration.name)?;
        require("configuration value", &self.configuration.value)?;
        require("configuration source", &self.configuration.source)?;
        Ok(())
    }
}

impl std::fmt::Debug for LifecyclePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecyclePlan")
            .field("resource_group_prefix", &self.resource_group_prefix)
            .field("server_prefix", &self.server_prefix)
            .field("name_length", &self.name_length)
            .field("resource_group_name", &self.resource_group_name)
            .field("server_name", &self.server_name)
            .field("region", &self.region)
            .field("sku", &self.sku)
            .field("administrator_login", &self.administrator_login)
            .field("administrator_password", &"[redacted]")
            .field("version", &self.version)
            .field("storage_mb", &self.storage_mb)
            .field("updated_storage_mb", &self.updated_storage_mb)
            .field("firewall_rule", &self.firewall_rule)
            .field("firewall_range", &self.firewall_range)
            .field("updated_firewall_range", &self.updated_firewall_range)
            .field("configuration", &self.configuration)
            .finish()
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(CoreError::Validation(format!("{} must not be empty", what)))
    } else {
        Ok(())
    }
}

fn parse_ipv4(value: &str, what: &str) -> Result<Ipv4Addr> {
    value
        .parse()
        .map_err(|_| CoreError::Validation(format!("{}: '{}' is not an IPv4 address", what, value)))
}
