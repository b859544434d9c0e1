//! The remote resource client capability set
//!
//! The lifecycle workflow only ever talks to the provider through this
//! trait, so it can run against [`crate::arm::ArmClient`] or against
//! [`crate::testing::InMemoryResourceClient`].
//!
//! Every call completes before it returns, including any provider-side
//! long-running operation it starts.

use crate::error::Result;
use crate::model::{
    Configuration, FirewallRule, NameAvailability, ResourceGroup, Server, ServerSpec, ServerUpdate,
};
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Create (or update) a resource group in `region`
    async fn create_resource_group(&self, name: &str, region: &str) -> Result<ResourceGroup>;

    /// Delete a resource group and everything in it
    ///
    /// A group that is already gone is not an error.
    async fn delete_resource_group(&self, name: &str) -> Result<()>;

    /// Ask whether `name` is free for a resource of `resource_type`
    async fn check_name_availability(
        &self,
        name: &str,
        resource_type: &str,
    ) -> Result<NameAvailability>;

    async fn create_server(&self, group: &str, server: &str, spec: &ServerSpec) -> Result<Server>;

    async fn update_server(
        &self,
        group: &str,
        server: &str,
        update: &ServerUpdate,
    ) -> Result<Server>;

    async fn delete_server(&self, group: &str, server: &str) -> Result<()>;

    /// Upsert a firewall rule keyed by `rule`
    async fn create_or_update_firewall_rule(
        &self,
        group: &str,
        server: &str,
        rule: &str,
        start_ip: &str,
        end_ip: &str,
    ) -> Result<FirewallRule>;

    /// All firewall rules on a server, fully paged
    async fn list_firewall_rules(&self, group: &str, server: &str) -> Result<Vec<FirewallRule>>;

    async fn delete_firewall_rule(&self, group: &str, server: &str, rule: &str) -> Result<()>;

    async fn get_configuration(&self, group: &str, server: &str, key: &str)
    -> Result<Configuration>;

    async fn update_configuration(
        &self,
        group: &str,
        server: &str,
        key: &str,
        value: &str,
        source: &str,
    ) -> Result<Configuration>;
}
