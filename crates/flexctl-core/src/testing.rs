//! In-memory [`ResourceClient`]
//!
//! Behaves like the provider where the workflow can observe it: upserts are
//! keyed by name, deleting a group removes everything under it, and
//! deleting a missing group succeeds. Failures can be injected per
//! operation, and every call is recorded.
//!
//! ```rust
//! use flexctl_core::lifecycle::{LifecyclePlan, NoopHooks, run_lifecycle};
//! use flexctl_core::testing::{InMemoryResourceClient, Operation};
//!
//! # tokio_test_block_on(async {
//! let client = InMemoryResourceClient::new();
//! client.fail_on(Operation::UpdateServer);
//!
//! let err = run_lifecycle(&client, &LifecyclePlan::generate(), &NoopHooks)
//!     .await
//!     .unwrap_err();
//! assert!(err.cleanup().unwrap().is_deleted());
//! assert!(client.resource_groups().is_empty());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use crate::arm::ArmError;
use crate::client::ResourceClient;
use crate::error::Result;
use crate::model::{
    Configuration, FirewallRule, NameAvailability, ResourceGroup, Server, ServerSpec, ServerUpdate,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Server parameters every new in-memory server starts with
const DEFAULT_CONFIGURATIONS: &[(&str, &str, &str)] = &[
    ("innodb_lru_scan_depth", "1024", "integer"),
    ("max_connections", "2730", "integer"),
    ("slow_query_log", "OFF", "enumeration"),
    ("time_zone", "SYSTEM", "string"),
];

/// The [`ResourceClient`] methods, for failure injection and the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateResourceGroup,
    DeleteResourceGroup,
    CheckNameAvailability,
    CreateServer,
    UpdateServer,
    DeleteServer,
    CreateOrUpdateFirewallRule,
    ListFirewallRules,
    DeleteFirewallRule,
    GetConfiguration,
    UpdateConfiguration,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone)]
struct ServerState {
    server: Server,
    firewall_rules: BTreeMap<String, FirewallRule>,
    configurations: BTreeMap<String, Configuration>,
}

#[derive(Debug, Clone)]
struct GroupState {
    region: String,
    servers: BTreeMap<String, ServerState>,
}

#[derive(Debug, Clone, Copy)]
struct Failure {
    operation: Operation,
    /// 1-based call number, `None` for every call
    nth: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    groups: BTreeMap<String, GroupState>,
    taken_names: HashSet<String>,
    failures: Vec<Failure>,
    calls: Vec<Operation>,
}

/// A provider simulation held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryResourceClient {
    state: Mutex<State>,
}

impl InMemoryResourceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `name` as taken by another subscription
    pub fn mark_name_taken(&self, name: impl Into<String>) {
        self.lock().taken_names.insert(name.into());
    }

    /// Make every call to `operation` fail
    pub fn fail_on(&self, operation: Operation) {
        self.lock().failures.push(Failure {
            operation,
            nth: None,
        });
    }

    /// Make only the `nth` (1-based) call to `operation` fail
    pub fn fail_on_call(&self, operation: Operation, nth: usize) {
        self.lock().failures.push(Failure {
            operation,
            nth: Some(nth),
        });
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|op| **op == operation)
            .count()
    }

    /// Names of the resource groups that currently exist
    pub fn resource_groups(&self) -> Vec<String> {
        self.lock().groups.keys().cloned().collect()
    }

    pub fn server(&self, group: &str, server: &str) -> Option<Server> {
        self.lock()
            .groups
            .get(group)
            .and_then(|g| g.servers.get(server))
            .map(|s| s.server.clone())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and return the state, or the injected failure
    fn begin(&self, operation: Operation) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(operation);
        let count = state.calls.iter().filter(|op| **op == operation).count();

        let injected = state
            .failures
            .iter()
            .any(|f| f.operation == operation && f.nth.is_none_or(|n| n == count));
        if injected {
            debug!("Injected failure for {} (call {})", operation, count);
            return Err(ArmError::Server {
                status: 500,
                message: format!("injected failure in {}", operation),
            }
            .into());
        }
        Ok(state)
    }
}

fn not_found(what: impl fmt::Display) -> ArmError {
    ArmError::NotFound {
        message: format!("{} was not found", what),
    }
}

impl State {
    fn group_mut(&mut self, group: &str) -> std::result::Result<&mut GroupState, ArmError> {
        self.groups
            .get_mut(group)
            .ok_or_else(|| not_found(format_args!("Resource group '{}'", group)))
    }

    fn server_mut(
        &mut self,
        group: &str,
        server: &str,
    ) -> std::result::Result<&mut ServerState, ArmError> {
        self.group_mut(group)?
            .servers
            .get_mut(server)
            .ok_or_else(|| not_found(format_args!("Server '{}'", server)))
    }

    fn server_exists(&self, name: &str) -> bool {
        self.groups.values().any(|g| g.servers.contains_key(name))
    }
}

fn default_configurations() -> BTreeMap<String, Configuration> {
    DEFAULT_CONFIGURATIONS
        .iter()
        .map(|(name, value, data_type)| {
            let config = Configuration {
                name: name.to_string(),
                value: Some(value.to_string()),
                source: Some("system-default".to_string()),
                default_value: Some(value.to_string()),
                data_type: Some(data_type.to_string()),
                allowed_values: None,
            };
            (name.to_string(), config)
        })
        .collect()
}

#[async_trait]
impl ResourceClient for InMemoryResourceClient {
    async fn create_resource_group(&self, name: &str, region: &str) -> Result<ResourceGroup> {
        let mut state = self.begin(Operation::CreateResourceGroup)?;
        let group = state
            .groups
            .entry(name.to_string())
            .or_insert_with(|| GroupState {
                region: region.to_string(),
                servers: BTreeMap::new(),
            });
        group.region = region.to_string();

        Ok(ResourceGroup {
            name: name.to_string(),
            region: region.to_string(),
            id: Some(format!("/resourceGroups/{}", name)),
            provisioning_state: Some("Succeeded".to_string()),
        })
    }

    async fn delete_resource_group(&self, name: &str) -> Result<()> {
        let mut state = self.begin(Operation::DeleteResourceGroup)?;
        if state.groups.remove(name).is_none() {
            debug!("Resource group {} already absent", name);
        }
        Ok(())
    }

    async fn check_name_availability(
        &self,
        name: &str,
        _resource_type: &str,
    ) -> Result<NameAvailability> {
        let state = self.begin(Operation::CheckNameAvailability)?;
        if state.taken_names.contains(name) || state.server_exists(name) {
            Ok(NameAvailability::taken(
                "AlreadyExists",
                format!("Specified server name '{}' is already used", name),
            ))
        } else {
            Ok(NameAvailability::available())
        }
    }

    async fn create_server(&self, group: &str, server: &str, spec: &ServerSpec) -> Result<Server> {
        let mut state = self.begin(Operation::CreateServer)?;
        if state.taken_names.contains(server) {
            return Err(ArmError::Conflict {
                message: format!("Server name '{}' is already in use", server),
            }
            .into());
        }

        let group_state = state.group_mut(group)?;
        let created = Server {
            name: server.to_string(),
            region: spec.region.clone(),
            id: Some(format!(
                "/resourceGroups/{}/providers/Microsoft.DBforMySQL/flexibleServers/{}",
                group, server
            )),
            sku: Some(spec.sku.clone()),
            administrator_login: Some(spec.administrator_login.clone()),
            version: Some(spec.version.clone()),
            storage_mb: Some(spec.storage_mb),
            state: Some("Ready".to_string()),
            fully_qualified_domain_name: Some(format!("{}.mysql.database.azure.com", server)),
        };
        group_state.servers.insert(
            server.to_string(),
            ServerState {
                server: created.clone(),
                firewall_rules: BTreeMap::new(),
                configurations: default_configurations(),
            },
        );
        Ok(created)
    }

    async fn update_server(
        &self,
        group: &str,
        server: &str,
        update: &ServerUpdate,
    ) -> Result<Server> {
        let mut state = self.begin(Operation::UpdateServer)?;
        let entry = state.server_mut(group, server)?;

        if let Some(storage_mb) = update.storage_mb {
            if entry.server.storage_mb.is_some_and(|current| storage_mb < current) {
                return Err(ArmError::Api {
                    status: 400,
                    code: "InvalidStorageSize".to_string(),
                    message: "Storage size cannot be decreased".to_string(),
                }
                .into());
            }
            entry.server.storage_mb = Some(storage_mb);
        }
        Ok(entry.server.clone())
    }

    async fn delete_server(&self, group: &str, server: &str) -> Result<()> {
        let mut state = self.begin(Operation::DeleteServer)?;
        state
            .group_mut(group)?
            .servers
            .remove(server)
            .ok_or_else(|| not_found(format_args!("Server '{}'", server)))?;
        Ok(())
    }

    async fn create_or_update_firewall_rule(
        &self,
        group: &str,
        server: &str,
        rule: &str,
        start_ip: &str,
        end_ip: &str,
    ) -> Result<FirewallRule> {
        let mut state = self.begin(Operation::CreateOrUpdateFirewallRule)?;
        let entry = state.server_mut(group, server)?;
        let firewall_rule = FirewallRule {
            name: rule.to_string(),
            start_ip_address: start_ip.to_string(),
            end_ip_address: end_ip.to_string(),
        };
        entry
            .firewall_rules
            .insert(rule.to_string(), firewall_rule.clone());
        Ok(firewall_rule)
    }

    async fn list_firewall_rules(&self, group: &str, server: &str) -> Result<Vec<FirewallRule>> {
        let mut state = self.begin(Operation::ListFirewallRules)?;
        let entry = state.server_mut(group, server)?;
        Ok(entry.firewall_rules.values().cloned().collect())
    }

    async fn delete_firewall_rule(&self, group: &str, server: &str, rule: &str) -> Result<()> {
        let mut state = self.begin(Operation::DeleteFirewallRule)?;
        state
            .server_mut(group, server)?
            .firewall_rules
            .remove(rule)
            .ok_or_else(|| not_found(format_args!("Firewall rule '{}'", rule)))?;
        Ok(())
    }

    async fn get_configuration(
        &self,
        group: &str,
        server: &str,
        key: &str,
    ) -> Result<Configuration> {
        let mut state = self.begin(Operation::GetConfiguration)?;
        let entry = state.server_mut(group, server)?;
        let config = entry
            .configurations
            .get(key)
            .ok_or_else(|| not_found(format_args!("Configuration '{}'", key)))?;
        Ok(config.clone())
    }

    async fn update_configuration(
        &self,
        group: &str,
        server: &str,
        key: &str,
        value: &str,
        source: &str,
    ) -> Result<Configuration> {
        let mut state = self.begin(Operation::UpdateConfiguration)?;
        let entry = state.server_mut(group, server)?;
        let config = entry
            .configurations
            .get_mut(key)
            .ok_or_else(|| not_found(format_args!("Configuration '{}'", key)))?;
        config.value = Some(value.to_string());
        config.source = Some(source.to_string());
        Ok(config.clone())
    }
}
