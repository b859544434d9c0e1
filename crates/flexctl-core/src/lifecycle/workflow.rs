//! The provision/configure/teardown sequence and its compensating cleanup

use super::hooks::LifecycleHooks;
use super::plan::LifecyclePlan;
use crate::client::ResourceClient;
use crate::error::{CoreError, Result};
use crate::model::{
    Configuration, FLEXIBLE_SERVER_TYPE, FirewallRule, ResourceGroup, Server, ServerUpdate,
};
use crate::names::random_resource_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// One step of the workflow, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    GenerateNames,
    CreateResourceGroup,
    CheckNameAvailability,
    CreateServer,
    UpdateServer,
    CreateFirewallRule,
    UpdateFirewallRule,
    ListFirewallRules,
    DeleteFirewallRule,
    GetConfiguration,
    UpdateConfiguration,
    DeleteServer,
    DeleteResourceGroup,
}

impl Step {
    pub const ALL: [Step; 13] = [
        Step::GenerateNames,
        Step::CreateResourceGroup,
        Step::CheckNameAvailability,
        Step::CreateServer,
        Step::UpdateServer,
        Step::CreateFirewallRule,
        Step::UpdateFirewallRule,
        Step::ListFirewallRules,
        Step::DeleteFirewallRule,
        Step::GetConfiguration,
        Step::UpdateConfiguration,
        Step::DeleteServer,
        Step::DeleteResourceGroup,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// 1-based position in the sequence
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn from_number(number: usize) -> Option<Step> {
        number.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Step::GenerateNames => "generate resource names",
            Step::CreateResourceGroup => "create resource group",
            Step::CheckNameAvailability => "check server name availability",
            Step::CreateServer => "create server",
            Step::UpdateServer => "update server storage",
            Step::CreateFirewallRule => "create firewall rule",
            Step::UpdateFirewallRule => "update firewall rule",
            Step::ListFirewallRules => "list firewall rules",
            Step::DeleteFirewallRule => "delete firewall rule",
            Step::GetConfiguration => "get configuration",
            Step::UpdateConfiguration => "update configuration",
            Step::DeleteServer => "delete server",
            Step::DeleteResourceGroup => "delete resource group",
        };
        f.write_str(text)
    }
}

/// What a successful step produced
#[derive(Debug, Clone)]
pub enum StepOutcome {
    NamesGenerated {
        resource_group: String,
        server: String,
    },
    ResourceGroupCreated(ResourceGroup),
    NameAvailable { name: String },
    ServerCreated(Server),
    ServerUpdated(Server),
    FirewallRuleCreated(FirewallRule),
    FirewallRuleUpdated(FirewallRule),
    FirewallRulesListed(Vec<FirewallRule>),
    FirewallRuleDeleted { name: String },
    ConfigurationFetched(Configuration),
    ConfigurationUpdated(Configuration),
    ServerDeleted { name: String },
    ResourceGroupDeleted { name: String },
}

impl StepOutcome {
    /// One human-readable progress line
    pub fn summary(&self) -> String {
        match self {
            StepOutcome::NamesGenerated {
                resource_group,
                server,
            } => format!(
                "Using resource group name {} and server name {}",
                resource_group, server
            ),
            StepOutcome::ResourceGroupCreated(group) => {
                format!("Resource group with name {} is created.", group.name)
            }
            StepOutcome::NameAvailable { name } => format!("Server name {} is available", name),
            StepOutcome::ServerCreated(server) => {
                format!("Server with name {} is created", server.name)
            }
            StepOutcome::ServerUpdated(server) => match server.storage_mb {
                Some(mb) => format!("Server's storageMB has been updated to {}", mb),
                None => "Server's storageMB has been updated".to_string(),
            },
            StepOutcome::FirewallRuleCreated(rule) => format!(
                "Created a firewall rule {} ({} - {})",
                rule.name, rule.start_ip_address, rule.end_ip_address
            ),
            StepOutcome::FirewallRuleUpdated(rule) => format!(
                "Updated a firewall rule {} ({} - {})",
                rule.name, rule.start_ip_address, rule.end_ip_address
            ),
            StepOutcome::FirewallRulesListed(rules) => {
                let mut text = "List firewall rules:".to_string();
                for rule in rules {
                    text.push_str(&format!(
                        "\n{} {}",
                        rule.start_ip_address, rule.end_ip_address
                    ));
                }
                text
            }
            StepOutcome::FirewallRuleDeleted { name } => {
                format!("Deleted the firewall rule {}", name)
            }
            StepOutcome::ConfigurationFetched(config) => format!(
                "Got configuration {} with value {}",
                config.name,
                config.value_str()
            ),
            StepOutcome::ConfigurationUpdated(config) => format!(
                "Updated configuration {} new value {}",
                config.name,
                config.value_str()
            ),
            StepOutcome::ServerDeleted { .. } => "Server is deleted".to_string(),
            StepOutcome::ResourceGroupDeleted { name } => {
                format!("Resource group with name {} is deleted", name)
            }
        }
    }
}

/// Result of the compensating resource group delete
#[derive(Debug)]
pub enum CleanupOutcome {
    Deleted,
    Failed(CoreError),
}

impl CleanupOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, CleanupOutcome::Deleted)
    }
}

/// Why a lifecycle run did not finish
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Rejected before any remote call
    #[error("Invalid lifecycle plan: {0}")]
    InvalidPlan(#[source] CoreError),

    /// A step failed; `cleanup` says whether the resource group is gone
    #[error("Step {} ({step}) failed: {source}", .step.number())]
    StepFailed {
        step: Step,
        resource_group: String,
        source: CoreError,
        cleanup: CleanupOutcome,
    },
}

impl LifecycleError {
    /// The failed step, if any step ran
    pub fn step(&self) -> Option<Step> {
        match self {
            LifecycleError::InvalidPlan(_) => None,
            LifecycleError::StepFailed { step, .. } => Some(*step),
        }
    }

    /// The error that stopped the run
    pub fn cause(&self) -> &CoreError {
        match self {
            LifecycleError::InvalidPlan(e) => e,
            LifecycleError::StepFailed { source, .. } => source,
        }
    }

    pub fn cleanup(&self) -> Option<&CleanupOutcome> {
        match self {
            LifecycleError::InvalidPlan(_) => None,
            LifecycleError::StepFailed { cleanup, .. } => Some(cleanup),
        }
    }

    /// Resource group that may have been left behind
    pub fn leftover_resource_group(&self) -> Option<&str> {
        match self {
            LifecycleError::StepFailed {
                resource_group,
                cleanup: CleanupOutcome::Failed(_),
                ..
            } => Some(resource_group),
            _ => None,
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleReport {
    pub resource_group: String,
    pub server: String,
    pub region: String,
    pub initial_storage_mb: Option<u64>,
    pub final_storage_mb: Option<u64>,
    pub firewall_rules: Vec<FirewallRule>,
    pub configuration_before: Option<Configuration>,
    pub configuration_after: Option<Configuration>,
    pub completed_steps: Vec<Step>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Run every step in order against `client`
///
/// The first failing step stops the run and triggers exactly one delete of
/// the resource group. A failed cleanup is reported in the returned error,
/// never in place of the original cause.
pub async fn run_lifecycle<C, H>(
    client: &C,
    plan: &LifecyclePlan,
    hooks: &H,
) -> std::result::Result<LifecycleReport, LifecycleError>
where
    C: ResourceClient + ?Sized,
    H: LifecycleHooks + ?Sized,
{
    plan.validate().map_err(LifecycleError::InvalidPlan)?;

    let mut run = Run::new(client, plan);

    for step in Step::ALL {
        hooks.on_step_start(step);
        match run.execute(step).await {
            Ok(outcome) => {
                run.completed.push(step);
                hooks.on_step_complete(step, &outcome);
            }
            Err(source) => {
                hooks.on_step_failed(step, &source);
                let cleanup = run.cleanup().await;
                hooks.on_cleanup(&run.resource_group, &cleanup);
                return Err(LifecycleError::StepFailed {
                    step,
                    resource_group: run.resource_group,
                    source,
                    cleanup,
                });
            }
        }
    }

    Ok(run.into_report())
}

/// State carried between steps of a single run
struct Run<'a, C: ?Sized> {
    client: &'a C,
    plan: &'a LifecyclePlan,
    resource_group: String,
    server: String,
    initial_storage_mb: Option<u64>,
    final_storage_mb: Option<u64>,
    firewall_rules: Vec<FirewallRule>,
    configuration_before: Option<Configuration>,
    configuration_after: Option<Configuration>,
    completed: Vec<Step>,
    started_at: DateTime<Utc>,
}

impl<'a, C: ResourceClient + ?Sized> Run<'a, C> {
    fn new(client: &'a C, plan: &'a LifecyclePlan) -> Self {
        Self {
            client,
            plan,
            resource_group: String::new(),
            server: String::new(),
            initial_storage_mb: None,
            final_storage_mb: None,
            firewall_rules: Vec::new(),
            configuration_before: None,
            configuration_after: None,
            completed: Vec::with_capacity(Step::COUNT),
            started_at: Utc::now(),
        }
    }

    async fn execute(&mut self, step: Step) -> Result<StepOutcome> {
        let plan = self.plan;
        let group = self.resource_group.clone();
        let server = self.server.clone();

        let outcome = match step {
            Step::GenerateNames => {
                self.resource_group = plan.resource_group_name.clone().unwrap_or_else(|| {
                    random_resource_name(&plan.resource_group_prefix, plan.name_length)
                });
                self.server = plan.server_name.clone().unwrap_or_else(|| {
                    random_resource_name(&plan.server_prefix, plan.name_length)
                });
                StepOutcome::NamesGenerated {
                    resource_group: self.resource_group.clone(),
                    server: self.server.clone(),
                }
            }
            Step::CreateResourceGroup => StepOutcome::ResourceGroupCreated(
                self.client
                    .create_resource_group(&group, &plan.region)
                    .await?,
            ),
            Step::CheckNameAvailability => {
                let availability = self
                    .client
                    .check_name_availability(&server, FLEXIBLE_SERVER_TYPE)
                    .await?;
                if !availability.is_available() {
                    let message = availability
                        .message
                        .or(availability.reason)
                        .unwrap_or_else(|| "name is already in use".to_string());
                    return Err(CoreError::NameUnavailable {
                        name: server,
                        message,
                    });
                }
                StepOutcome::NameAvailable { name: server }
            }
            Step::CreateServer => {
                let created = self
                    .client
                    .create_server(&group, &server, &plan.server_spec())
                    .await?;
                self.initial_storage_mb = created.storage_mb.or(Some(plan.storage_mb));
                StepOutcome::ServerCreated(created)
            }
            Step::UpdateServer => {
                let update = ServerUpdate::new().with_storage_mb(plan.updated_storage_mb);
                let updated = self.client.update_server(&group, &server, &update).await?;
                self.final_storage_mb = updated.storage_mb.or(Some(plan.updated_storage_mb));
                StepOutcome::ServerUpdated(updated)
            }
            Step::CreateFirewallRule => StepOutcome::FirewallRuleCreated(
                self.client
                    .create_or_update_firewall_rule(
                        &group,
                        &server,
                        &plan.firewall_rule,
                        &plan.firewall_range.start,
                        &plan.firewall_range.end,
                    )
                    .await?,
            ),
            Step::UpdateFirewallRule => StepOutcome::FirewallRuleUpdated(
                self.client
                    .create_or_update_firewall_rule(
                        &group,
                        &server,
                        &plan.firewall_rule,
                        &plan.updated_firewall_range.start,
                        &plan.updated_firewall_range.end,
                    )
                    .await?,
            ),
            Step::ListFirewallRules => {
                self.firewall_rules = self.client.list_firewall_rules(&group, &server).await?;
                StepOutcome::FirewallRulesListed(self.firewall_rules.clone())
            }
            Step::DeleteFirewallRule => {
                self.client
                    .delete_firewall_rule(&group, &server, &plan.firewall_rule)
                    .await?;
                StepOutcome::FirewallRuleDeleted {
                    name: plan.firewall_rule.clone(),
                }
            }
            Step::GetConfiguration => {
                let config = self
                    .client
                    .get_configuration(&group, &server, &plan.configuration.name)
                    .await?;
                self.configuration_before = Some(config.clone());
                StepOutcome::ConfigurationFetched(config)
            }
            Step::UpdateConfiguration => {
                let change = &plan.configuration;
                let config = self
                    .client
                    .update_configuration(
                        &group,
                        &server,
                        &change.name,
                        &change.value,
                        &change.source,
                    )
                    .await?;
                self.configuration_after = Some(config.clone());
                StepOutcome::ConfigurationUpdated(config)
            }
            Step::DeleteServer => {
                self.client.delete_server(&group, &server).await?;
                StepOutcome::ServerDeleted { name: server }
            }
            Step::DeleteResourceGroup => {
                self.client.delete_resource_group(&group).await?;
                StepOutcome::ResourceGroupDeleted { name: group }
            }
        };

        debug!("Step {} completed", step.number());
        Ok(outcome)
    }

    async fn cleanup(&self) -> CleanupOutcome {
        debug!("Deleting resource group {} after failure", self.resource_group);
        match self.client.delete_resource_group(&self.resource_group).await {
            Ok(()) => CleanupOutcome::Deleted,
            Err(e) => {
                warn!(
                    "Failed to delete resource group {} during cleanup: {}",
                    self.resource_group, e
                );
                CleanupOutcome::Failed(e)
            }
        }
    }

    fn into_report(self) -> LifecycleReport {
        LifecycleReport {
            resource_group: self.resource_group,
            server: self.server,
            region: self.plan.region.clone(),
            initial_storage_mb: self.initial_storage_mb,
            final_storage_mb: self.final_storage_mb,
            firewall_rules: self.firewall_rules,
            configuration_before: self.configuration_before,
            configuration_after: self.configuration_after,
            completed_steps: self.completed,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::ArmError;
    use crate::client::MockResourceClient;
    use crate::lifecycle::NoopHooks;
    use crate::model::NameAvailability;

    fn group(name: &str) -> ResourceGroup {
        ResourceGroup {
            name: name.to_string(),
            region: "northeurope".to_string(),
            id: None,
            provisioning_state: Some("Succeeded".to_string()),
        }
    }

    fn plan() -> LifecyclePlan {
        LifecyclePlan::with_password("Passw0rd!xyz").with_names("rgMySqltest", "netservertest")
    }

    #[test]
    fn test_step_numbering() {
        assert_eq!(Step::GenerateNames.number(), 1);
        assert_eq!(Step::DeleteResourceGroup.number(), 13);
        assert_eq!(Step::from_number(4), Some(Step::CreateServer));
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(14), None);
        for (i, step) in Step::ALL.iter().enumerate() {
            assert_eq!(step.number(), i + 1);
        }
    }

    #[tokio::test]
    async fn test_name_unavailable_skips_server_creation() {
        let mut client = MockResourceClient::new();
        client
            .expect_create_resource_group()
            .times(1)
            .returning(|name, _| Ok(group(name)));
        client
            .expect_check_name_availability()
            .times(1)
            .returning(|_, _| Ok(NameAvailability::taken("AlreadyExists", "taken")));
        client.expect_create_server().times(0);
        client
            .expect_delete_resource_group()
            .times(1)
            .returning(|_| Ok(()));

        let err = run_lifecycle(&client, &plan(), &NoopHooks)
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(Step::CheckNameAvailability));
        assert!(err.cause().is_name_unavailable());
        assert!(err.cleanup().is_some_and(CleanupOutcome::is_deleted));
        assert_eq!(err.leftover_resource_group(), None);
    }

    #[tokio::test]
    async fn test_cleanup_failure_keeps_original_error() {
        let mut client = MockResourceClient::new();
        client.expect_create_resource_group().times(1).returning(|_, _| {
            Err(ArmError::Conflict {
                message: "busy".to_string(),
            }
            .into())
        });
        client.expect_delete_resource_group().times(1).returning(|_| {
            Err(ArmError::Server {
                status: 503,
                message: "unavailable".to_string(),
            }
            .into())
        });

        let err = run_lifecycle(&client, &plan(), &NoopHooks)
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(Step::CreateResourceGroup));
        assert!(err.cause().is_conflict());
        assert!(matches!(err.cleanup(), Some(CleanupOutcome::Failed(_))));
        assert_eq!(err.leftover_resource_group(), Some("rgMySqltest"));
    }

    #[tokio::test]
    async fn test_invalid_plan_makes_no_calls() {
        let client = MockResourceClient::new();
        let mut plan = plan();
        plan.updated_storage_mb = 1024;

        let err = run_lifecycle(&client, &plan, &NoopHooks)
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::InvalidPlan(_)));
        assert!(err.cleanup().is_none());
    }

    #[test]
    fn test_list_summary_has_one_line_per_rule() {
        let outcome = StepOutcome::FirewallRulesListed(vec![FirewallRule {
            name: "FirewallRule".to_string(),
            start_ip_address: "10.0.0.255".to_string(),
            end_ip_address: "10.0.0.255".to_string(),
        }]);
        assert_eq!(outcome.summary(), "List firewall rules:\n10.0.0.255 10.0.0.255");
    }
}
