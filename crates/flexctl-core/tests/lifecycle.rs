use std::sync::Mutex;

use flexctl_core::{CoreError, ResourceClient};
use flexctl_core::lifecycle::{
    CleanupOutcome, LifecycleHooks, LifecyclePlan, NoopHooks, Step, StepOutcome, run_lifecycle,
};
use flexctl_core::model::FirewallRule;
use flexctl_core::testing::{InMemoryResourceClient, Operation};
use pretty_assertions::assert_eq;

fn plan() -> LifecyclePlan {
    LifecyclePlan::with_password("Sample-Passw0rd")
}

/// The client operation behind each step from 3 onwards
fn failing_operation(step: Step) -> (Operation, usize) {
    match step {
        Step::CheckNameAvailability => (Operation::CheckNameAvailability, 1),
        Step::CreateServer => (Operation::CreateServer, 1),
        Step::UpdateServer => (Operation::UpdateServer, 1),
        Step::CreateFirewallRule => (Operation::CreateOrUpdateFirewallRule, 1),
        Step::UpdateFirewallRule => (Operation::CreateOrUpdateFirewallRule, 2),
        Step::ListFirewallRules => (Operation::ListFirewallRules, 1),
        Step::DeleteFirewallRule => (Operation::DeleteFirewallRule, 1),
        Step::GetConfiguration => (Operation::GetConfiguration, 1),
        Step::UpdateConfiguration => (Operation::UpdateConfiguration, 1),
        Step::DeleteServer => (Operation::DeleteServer, 1),
        other => panic!("no injectable operation for {other:?}"),
    }
}

#[derive(Default)]
struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

impl RecordingHooks {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl LifecycleHooks for RecordingHooks {
    fn on_step_start(&self, step: Step) {
        self.events.lock().unwrap().push(format!("start {}", step.number()));
    }

    fn on_step_complete(&self, _step: Step, outcome: &StepOutcome) {
        self.events.lock().unwrap().push(outcome.summary());
    }

    fn on_step_failed(&self, step: Step, _error: &CoreError) {
        self.events.lock().unwrap().push(format!("failed {}", step.number()));
    }

    fn on_cleanup(&self, _resource_group: &str, outcome: &CleanupOutcome) {
        self.events
            .lock()
            .unwrap()
            .push(format!("cleanup deleted={}", outcome.is_deleted()));
    }
}

#[tokio::test]
async fn successful_run_leaves_nothing_behind() {
    let client = InMemoryResourceClient::new();

    let report = run_lifecycle(&client, &plan(), &NoopHooks).await.unwrap();

    assert!(client.resource_groups().is_empty());
    assert_eq!(report.completed_steps, Step::ALL.to_vec());
    assert_eq!(report.region, "northeurope");
    assert_eq!(report.resource_group.len(), 20);
    assert!(report.resource_group.starts_with("rgMySql"));
    assert_eq!(report.server.len(), 20);
    assert!(report.server.starts_with("netserver"));
    assert!(report.finished_at >= report.started_at);
    assert_eq!(client.call_count(Operation::DeleteResourceGroup), 1);
}

#[tokio::test]
async fn calls_follow_the_fixed_order() {
    let client = InMemoryResourceClient::new();
    run_lifecycle(&client, &plan(), &NoopHooks).await.unwrap();

    assert_eq!(
        client.calls(),
        vec![
            Operation::CreateResourceGroup,
            Operation::CheckNameAvailability,
            Operation::CreateServer,
            Operation::UpdateServer,
            Operation::CreateOrUpdateFirewallRule,
            Operation::CreateOrUpdateFirewallRule,
            Operation::ListFirewallRules,
            Operation::DeleteFirewallRule,
            Operation::GetConfiguration,
            Operation::UpdateConfiguration,
            Operation::DeleteServer,
            Operation::DeleteResourceGroup,
        ]
    );
}

#[tokio::test]
async fn any_failing_step_deletes_the_group_exactly_once() {
    for number in 3..=12 {
        let step = Step::from_number(number).unwrap();
        let (operation, nth) = failing_operation(step);

        let client = InMemoryResourceClient::new();
        client.fail_on_call(operation, nth);

        let err = run_lifecycle(&client, &plan(), &NoopHooks)
            .await
            .expect_err("run should fail");

        assert_eq!(err.step(), Some(step), "step {number}");
        assert_eq!(
            client.call_count(Operation::DeleteResourceGroup),
            1,
            "step {number}"
        );
        assert!(err.cleanup().unwrap().is_deleted(), "step {number}");
        assert!(client.resource_groups().is_empty(), "step {number}");
        let calls = client.calls();
        let failed_at = calls.iter().rposition(|op| *op == operation).unwrap();
        assert_eq!(
            &calls[failed_at + 1..],
            &[Operation::DeleteResourceGroup],
            "no step after {number} should run"
        );
    }
}

#[tokio::test]
async fn unavailable_name_prevents_server_creation() {
    let client = InMemoryResourceClient::new();
    let plan = plan().with_names("rgMySqlpinned", "netservertaken");
    client.mark_name_taken("netservertaken");

    let err = run_lifecycle(&client, &plan, &NoopHooks).await.unwrap_err();

    assert_eq!(err.step(), Some(Step::CheckNameAvailability));
    assert!(err.cause().is_name_unavailable());
    assert_eq!(client.call_count(Operation::CreateServer), 0);
    assert_eq!(client.call_count(Operation::DeleteResourceGroup), 1);
}

#[tokio::test]
async fn storage_only_grows() {
    let client = InMemoryResourceClient::new();
    let report = run_lifecycle(&client, &plan(), &NoopHooks).await.unwrap();

    assert_eq!(report.initial_storage_mb, Some(524288));
    assert_eq!(report.final_storage_mb, Some(1048576));
}

#[tokio::test]
async fn shrinking_plan_is_rejected_before_any_call() {
    let client = InMemoryResourceClient::new();
    let mut plan = plan();
    plan.storage_mb = 1048576;
    plan.updated_storage_mb = 524288;

    let err = run_lifecycle(&client, &plan, &NoopHooks).await.unwrap_err();

    assert_eq!(err.step(), None);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn updating_a_rule_replaces_it() {
    let client = InMemoryResourceClient::new();
    let report = run_lifecycle(&client, &plan(), &NoopHooks).await.unwrap();

    assert_eq!(
        report.firewall_rules,
        vec![FirewallRule {
            name: "FirewallRule".to_string(),
            start_ip_address: "10.0.0.255".to_string(),
            end_ip_address: "10.0.0.255".to_string(),
        }]
    );
}

#[tokio::test]
async fn configuration_is_overridden() {
    let client = InMemoryResourceClient::new();
    let report = run_lifecycle(&client, &plan(), &NoopHooks).await.unwrap();

    let before = report.configuration_before.unwrap();
    let after = report.configuration_after.unwrap();
    assert_eq!(before.name, "innodb_lru_scan_depth");
    assert_eq!(before.source.as_deref(), Some("system-default"));
    assert_eq!(after.value.as_deref(), Some("512"));
    assert_eq!(after.source.as_deref(), Some("user-override"));
}

#[tokio::test]
async fn refetching_configuration_returns_the_override() {
    let client = InMemoryResourceClient::new();
    client
        .create_resource_group("rgMySql01", "northeurope")
        .await
        .unwrap();
    client
        .create_server("rgMySql01", "netserver01", &plan().server_spec())
        .await
        .unwrap();

    client
        .update_configuration(
            "rgMySql01",
            "netserver01",
            "innodb_lru_scan_depth",
            "512",
            "user-override",
        )
        .await
        .unwrap();
    let refetched = client
        .get_configuration("rgMySql01", "netserver01", "innodb_lru_scan_depth")
        .await
        .unwrap();

    assert_eq!(refetched.value.as_deref(), Some("512"));
    assert_eq!(refetched.source.as_deref(), Some("user-override"));
}

#[tokio::test]
async fn failed_cleanup_is_reported_alongside_the_cause() {
    let client = InMemoryResourceClient::new();
    client.fail_on(Operation::DeleteServer);
    client.fail_on(Operation::DeleteResourceGroup);

    let err = run_lifecycle(&client, &plan(), &NoopHooks).await.unwrap_err();

    assert_eq!(err.step(), Some(Step::DeleteServer));
    assert!(err.cause().to_string().contains("DeleteServer"));
    assert!(matches!(err.cleanup(), Some(CleanupOutcome::Failed(_))));
    let leftover = err.leftover_resource_group().unwrap();
    assert_eq!(client.resource_groups(), vec![leftover.to_string()]);
}

#[tokio::test]
async fn hooks_see_every_step() {
    let client = InMemoryResourceClient::new();
    let hooks = RecordingHooks::default();
    let plan = plan().with_names("rgMySqlhooks", "netserverhooks");

    run_lifecycle(&client, &plan, &hooks).await.unwrap();

    let events = hooks.events();
    assert_eq!(events.len(), Step::COUNT * 2);
    assert_eq!(events[0], "start 1");
    assert!(events.contains(&"Resource group with name rgMySqlhooks is created.".to_string()));
    assert!(events.contains(&"List firewall rules:\n10.0.0.255 10.0.0.255".to_string()));
    assert!(
        events.contains(&"Updated configuration innodb_lru_scan_depth new value 512".to_string())
    );
    assert_eq!(
        events.last().unwrap(),
        "Resource group with name rgMySqlhooks is deleted"
    );
}

#[tokio::test]
async fn hooks_see_failure_then_cleanup() {
    let client = InMemoryResourceClient::new();
    client.fail_on(Operation::CreateServer);
    let hooks = RecordingHooks::default();

    run_lifecycle(&client, &plan(), &hooks).await.unwrap_err();

    let events = hooks.events();
    let tail: Vec<&str> = events.iter().rev().take(2).rev().map(String::as_str).collect();
    assert_eq!(tail, vec!["failed 4", "cleanup deleted=true"]);
}
