//! `flexctl run`: the full provision/configure/teardown lifecycle

use crate::cli::{OutputFormat, RunArgs};
use crate::connection::ConnectionManager;
use crate::console::{ConsoleHooks, spinner_callback};
use crate::error::{FlexCtlError, Result as CliResult};
use crate::output;
use flexctl_core::lifecycle::{IpRange, LifecyclePlan, LifecycleReport, Step, run_lifecycle};
use flexctl_core::testing::InMemoryResourceClient;
use tracing::{debug, info};

pub async fn handle_run(
    args: &RunArgs,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let hooks = ConsoleHooks::new(output_format.is_structured());

    let report = if args.dry_run {
        info!("Dry run: using the in-memory provider");
        let plan = build_plan(args, None)?;
        debug!("Plan: {:?}", plan);
        let client = InMemoryResourceClient::new();
        run_lifecycle(&client, &plan, &hooks).await?
    } else {
        let mut connection = conn_mgr.resolve_connection(profile_name)?;
        connection.polling = connection
            .polling
            .with_overrides(args.wait_timeout, args.wait_interval);

        let plan = build_plan(args, connection.region.as_deref())?;
        debug!("Plan: {:?}", plan);
        let client = conn_mgr.create_client(&connection, Some(spinner_callback()))?;
        run_lifecycle(&client, &plan, &hooks).await?
    };

    print_report(&report, output_format)
}

/// Defaults, then the profile's region, then explicit flags
fn build_plan(args: &RunArgs, profile_region: Option<&str>) -> CliResult<LifecyclePlan> {
    let mut plan = match &args.admin_password {
        Some(password) => LifecyclePlan::with_password(password.clone()),
        None => LifecyclePlan::generate(),
    };

    if let Some(region) = args.region.as_deref().or(profile_region) {
        plan.region = region.to_string();
    }
    if let Some(name) = &args.sku_name {
        plan.sku.name = name.clone();
    }
    if let Some(tier) = &args.sku_tier {
        plan.sku.tier = tier.clone();
    }
    if let Some(version) = &args.engine_version {
        plan.version = version.clone();
    }
    if let Some(storage_mb) = args.storage_mb {
        plan.storage_mb = storage_mb;
    }
    if let Some(storage_mb) = args.updated_storage_mb {
        plan.updated_storage_mb = storage_mb;
    }
    if let Some(login) = &args.admin_login {
        plan.administrator_login = login.clone();
    }
    if args.resource_group.is_some() {
        plan.resource_group_name = args.resource_group.clone();
    }
    if args.server_name.is_some() {
        plan.server_name = args.server_name.clone();
    }
    if let Some(rule) = &args.firewall_rule {
        plan.firewall_rule = rule.clone();
    }
    if let Some(range) = &args.firewall_range {
        plan.firewall_range = parse_range(range)?;
    }
    if let Some(range) = &args.updated_firewall_range {
        plan.updated_firewall_range = parse_range(range)?;
    }
    if let Some(name) = &args.configuration {
        plan.configuration.name = name.clone();
    }
    if let Some(value) = &args.configuration_value {
        plan.configuration.value = value.clone();
    }
    if let Some(source) = &args.configuration_source {
        plan.configuration.source = source.clone();
    }

    Ok(plan)
}

/// `START-END` or a single address
fn parse_range(text: &str) -> CliResult<IpRange> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FlexCtlError::InvalidInput {
            message: "firewall range must not be empty".to_string(),
        });
    }

    Ok(match text.split_once('-') {
        Some((start, end)) => IpRange::new(start.trim(), end.trim()),
        None => IpRange::single(text),
    })
}

fn print_report(report: &LifecycleReport, output_format: OutputFormat) -> CliResult<()> {
    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            output::print_output(report, output_format.into())?;
        }
        OutputFormat::Table => {
            let configuration = report
                .configuration_after
                .as_ref()
                .map(|c| format!("{}={}", c.name, c.value_str()));
            let summary = serde_json::json!({
                "resource_group": report.resource_group,
                "server": report.server,
                "region": report.region,
                "initial_storage_mb": report.initial_storage_mb,
                "final_storage_mb": report.final_storage_mb,
                "firewall_rules": report.firewall_rules.len(),
                "configuration": configuration,
                "steps": format!("{}/{}", report.completed_steps.len(), Step::COUNT),
                "duration_secs": (report.finished_at - report.started_at).num_seconds(),
            });
            output::print_output(&summary, output::OutputFormat::Table)?;
        }
        OutputFormat::Auto => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexctl_core::lifecycle::{DEFAULT_REGION, DEFAULT_STORAGE_MB};

    #[test]
    fn defaults_come_from_the_plan() {
        let plan = build_plan(&RunArgs::default(), None).unwrap();
        assert_eq!(plan.region, DEFAULT_REGION);
        assert_eq!(plan.storage_mb, DEFAULT_STORAGE_MB);
        assert!(plan.resource_group_name.is_none());
    }

    #[test]
    fn flags_beat_profile_region() {
        let args = RunArgs {
            region: Some("westeurope".to_string()),
            ..Default::default()
        };
        assert_eq!(build_plan(&args, Some("eastus")).unwrap().region, "westeurope");
        assert_eq!(
            build_plan(&RunArgs::default(), Some("eastus")).unwrap().region,
            "eastus"
        );
    }

    #[test]
    fn overrides_are_applied() {
        let args = RunArgs {
            admin_password: Some("Sample-Passw0rd".to_string()),
            server_name: Some("netserverpinned".to_string()),
            firewall_range: Some("10.1.0.1 - 10.1.0.9".to_string()),
            updated_firewall_range: Some("10.1.0.7".to_string()),
            configuration_value: Some("256".to_string()),
            ..Default::default()
        };

        let plan = build_plan(&args, None).unwrap();
        assert_eq!(plan.administrator_password, "Sample-Passw0rd");
        assert_eq!(plan.server_name.as_deref(), Some("netserverpinned"));
        assert_eq!(plan.firewall_range, IpRange::new("10.1.0.1", "10.1.0.9"));
        assert_eq!(plan.updated_firewall_range, IpRange::single("10.1.0.7"));
        assert_eq!(plan.configuration.value, "256");
    }

    #[test]
    fn empty_range_is_rejected() {
        assert!(matches!(
            parse_range("  "),
            Err(FlexCtlError::InvalidInput { .. })
        ));
    }
}
