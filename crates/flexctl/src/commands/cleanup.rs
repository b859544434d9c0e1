//! `flexctl cleanup`: delete a resource group a failed run left behind

use crate::cli::OutputFormat;
use crate::commands::confirm;
use crate::connection::ConnectionManager;
use crate::console::spinner_callback;
use crate::error::Result as CliResult;
use crate::output;
use flexctl_core::ResourceClient;
use tracing::info;

pub async fn handle_cleanup(
    resource_group: &str,
    yes: bool,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let connection = conn_mgr.resolve_connection(profile_name)?;

    if !yes
        && !confirm(&format!(
            "Delete resource group '{}' and everything in it?",
            resource_group
        ))?
    {
        println!("Cleanup cancelled.");
        return Ok(());
    }

    let client = conn_mgr.create_client(&connection, Some(spinner_callback()))?;
    info!("Deleting resource group {}", resource_group);
    client.delete_resource_group(resource_group).await?;

    match output_format {
        OutputFormat::Auto => {
            println!("Resource group with name {} is deleted", resource_group);
        }
        _ => {
            let data = serde_json::json!({
                "resource_group": resource_group,
                "deleted": true,
            });
            output::print_output(&data, output_format.into())?;
        }
    }
    Ok(())
}
