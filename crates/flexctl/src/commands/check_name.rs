//! `flexctl check-name`

use crate::cli::OutputFormat;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output;
use colored::Colorize;
use flexctl_core::ResourceClient;
use flexctl_core::model::FLEXIBLE_SERVER_TYPE;
use tracing::debug;

pub async fn handle_check_name(
    name: &str,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let connection = conn_mgr.resolve_connection(profile_name)?;
    let client = conn_mgr.create_client(&connection, None)?;

    debug!("Checking availability of server name {}", name);
    let availability = client
        .check_name_availability(name, FLEXIBLE_SERVER_TYPE)
        .await?;

    match output_format {
        OutputFormat::Auto => {
            if availability.is_available() {
                println!("Server name {} is {}", name, "available".green());
            } else {
                let why = availability
                    .message
                    .as_deref()
                    .or(availability.reason.as_deref())
                    .unwrap_or("name is already in use");
                println!("Server name {} is {}: {}", name, "not available".red(), why);
            }
        }
        _ => {
            let data = serde_json::json!({
                "name": name,
                "available": availability.is_available(),
                "reason": availability.reason,
                "message": availability.message,
            });
            output::print_output(&data, output_format.into())?;
        }
    }
    Ok(())
}
