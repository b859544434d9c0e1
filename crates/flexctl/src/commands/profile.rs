//! Profile management command implementations

use crate::cli::{OutputFormat, ProfileCommands};
use crate::commands::confirm;
use crate::connection::ConnectionManager;
use crate::error::{FlexCtlError, Result as CliResult};
use crate::output;
use colored::Colorize;
use flexctl_core::config::{Config, CredentialStore, PollingConfig, Profile};
use tracing::{debug, trace};

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            tenant_id,
            client_id,
            client_secret,
            subscription_id,
            authority_host,
            management_endpoint,
            region,
            wait_timeout,
            wait_interval,
            default,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            let args = SetArgs {
                name,
                tenant_id,
                client_id,
                client_secret: client_secret.as_deref(),
                subscription_id,
                authority_host: authority_host.as_deref(),
                management_endpoint: management_endpoint.as_deref(),
                region: region.as_deref(),
                wait_timeout: *wait_timeout,
                wait_interval: *wait_interval,
                make_default: *default,
                #[cfg(feature = "secure-storage")]
                use_keyring: *use_keyring,
                #[cfg(not(feature = "secure-storage"))]
                use_keyring: false,
            };
            handle_set(conn_mgr, args)
        }
        Remove { name, yes } => handle_remove(conn_mgr, name, *yes),
        Default { name } => handle_default(conn_mgr, name),
    }
}

fn config_path_display(conn_mgr: &ConnectionManager) -> Option<String> {
    conn_mgr
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .or_else(|| Config::config_path().ok().map(|p| p.display().to_string()))
}

fn secret_kind(secret: &str) -> &'static str {
    if CredentialStore::is_keyring_reference(secret) {
        "keyring"
    } else {
        "config file"
    }
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());
    let default = conn_mgr.config.default_profile.as_deref();

    let rows: Vec<serde_json::Value> = profiles
        .iter()
        .map(|(name, profile)| {
            serde_json::json!({
                "name": name,
                "subscription_id": profile.subscription_id,
                "region": profile.region,
                "is_default": default == Some(name.as_str()),
            })
        })
        .collect();

    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let data = serde_json::json!({
                "config_path": config_path_display(conn_mgr),
                "profiles": rows,
            });
            output::print_output(&data, output_format.into())?;
        }
        OutputFormat::Table => {
            output::print_output(&rows, output::OutputFormat::Table)?;
        }
        OutputFormat::Auto => {
            if profiles.is_empty() {
                println!("No profiles configured.");
                println!("Use 'flexctl profile set' to create a profile.");
                return Ok(());
            }

            for (name, profile) in &profiles {
                let marker = if default == Some(name.as_str()) {
                    "*".green().bold().to_string()
                } else {
                    " ".to_string()
                };
                println!(
                    "{} {} (subscription {}{})",
                    marker,
                    name.bold(),
                    profile.subscription_id,
                    profile
                        .region
                        .as_deref()
                        .map(|r| format!(", region {}", r))
                        .unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let output_data = serde_json::json!({
                "config_path": config_path.to_str()
            });
            output::print_output(&output_data, output_format.into())?;
        }
        _ => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr.config.profile(name)?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    let polling = profile.polling();

    match output_format {
        OutputFormat::Json | OutputFormat::Yaml | OutputFormat::Table => {
            let data = serde_json::json!({
                "name": name,
                "is_default": is_default,
                "tenant_id": profile.tenant_id,
                "client_id": profile.client_id,
                "client_secret": secret_kind(&profile.client_secret),
                "subscription_id": profile.subscription_id,
                "authority_host": profile.authority_host,
                "management_endpoint": profile.management_endpoint,
                "region": profile.region,
                "wait_timeout_secs": polling.timeout_secs,
                "wait_interval_secs": polling.interval_secs,
            });
            output::print_output(&data, output_format.into())?;
        }
        OutputFormat::Auto => {
            println!("Profile: {}{}", name, if is_default { " (default)" } else { "" });
            println!("Tenant: {}", profile.tenant_id);
            println!("Client: {}", profile.client_id);
            println!("Client secret: stored in {}", secret_kind(&profile.client_secret));
            println!("Subscription: {}", profile.subscription_id);
            println!("Authority host: {}", profile.authority_host);
            println!("Management endpoint: {}", profile.management_endpoint);
            if let Some(region) = &profile.region {
                println!("Region: {}", region);
            }
            println!(
                "Polling: every {}s, give up after {}s",
                polling.interval_secs, polling.timeout_secs
            );
        }
    }
    Ok(())
}

struct SetArgs<'a> {
    name: &'a str,
    tenant_id: &'a str,
    client_id: &'a str,
    client_secret: Option<&'a str>,
    subscription_id: &'a str,
    authority_host: Option<&'a str>,
    management_endpoint: Option<&'a str>,
    region: Option<&'a str>,
    wait_timeout: Option<u64>,
    wait_interval: Option<u64>,
    make_default: bool,
    use_keyring: bool,
}

fn handle_set(conn_mgr: &ConnectionManager, args: SetArgs<'_>) -> CliResult<()> {
    debug!("Setting profile: {}", args.name);

    let existing = conn_mgr.config.profiles.get(args.name);
    if existing.is_some() {
        println!(
            "Profile '{}' already exists. Credentials will be updated (other settings preserved).",
            args.name
        );
        if !confirm("Continue?")? {
            println!("Profile update cancelled.");
            return Ok(());
        }
    }

    let secret = match args.client_secret {
        Some(secret) => secret.to_string(),
        None => rpassword::prompt_password("Client secret: ")?,
    };
    if secret.is_empty() {
        return Err(FlexCtlError::InvalidInput {
            message: "client secret must not be empty".to_string(),
        });
    }

    let store = if args.use_keyring {
        keyring_store()
    } else {
        CredentialStore::plaintext()
    };
    let stored_secret = store.store_secret(&format!("{}-client-secret", args.name), &secret)?;

    let mut profile = Profile::new(
        args.tenant_id,
        args.client_id,
        stored_secret,
        args.subscription_id,
    );
    if let Some(previous) = existing {
        profile.authority_host = previous.authority_host.clone();
        profile.management_endpoint = previous.management_endpoint.clone();
        profile.region = previous.region.clone();
        profile.polling = previous.polling;
    }
    if let Some(url) = args.authority_host {
        profile.authority_host = url.to_string();
    }
    if let Some(url) = args.management_endpoint {
        profile.management_endpoint = url.to_string();
    }
    if let Some(region) = args.region {
        profile.region = Some(region.to_string());
    }
    if args.wait_timeout.is_some() || args.wait_interval.is_some() {
        let polling = profile.polling.unwrap_or_else(PollingConfig::default);
        profile.polling = Some(polling.with_overrides(args.wait_timeout, args.wait_interval));
    }

    let mut config = conn_mgr.config.clone();
    config.set_profile(args.name.to_string(), profile);
    if args.make_default || config.profiles.len() == 1 {
        config.default_profile = Some(args.name.to_string());
    }
    conn_mgr.save_config(&config)?;

    println!("Profile '{}' saved successfully.", args.name);
    if config.default_profile.as_deref() == Some(args.name) {
        println!("'{}' is the default profile.", args.name);
    }
    Ok(())
}

#[cfg(feature = "secure-storage")]
fn keyring_store() -> CredentialStore {
    CredentialStore::keyring()
}

#[cfg(not(feature = "secure-storage"))]
fn keyring_store() -> CredentialStore {
    CredentialStore::plaintext()
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str, yes: bool) -> CliResult<()> {
    debug!("Removing profile: {}", name);

    let profile = conn_mgr.config.profile(name)?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    if is_default {
        println!("Warning: '{}' is the default profile.", name);
    }

    if !yes && !confirm(&format!("Are you sure you want to remove profile '{}'?", name))? {
        println!("Profile removal cancelled.");
        return Ok(());
    }

    CredentialStore::default().delete_secret(&profile.client_secret)?;

    let mut config = conn_mgr.config.clone();
    config.remove_profile(name);
    conn_mgr.save_config(&config)?;

    if is_default {
        println!("Default profile cleared.");
    }
    println!("Profile '{}' removed successfully.", name);
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Setting default profile: {}", name);
    conn_mgr.config.profile(name)?;

    let mut config = conn_mgr.config.clone();
    config.default_profile = Some(name.to_string());
    conn_mgr.save_config(&config)?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}
