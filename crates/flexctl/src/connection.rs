//! Connection management for the Azure Resource Manager client

use crate::error::{FlexCtlError, Result as CliResult};
use anyhow::Context;
use flexctl_core::arm::ArmClient;
use flexctl_core::config::{
    Config, ConfigError, DEFAULT_AUTHORITY_HOST, DEFAULT_MANAGEMENT_ENDPOINT, ENV_AUTHORITY_HOST,
    ENV_MANAGEMENT_ENDPOINT,
};
use flexctl_core::{PollingConfig, ProgressCallback, ServicePrincipal};
use tracing::{debug, info, trace};

/// User agent string for flexctl HTTP requests
const FLEXCTL_USER_AGENT: &str = concat!("flexctl/", env!("CARGO_PKG_VERSION"));

/// Everything needed to build a client, after env/profile resolution
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    pub principal: ServicePrincipal,
    pub authority_host: String,
    pub management_endpoint: String,
    /// Default region of the profile, if any
    pub region: Option<String>,
    pub polling: PollingConfig,
}

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<std::path::PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save an updated configuration to the location it was loaded from
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Work out which credentials and endpoints to use
    ///
    /// When --config-file is given, environment variables are ignored.
    /// Otherwise a complete set of `AZURE_*` variables wins outright, and a
    /// partial set overrides individual profile fields.
    pub fn resolve_connection(&self, profile_name: Option<&str>) -> CliResult<ResolvedConnection> {
        trace!("Profile name: {:?}", profile_name);

        let use_env_vars = self.config_path.is_none();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );

        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let env = |var: &str| {
            if use_env_vars {
                std::env::var(var).ok()
            } else {
                None
            }
        };
        let env_authority = env(ENV_AUTHORITY_HOST);
        let env_management = env(ENV_MANAGEMENT_ENDPOINT);

        if use_env_vars && ServicePrincipal::env_is_complete() {
            info!("Using service principal credentials from environment variables");
            let principal = ServicePrincipal::from_env()?;
            return Ok(ResolvedConnection {
                principal,
                authority_host: env_authority.unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string()),
                management_endpoint: env_management
                    .unwrap_or_else(|| DEFAULT_MANAGEMENT_ENDPOINT.to_string()),
                region: None,
                polling: PollingConfig::default(),
            });
        }

        let resolved_profile_name = match self.config.resolve_profile(profile_name) {
            Ok(name) => name,
            Err(ConfigError::NoProfiles { .. }) => return Err(FlexCtlError::NoProfileConfigured),
            Err(e) => return Err(e.into()),
        };
        info!("Using profile: {}", resolved_profile_name);

        let profile = self.config.profile(&resolved_profile_name)?;
        let principal = profile.resolve_principal(use_env_vars)?;

        if env_authority.is_some() || env_management.is_some() {
            debug!("Applied endpoint overrides from environment variables");
        }

        Ok(ResolvedConnection {
            principal,
            authority_host: env_authority.unwrap_or_else(|| profile.authority_host.clone()),
            management_endpoint: env_management
                .unwrap_or_else(|| profile.management_endpoint.clone()),
            region: profile.region.clone(),
            polling: profile.polling(),
        })
    }

    /// Build an ARM client for a resolved connection
    pub fn create_client(
        &self,
        connection: &ResolvedConnection,
        progress: Option<ProgressCallback>,
    ) -> CliResult<ArmClient> {
        info!(
            "Connecting to Azure Resource Manager: {} (subscription {})",
            connection.management_endpoint, connection.principal.subscription_id
        );

        let mut builder = ArmClient::builder(&connection.principal)
            .authority_host(&connection.authority_host)
            .management_endpoint(&connection.management_endpoint)
            .polling(connection.polling)
            .user_agent(FLEXCTL_USER_AGENT);
        if let Some(callback) = progress {
            builder = builder.on_progress(callback);
        }

        let client = builder.build()?;
        debug!("ARM client created successfully");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexctl_core::Profile;
    use std::path::PathBuf;

    fn manager_with(profiles: &[(&str, Profile)]) -> ConnectionManager {
        let mut config = Config::default();
        for (name, profile) in profiles {
            config.set_profile(name.to_string(), profile.clone());
        }
        // An explicit path keeps the environment out of these tests
        ConnectionManager::with_config_path(config, Some(PathBuf::from("/tmp/flexctl-test.toml")))
    }

    #[test]
    fn resolves_named_profile() {
        let mut profile = Profile::new("tenant-1", "client-1", "secret-1", "sub-1");
        profile.region = Some("westeurope".to_string());
        let manager = manager_with(&[("dev", profile)]);

        let connection = manager.resolve_connection(Some("dev")).unwrap();
        assert_eq!(connection.principal.subscription_id, "sub-1");
        assert_eq!(connection.region.as_deref(), Some("westeurope"));
        assert_eq!(connection.management_endpoint, DEFAULT_MANAGEMENT_ENDPOINT);
        assert_eq!(connection.polling, PollingConfig::default());
    }

    #[test]
    fn missing_profile_is_reported() {
        let manager = manager_with(&[]);
        assert!(matches!(
            manager.resolve_connection(Some("nope")),
            Err(FlexCtlError::ProfileNotFound { .. })
        ));
        assert!(matches!(
            manager.resolve_connection(None),
            Err(FlexCtlError::NoProfileConfigured)
        ));
    }

    #[test]
    fn client_is_built_from_connection() {
        let manager = manager_with(&[(
            "dev",
            Profile::new("tenant-1", "client-1", "secret-1", "sub-1"),
        )]);
        let connection = manager.resolve_connection(None).unwrap();

        let client = manager.create_client(&connection, None).unwrap();
        assert_eq!(client.subscription_id(), "sub-1");
    }
}
