//! Profile configuration for flexctl
//!
//! Configuration is stored in TOML with any number of named profiles, each
//! holding a service principal plus optional endpoint, region and polling
//! settings.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::polling::PollingConfig;

pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_SECRET: &str = "AZURE_SECRET";
/// Accepted as a fallback for [`ENV_SECRET`]
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const ENV_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const ENV_AUTHORITY_HOST: &str = "AZURE_AUTHORITY_HOST";
pub const ENV_MANAGEMENT_ENDPOINT: &str = "AZURE_MANAGEMENT_ENDPOINT";

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default)]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// A named set of credentials and settings
#[derive(Serialize, Deserialize, Clone)]
pub struct Profile {
    pub tenant_id: String,
    pub client_id: String,
    /// Plaintext or `keyring:<key>`
    pub client_secret: String,
    pub subscription_id: String,
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,
    /// Region for new resource groups and servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling: Option<PollingConfig>,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("subscription_id", &self.subscription_id)
            .field("authority_host", &self.authority_host)
            .field("management_endpoint", &self.management_endpoint)
            .field("region", &self.region)
            .field("polling", &self.polling)
            .finish()
    }
}

/// Service principal identity for one subscription
///
/// Built once at startup and handed to the ARM client by reference.
#[derive(Clone, PartialEq, Eq)]
pub struct ServicePrincipal {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
}

impl std::fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if CredentialStore::is_keyring_reference(secret) {
        "[keyring]"
    } else {
        "[redacted]"
    }
}

impl ServicePrincipal {
    /// Read all four values from the `AZURE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            tenant_id: require_env(ENV_TENANT_ID, "tenant id")?,
            client_id: require_env(ENV_CLIENT_ID, "client id")?,
            client_secret: env_secret().ok_or(ConfigError::MissingCredential {
                field: "client secret",
                env_var: ENV_SECRET,
            })?,
            subscription_id: require_env(ENV_SUBSCRIPTION_ID, "subscription id")?,
        })
    }

    /// True when every value [`ServicePrincipal::from_env`] needs is set
    pub fn env_is_complete() -> bool {
        [ENV_TENANT_ID, ENV_CLIENT_ID, ENV_SUBSCRIPTION_ID]
            .iter()
            .all(|var| std::env::var(var).is_ok())
            && env_secret().is_some()
    }
}

fn require_env(var: &'static str, field: &'static str) -> Result<String> {
    std::env::var(var).map_err(|_| ConfigError::MissingCredential {
        field,
        env_var: var,
    })
}

fn env_secret() -> Option<String> {
    std::env::var(ENV_SECRET)
        .or_else(|_| std::env::var(ENV_CLIENT_SECRET))
        .ok()
}

impl Profile {
    /// Create a profile with default endpoints
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        subscription_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            subscription_id: subscription_id.into(),
            authority_host: default_authority_host(),
            management_endpoint: default_management_endpoint(),
            region: None,
            polling: None,
        }
    }

    /// Resolve the service principal, following keyring references
    ///
    /// With `use_env` set, each `AZURE_*` variable overrides its field.
    pub fn resolve_principal(&self, use_env: bool) -> Result<ServicePrincipal> {
        let store = CredentialStore::default();
        let env = |var: &'static str| if use_env { Some(var) } else { None };

        let resolve = |value: &str, var: &'static str, field: &str| {
            store.resolve(value, env(var)).map_err(|e| {
                ConfigError::CredentialError(format!("Failed to resolve {}: {}", field, e))
            })
        };

        let client_secret = match use_env.then(env_secret).flatten() {
            Some(secret) => secret,
            None => resolve(&self.client_secret, ENV_SECRET, "client secret")?,
        };

        Ok(ServicePrincipal {
            tenant_id: resolve(&self.tenant_id, ENV_TENANT_ID, "tenant id")?,
            client_id: resolve(&self.client_id, ENV_CLIENT_ID, "client id")?,
            client_secret,
            subscription_id: resolve(
                &self.subscription_id,
                ENV_SUBSCRIPTION_ID,
                "subscription id",
            )?,
        })
    }

    /// Effective polling settings
    pub fn polling(&self) -> PollingConfig {
        self.polling.unwrap_or_default()
    }
}

impl Config {
    /// Resolve which profile to use
    ///
    /// Resolution order: explicit name, `default_profile`, then the first
    /// profile alphabetically.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(name) = explicit_profile {
            if self.profiles.contains_key(name) {
                return Ok(name.to_string());
            }
            return Err(ConfigError::ProfileNotFound {
                name: name.to_string(),
            });
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        self.list_profiles()
            .first()
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Use 'flexctl profile set' to create a profile, or export \
                    AZURE_TENANT_ID, AZURE_CLIENT_ID, AZURE_SECRET and AZURE_SUBSCRIPTION_ID."
                    .to_string(),
            })
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// A missing file yields an empty configuration.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path, creating parent directories
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS `~/.config/flexctl/config.toml` is preferred when it exists;
    /// otherwise the platform config directory is used.
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("flexctl")
                    .join("config.toml");

                if linux_style_path
                    .parent()
                    .map(|p| p.exists())
                    .unwrap_or(false)
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "flexctl", "flexctl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left as-is so profiles that
    /// are never used do not fail to load.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok()).to_string()
    }
}

fn default_authority_host() -> String {
    DEFAULT_AUTHORITY_HOST.to_string()
}

fn default_management_endpoint() -> String {
    DEFAULT_MANAGEMENT_ENDPOINT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    fn sample_profile() -> Profile {
        Profile::new("tenant-1", "client-1", "secret-1", "sub-1")
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        let mut profile = sample_profile();
        profile.region = Some("westeurope".to_string());
        profile.polling = Some(PollingConfig {
            timeout_secs: 600,
            interval_secs: 5,
        });
        config.set_profile("dev".to_string(), profile);
        config.default_profile = Some("dev".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.default_profile.as_deref(), Some("dev"));
        let dev = deserialized.profile("dev").unwrap();
        assert_eq!(dev.region.as_deref(), Some("westeurope"));
        assert_eq!(dev.polling().interval_secs, 5);
        assert_eq!(dev.management_endpoint, DEFAULT_MANAGEMENT_ENDPOINT);
    }

    #[test]
    fn test_endpoints_default_when_absent() {
        let toml = r#"
            [profiles.dev]
            tenant_id = "t"
            client_id = "c"
            client_secret = "s"
            subscription_id = "sub"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let dev = config.profile("dev").unwrap();
        assert_eq!(dev.authority_host, DEFAULT_AUTHORITY_HOST);
        assert_eq!(dev.management_endpoint, DEFAULT_MANAGEMENT_ENDPOINT);
        assert!(dev.region.is_none());
        assert_eq!(dev.polling(), PollingConfig::default());
    }

    #[test]
    fn test_resolve_profile_order() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), sample_profile());
        config.set_profile("alpha".to_string(), sample_profile());

        // First alphabetically
        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        // Default beats alphabetical
        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");

        // Explicit beats default
        assert_eq!(config.resolve_profile(Some("alpha")).unwrap(), "alpha");

        // Unknown explicit name
        assert!(matches!(
            config.resolve_profile(Some("missing")),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_profile_empty_config() {
        let err = Config::default().resolve_profile(None).unwrap_err();
        assert!(err.to_string().contains("flexctl profile set"));
    }

    #[test]
    fn test_remove_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("dev".to_string(), sample_profile());
        config.default_profile = Some("dev".to_string());

        assert!(config.remove_profile("dev").is_some());
        assert!(config.default_profile.is_none());
        assert!(config.remove_profile("dev").is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let profile = sample_profile();
        let debug = format!("{:?}", profile);
        assert!(!debug.contains("secret-1"));

        let principal = profile.resolve_principal(false).unwrap();
        assert!(!format!("{:?}", principal).contains("secret-1"));
    }

    #[test]
    #[serial]
    fn test_resolve_principal_env_override() {
        unsafe {
            std::env::set_var(ENV_SUBSCRIPTION_ID, "sub-from-env");
            std::env::remove_var(ENV_SECRET);
            std::env::set_var(ENV_CLIENT_SECRET, "secret-from-env");
        }

        let profile = sample_profile();
        let with_env = profile.resolve_principal(true).unwrap();
        assert_eq!(with_env.subscription_id, "sub-from-env");
        assert_eq!(with_env.client_secret, "secret-from-env");
        assert_eq!(with_env.tenant_id, "tenant-1");

        let isolated = profile.resolve_principal(false).unwrap();
        assert_eq!(isolated.subscription_id, "sub-1");
        assert_eq!(isolated.client_secret, "secret-1");

        unsafe {
            std::env::remove_var(ENV_SUBSCRIPTION_ID);
            std::env::remove_var(ENV_CLIENT_SECRET);
        }
    }

    #[test]
    #[serial]
    fn test_principal_from_env() {
        unsafe {
            std::env::set_var(ENV_TENANT_ID, "t");
            std::env::set_var(ENV_CLIENT_ID, "c");
            std::env::set_var(ENV_SECRET, "s");
            std::env::remove_var(ENV_SUBSCRIPTION_ID);
        }

        assert!(!ServicePrincipal::env_is_complete());
        let err = ServicePrincipal::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_SUBSCRIPTION_ID));

        unsafe {
            std::env::set_var(ENV_SUBSCRIPTION_ID, "sub");
        }
        assert!(ServicePrincipal::env_is_complete());
        let principal = ServicePrincipal::from_env().unwrap();
        assert_eq!(principal.client_secret, "s");

        unsafe {
            for var in [ENV_TENANT_ID, ENV_CLIENT_ID, ENV_SECRET, ENV_SUBSCRIPTION_ID] {
                std::env::remove_var(var);
            }
        }
    }
}
