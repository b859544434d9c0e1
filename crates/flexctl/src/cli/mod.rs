//! CLI structure and command definitions

use clap::{Args, Parser, Subcommand};

/// Azure MySQL flexible server lifecycle tool
#[derive(Parser, Debug)]
#[command(name = "flexctl")]
#[command(
    version,
    about = "Provision, configure and tear down Azure MySQL flexible servers"
)]
#[command(long_about = "
Provision, configure and tear down Azure MySQL flexible servers

`flexctl run` creates a resource group and a flexible server, grows its
storage, exercises a firewall rule and a server parameter, then deletes
everything again. If any step fails the resource group is deleted.

EXAMPLES:
    # Use service principal credentials from the environment
    export AZURE_TENANT_ID=... AZURE_CLIENT_ID=... AZURE_SECRET=... AZURE_SUBSCRIPTION_ID=...
    flexctl run

    # Or store them in a profile
    flexctl profile set dev --tenant-id T --client-id C --subscription-id S
    flexctl run --profile dev --region westeurope

    # Rehearse the run without touching Azure
    flexctl run --dry-run

    # Machine-readable report
    flexctl run -o json

For more help on a specific command, run:
    flexctl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "FLEXCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "FLEXCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress lines for humans
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

impl OutputFormat {
    /// Structured formats keep stdout for the result document
    pub fn is_structured(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full provision/configure/teardown lifecycle
    #[command(after_help = "EXAMPLES:
    # Defaults: northeurope, Standard_D16ds_v4, MySQL 5.7, 512 GiB growing to 1 TiB
    flexctl run

    # Different region and SKU
    flexctl run --region westeurope --sku-name Standard_B1ms --sku-tier Burstable

    # Pin the resource names instead of generating them
    flexctl run --resource-group rgMySqlDemo --server-name netserverdemo

    # Rehearse against an in-memory provider
    flexctl run --dry-run -o json
")]
    Run(RunArgs),

    /// Check whether a flexible server name is available
    #[command(name = "check-name")]
    CheckName {
        /// Server name to check
        name: String,
    },

    /// Delete a resource group left behind by a failed run
    Cleanup {
        /// Resource group to delete
        resource_group: String,

        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    Profile(ProfileCommands),

    /// Version information
    #[command(visible_alias = "ver")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Overrides for the lifecycle plan
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Region for the resource group and server
    #[arg(long)]
    pub region: Option<String>,

    /// Server SKU name
    #[arg(long)]
    pub sku_name: Option<String>,

    /// Server SKU tier
    #[arg(long)]
    pub sku_tier: Option<String>,

    /// MySQL engine version
    #[arg(long)]
    pub engine_version: Option<String>,

    /// Initial storage size in MB
    #[arg(long)]
    pub storage_mb: Option<u64>,

    /// Storage size in MB after the update step (must not be smaller)
    #[arg(long)]
    pub updated_storage_mb: Option<u64>,

    /// Administrator login
    #[arg(long)]
    pub admin_login: Option<String>,

    /// Administrator password (generated when omitted)
    #[arg(long, env = "FLEXCTL_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Use this resource group name instead of a generated one
    #[arg(long)]
    pub resource_group: Option<String>,

    /// Use this server name instead of a generated one
    #[arg(long)]
    pub server_name: Option<String>,

    /// Firewall rule name
    #[arg(long)]
    pub firewall_rule: Option<String>,

    /// Initial firewall range, `START-END` or a single address
    #[arg(long, value_name = "RANGE")]
    pub firewall_range: Option<String>,

    /// Firewall range after the update step
    #[arg(long, value_name = "RANGE")]
    pub updated_firewall_range: Option<String>,

    /// Server parameter to change
    #[arg(long)]
    pub configuration: Option<String>,

    /// New value for the server parameter
    #[arg(long)]
    pub configuration_value: Option<String>,

    /// Source recorded with the new value
    #[arg(long)]
    pub configuration_source: Option<String>,

    /// Seconds to wait for each long-running operation
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub wait_timeout: Option<u64>,

    /// Seconds between status checks of a long-running operation
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub wait_interval: Option<u64>,

    /// Run against an in-memory provider instead of Azure
    #[arg(long)]
    pub dry_run: bool,
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add")]
    #[command(after_help = "EXAMPLES:
    # Create a profile (the client secret is prompted for)
    flexctl profile set dev \\
        --tenant-id 72f988bf-0000-0000-0000-2d7cd011db47 \\
        --client-id 5b0a1e3c-0000-0000-0000-9f1c2d3e4f50 \\
        --subscription-id 0b1f6471-0000-0000-0000-37c5d1f5e2a9

    # Sovereign cloud endpoints
    flexctl profile set china --tenant-id T --client-id C --subscription-id S \\
        --authority-host https://login.chinacloudapi.cn \\
        --management-endpoint https://management.chinacloudapi.cn
")]
    Set {
        /// Profile name
        name: String,

        /// Directory (tenant) id
        #[arg(long)]
        tenant_id: String,

        /// Application (client) id of the service principal
        #[arg(long)]
        client_id: String,

        /// Client secret (prompted for when omitted)
        #[arg(long)]
        client_secret: Option<String>,

        /// Subscription to manage
        #[arg(long)]
        subscription_id: String,

        /// Identity endpoint
        #[arg(long)]
        authority_host: Option<String>,

        /// Resource Manager endpoint
        #[arg(long)]
        management_endpoint: Option<String>,

        /// Default region for `run`
        #[arg(long)]
        region: Option<String>,

        /// Seconds to wait for each long-running operation
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        wait_timeout: Option<u64>,

        /// Seconds between status checks
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        wait_interval: Option<u64>,

        /// Make this the default profile
        #[arg(long)]
        default: bool,

        /// Store the client secret in the OS keyring instead of the config file
        #[cfg(feature = "secure-storage")]
        #[arg(long)]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm")]
    Remove {
        /// Profile name to remove
        name: String,

        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Set the default profile
    Default {
        /// Profile name
        name: String,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Friendly Interactive Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    /// Elvish
    Elvish,
}
