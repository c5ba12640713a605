//! CLI structure and command definitions
//!
//! Defines the command-line interface using clap in two layers:
//! 1. Raw API access (`api` command)
//! 2. Resource commands (`instance`, `tenant`, `data-api`, ...)

use auractl_core::OutputMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod aura;

pub use aura::*;

/// Neo4j Aura management CLI
#[derive(Parser, Debug)]
#[command(name = "auractl")]
#[command(version, about = "Manage Neo4j Aura instances, snapshots and Data APIs")]
#[command(long_about = "
Manage Neo4j Aura instances, snapshots and Data APIs

EXAMPLES:
    # Register API client credentials (the secret is prompted for)
    auractl credential add --name prod --client-id YOUR_CLIENT_ID

    # List instances as a table
    auractl instance list -o table

    # Create a free instance and wait until it is running
    auractl instance create --name demo --type free-db --cloud-provider gcp --await

    # Direct API access
    auractl api get /tenants

For more help on a specific command, run:
    auractl <command> --help
")]
pub struct Cli {
    /// Directory holding config.toml and credentials.json
    #[arg(long, global = true, env = "AURA_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Credential to authenticate with (defaults to the default credential)
    #[arg(long, short = 'c', global = true, env = "AURA_CREDENTIAL")]
    pub credential: Option<String>,

    /// Override the management API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override the OAuth token endpoint
    #[arg(long, global = true)]
    pub auth_url: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum)]
    pub output: Option<OutputMode>,

    /// Seconds between status checks when using --await
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,

    /// Status checks before giving up when using --await
    #[arg(long, global = true)]
    pub poll_max_retries: Option<u32>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Raw API access - direct REST endpoint calls
    #[command(after_help = "EXAMPLES:
    # GET request
    auractl api get /tenants

    # POST request with JSON data
    auractl api post /instances/YOUR_INSTANCE_ID/snapshots --data '{}'

    # PATCH request from file
    auractl api patch /instances/YOUR_INSTANCE_ID --data @update.json
")]
    Api {
        /// HTTP method
        #[arg(value_parser = parse_http_method)]
        method: HttpMethod,

        /// API endpoint path relative to the base URL (e.g., /instances)
        path: String,

        /// Request body (JSON string or @file)
        #[arg(long)]
        data: Option<String>,
    },

    /// API client credential management
    #[command(subcommand, visible_alias = "cred")]
    #[command(after_help = "EXAMPLES:
    # Add a credential (secret is prompted for)
    auractl credential add --name prod --client-id YOUR_CLIENT_ID

    # List credentials
    auractl credential list

    # Switch the default credential
    auractl credential use staging

    # Forget the cached access token
    auractl credential logout
")]
    Credential(CredentialCommands),

    /// Read and change settings in config.toml
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Tenant (project) operations
    #[command(subcommand)]
    Tenant(TenantCommands),

    /// Instance operations
    #[command(subcommand, visible_alias = "inst")]
    Instance(InstanceCommands),

    /// Data API operations
    #[command(subcommand)]
    DataApi(DataApiCommands),

    /// Customer managed encryption key operations
    #[command(subcommand, visible_alias = "cmk")]
    CustomerManagedKey(CustomerManagedKeyCommands),

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    Elvish,
}

/// HTTP methods for raw API access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Parse HTTP method case-insensitively
fn parse_http_method(s: &str) -> Result<HttpMethod, String> {
    match s.to_lowercase().as_str() {
        "get" => Ok(HttpMethod::Get),
        "post" => Ok(HttpMethod::Post),
        "put" => Ok(HttpMethod::Put),
        "patch" => Ok(HttpMethod::Patch),
        "delete" => Ok(HttpMethod::Delete),
        _ => Err(format!(
            "invalid HTTP method: {} (valid: get, post, put, patch, delete)",
            s
        )),
    }
}

impl HttpMethod {
    pub fn as_method(self) -> auractl_core::Method {
        match self {
            HttpMethod::Get => auractl_core::Method::GET,
            HttpMethod::Post => auractl_core::Method::POST,
            HttpMethod::Put => auractl_core::Method::PUT,
            HttpMethod::Patch => auractl_core::Method::PATCH,
            HttpMethod::Delete => auractl_core::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Patch => write!(f, "PATCH"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Credential management commands
#[derive(Subcommand, Debug)]
pub enum CredentialCommands {
    /// Add a named client id and secret
    #[command(visible_alias = "create")]
    Add {
        /// Name to refer to this credential by
        #[arg(long)]
        name: String,

        /// OAuth client id from the Aura console
        #[arg(long)]
        client_id: String,

        /// OAuth client secret (prompted for when omitted)
        #[arg(long, env = "AURA_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
    },

    /// List configured credentials
    #[command(visible_alias = "ls")]
    List,

    /// Make a credential the default
    Use {
        /// Credential name
        name: String,
    },

    /// Remove a credential
    #[command(visible_alias = "rm", visible_alias = "delete")]
    Remove {
        /// Credential name
        name: String,
    },

    /// Discard the cached access token, keeping the client id and secret
    Logout {
        /// Credential name (defaults to the active credential)
        name: Option<String>,
    },
}

/// Config file commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print a single setting
    Get {
        /// Setting name (auth-url, base-url, default-tenant, output, poll-interval, poll-max-retries)
        key: String,
    },

    /// Change a single setting
    Set {
        /// Setting name
        key: String,

        /// New value (an empty string clears default-tenant)
        value: String,
    },

    /// Print all settings
    #[command(visible_alias = "ls")]
    List,
}
