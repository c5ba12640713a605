use anyhow::Result;
use auractl_core::{Config, ConfigOverrides};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::AuraCtlError;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Completions only need the command tree, so a broken config must not block them
    if let Commands::Completions { shell } = &cli.command {
        debug!("Generating completions for {:?}", shell);
        generate_completions(*shell);
        return Ok(());
    }

    let conn_mgr = match build_connection_manager(&cli) {
        Ok(conn_mgr) => conn_mgr,
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(1);
        }
    };

    if let Err(e) = execute_command(&cli, &conn_mgr) {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "auractl=warn,auractl_core=warn",
            1 => "auractl=info,auractl_core=info",
            2 => "auractl=debug,auractl_core=debug",
            _ => "auractl=trace,auractl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

/// Resolve the config directory and layer environment and flag overrides on
/// top of the stored configuration
fn build_connection_manager(cli: &Cli) -> Result<ConnectionManager, AuraCtlError> {
    let config_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => Config::config_dir()?,
    };
    debug!("Loading config from {}", config_dir.display());

    let flags = ConfigOverrides {
        base_url: cli.base_url.clone(),
        auth_url: cli.auth_url.clone(),
        output: cli.output,
        poll_interval: cli.poll_interval,
        poll_max_retries: cli.poll_max_retries,
    };
    let overrides = ConfigOverrides::from_env()?.merge(flags);
    let config = Config::load_from_dir(&config_dir)?.with_overrides(&overrides)?;

    Ok(ConnectionManager::new(
        config,
        config_dir,
        cli.credential.clone(),
    ))
}

fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), AuraCtlError> {
    // Log command execution with sanitized parameters
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }

        Commands::Api { method, path, data } => {
            info!(
                "API call: {} {} {}",
                method,
                path,
                if data.is_some() {
                    "with data"
                } else {
                    "no data"
                }
            );
            commands::api::handle_api_command(conn_mgr, method, path, data.as_deref())
        }

        Commands::Credential(cmd) => commands::credential::handle_credential_command(cmd, conn_mgr),
        Commands::Config(cmd) => commands::config::handle_config_command(cmd, conn_mgr),
        Commands::Tenant(cmd) => commands::tenant::handle_tenant_command(cmd, conn_mgr),
        Commands::Instance(cmd) => commands::instance::handle_instance_command(cmd, conn_mgr),
        Commands::DataApi(cli::DataApiCommands::Graphql(cmd)) => {
            commands::graphql::handle_graphql_command(cmd, conn_mgr)
        }
        Commands::CustomerManagedKey(cmd) => {
            commands::customer_managed_key::handle_customer_managed_key_command(cmd, conn_mgr)
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for human-readable logging (without sensitive data)
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Api { method, path, .. } => format!("api {} {}", method, path),
        Commands::Credential(cmd) => {
            use cli::CredentialCommands::*;
            match cmd {
                Add {
                    name, client_id, ..
                } => format!(
                    "credential add {} --client-id {} [secret redacted]",
                    name, client_id
                ),
                List => "credential list".to_string(),
                Use { name } => format!("credential use {}", name),
                Remove { name } => format!("credential remove {}", name),
                Logout { name } => match name {
                    Some(name) => format!("credential logout {}", name),
                    None => "credential logout".to_string(),
                },
            }
        }
        Commands::Config(cmd) => {
            use cli::ConfigCommands::*;
            match cmd {
                Get { key } => format!("config get {}", key),
                Set { key, .. } => format!("config set {}", key),
                List => "config list".to_string(),
            }
        }
        Commands::Tenant(cmd) => format!("tenant {:?}", cmd),
        Commands::Instance(cmd) => format!("instance {:?}", cmd),
        Commands::DataApi(cli::DataApiCommands::Graphql(cmd)) => {
            use cli::GraphqlCommands::*;
            match cmd {
                List { instance_id } => {
                    format!("data-api graphql list --instance-id {}", instance_id)
                }
                Get { id, instance_id } => {
                    format!("data-api graphql get {} --instance-id {}", id, instance_id)
                }
                Create {
                    instance_id, name, ..
                } => format!(
                    "data-api graphql create {} --instance-id {} [password redacted]",
                    name, instance_id
                ),
                Update {
                    id, instance_id, ..
                } => format!(
                    "data-api graphql update {} --instance-id {} [password redacted]",
                    id, instance_id
                ),
                Delete {
                    id, instance_id, ..
                } => format!("data-api graphql delete {} --instance-id {}", id, instance_id),
            }
        }
        Commands::CustomerManagedKey(cmd) => format!("customer-managed-key {:?}", cmd),
    }
}
