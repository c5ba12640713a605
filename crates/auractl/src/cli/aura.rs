//! Aura resource command definitions

use clap::{ArgGroup, Subcommand};

/// Tenant commands
#[derive(Subcommand, Debug)]
pub enum TenantCommands {
    /// List tenants available to the credential
    #[command(visible_alias = "ls")]
    List,

    /// Show tenant details, including the instance configurations it allows
    Get {
        /// Tenant ID
        id: String,
    },
}

/// Instance commands
#[derive(Subcommand, Debug)]
pub enum InstanceCommands {
    /// List instances
    #[command(visible_alias = "ls")]
    List {
        /// Only list instances in this tenant
        #[arg(long)]
        tenant_id: Option<String>,
    },

    /// Show instance details
    Get {
        /// Instance ID
        id: String,
    },

    /// Create an instance
    #[command(after_help = "EXAMPLES:
    # Free instance on GCP (memory and region default to 1GB / europe-west1)
    auractl instance create --name demo --type free-db --cloud-provider gcp

    # Professional instance, waiting until it is running
    auractl instance create --name prod --type professional-db \\
        --cloud-provider aws --region eu-west-1 --memory 8GB --await
")]
    Create {
        /// Instance name
        #[arg(long)]
        name: String,

        /// Instance type (free-db, professional-db, enterprise-db, business-critical, ...)
        #[arg(long = "type")]
        instance_type: String,

        /// Cloud provider (gcp, aws, azure)
        #[arg(long)]
        cloud_provider: String,

        /// Tenant to create the instance in (defaults to the default-tenant setting)
        #[arg(long)]
        tenant_id: Option<String>,

        /// Region (required for types other than free-db)
        #[arg(long)]
        region: Option<String>,

        /// Memory size, e.g. 8GB (required for types other than free-db)
        #[arg(long)]
        memory: Option<String>,

        /// Neo4j version
        #[arg(long, default_value = "5")]
        version: String,

        /// Customer managed key to encrypt the instance with
        #[arg(long)]
        customer_managed_key_id: Option<String>,

        /// Wait until the instance is running
        #[arg(long = "await")]
        wait: bool,
    },

    /// Rename or resize an instance
    #[command(group(ArgGroup::new("changes").required(true).multiple(true).args(["name", "memory"])))]
    Update {
        /// Instance ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New memory size, e.g. 16GB
        #[arg(long)]
        memory: Option<String>,

        /// Wait until the update has been applied
        #[arg(long = "await")]
        wait: bool,
    },

    /// Delete an instance
    #[command(visible_alias = "rm")]
    Delete {
        /// Instance ID
        id: String,

        /// Wait until the instance is gone
        #[arg(long = "await")]
        wait: bool,
    },

    /// Pause a running instance
    Pause {
        /// Instance ID
        id: String,

        /// Wait until the instance is paused
        #[arg(long = "await")]
        wait: bool,
    },

    /// Resume a paused instance
    Resume {
        /// Instance ID
        id: String,

        /// Wait until the instance is running
        #[arg(long = "await")]
        wait: bool,
    },

    /// Replace an instance's data with data from another instance or snapshot
    #[command(long_about = "Replace an instance's data with data from another instance or snapshot.

With only --source-instance-id, a fresh snapshot of that instance is taken and used.
With --source-snapshot-id, that snapshot is used; it belongs to --source-instance-id
when given, otherwise to the instance being overwritten.")]
    #[command(group(ArgGroup::new("source").required(true).multiple(true).args(["source_instance_id", "source_snapshot_id"])))]
    Overwrite {
        /// Instance ID to overwrite
        id: String,

        /// Instance to copy data from
        #[arg(long)]
        source_instance_id: Option<String>,

        /// Snapshot to restore from
        #[arg(long)]
        source_snapshot_id: Option<String>,

        /// Wait until the overwrite has finished
        #[arg(long = "await")]
        wait: bool,
    },

    /// Snapshot operations
    #[command(subcommand)]
    Snapshot(SnapshotCommands),
}

/// Snapshot commands
#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    /// List snapshots of an instance
    #[command(visible_alias = "ls")]
    List {
        /// Instance ID
        #[arg(long)]
        instance_id: String,

        /// Only list snapshots taken on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show snapshot details
    Get {
        /// Snapshot ID
        id: String,

        /// Instance ID
        #[arg(long)]
        instance_id: String,
    },

    /// Take an on-demand snapshot
    Create {
        /// Instance ID
        #[arg(long)]
        instance_id: String,

        /// Wait until the snapshot has completed
        #[arg(long = "await")]
        wait: bool,
    },
}

/// Data API commands
#[derive(Subcommand, Debug)]
pub enum DataApiCommands {
    /// GraphQL Data API operations
    #[command(subcommand)]
    Graphql(GraphqlCommands),
}

/// GraphQL Data API commands
#[derive(Subcommand, Debug)]
pub enum GraphqlCommands {
    /// List GraphQL Data APIs of an instance
    #[command(visible_alias = "ls")]
    List {
        /// Instance ID
        #[arg(long)]
        instance_id: String,
    },

    /// Show GraphQL Data API details
    Get {
        /// Data API ID
        id: String,

        /// Instance ID
        #[arg(long)]
        instance_id: String,
    },

    /// Create a GraphQL Data API
    #[command(after_help = "EXAMPLES:
    # Create from a schema file, waiting until it is ready
    auractl data-api graphql create --instance-id YOUR_INSTANCE_ID --name movies \\
        --instance-username neo4j --instance-password YOUR_PASSWORD \\
        --type-definitions-file ./movies.graphql --await
")]
    #[command(group(ArgGroup::new("type_defs").required(true).args(["type_definitions", "type_definitions_file"])))]
    Create {
        /// Instance ID the Data API serves
        #[arg(long)]
        instance_id: String,

        /// Data API name
        #[arg(long)]
        name: String,

        /// Database username the Data API connects with
        #[arg(long)]
        instance_username: String,

        /// Database password the Data API connects with
        #[arg(long, env = "AURA_INSTANCE_PASSWORD", hide_env_values = true)]
        instance_password: String,

        /// GraphQL type definitions, base64 encoded
        #[arg(long)]
        type_definitions: Option<String>,

        /// Path to a .graphql file with the type definitions
        #[arg(long)]
        type_definitions_file: Option<String>,

        /// Enable the GraphQL subgraph feature
        #[arg(long)]
        feature_subgraph_enabled: Option<bool>,

        /// Wait until the Data API is ready
        #[arg(long = "await")]
        wait: bool,
    },

    /// Change a GraphQL Data API
    #[command(group(ArgGroup::new("type_defs").args(["type_definitions", "type_definitions_file"])))]
    Update {
        /// Data API ID
        id: String,

        /// Instance ID
        #[arg(long)]
        instance_id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Database username the Data API connects with
        #[arg(long)]
        instance_username: Option<String>,

        /// Database password the Data API connects with
        #[arg(long)]
        instance_password: Option<String>,

        /// GraphQL type definitions, base64 encoded
        #[arg(long)]
        type_definitions: Option<String>,

        /// Path to a .graphql file with the type definitions
        #[arg(long)]
        type_definitions_file: Option<String>,

        /// Enable or disable the GraphQL subgraph feature
        #[arg(long)]
        feature_subgraph_enabled: Option<bool>,

        /// Wait until the update has been applied
        #[arg(long = "await")]
        wait: bool,
    },

    /// Delete a GraphQL Data API
    #[command(visible_alias = "rm")]
    Delete {
        /// Data API ID
        id: String,

        /// Instance ID
        #[arg(long)]
        instance_id: String,

        /// Wait until the Data API is gone
        #[arg(long = "await")]
        wait: bool,
    },
}

/// Customer managed key commands
#[derive(Subcommand, Debug)]
pub enum CustomerManagedKeyCommands {
    /// List customer managed keys
    #[command(visible_alias = "ls")]
    List {
        /// Only list keys in this tenant
        #[arg(long)]
        tenant_id: Option<String>,
    },

    /// Show customer managed key details
    Get {
        /// Key ID
        id: String,
    },

    /// Register a key from your cloud provider's key management service
    Create {
        /// Key name
        #[arg(long)]
        name: String,

        /// Key identifier in the cloud provider (ARN, key URI, ...)
        #[arg(long)]
        key_id: String,

        /// Cloud provider (gcp, aws, azure)
        #[arg(long)]
        cloud_provider: String,

        /// Instance type the key may be used for
        #[arg(long)]
        instance_type: String,

        /// Region of the key
        #[arg(long)]
        region: String,

        /// Tenant (defaults to the default-tenant setting)
        #[arg(long)]
        tenant_id: Option<String>,

        /// Wait until the key is ready
        #[arg(long = "await")]
        wait: bool,
    },

    /// Delete a customer managed key
    #[command(visible_alias = "rm")]
    Delete {
        /// Key ID
        id: String,
    },
}
