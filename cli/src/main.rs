//! VCluster CLI
//!
//! Command-line interface for the VCluster allocation service.
//!
//! # Usage
//!
//! ```bash
//! vcluster user create jdoe --first Jane --last Doe --email jdoe@lab.edu --organization "Example Lab"
//! vcluster project create myproject --owner jdoe
//! vcluster allocation create jdoe.cluster1 --owner jdoe --resource cluster1 --accountname jdoe
//! vcluster request list --format json
//! vcluster pairing request factory.example.org
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use vcluster_client::{Caller, ClientApi, ClientError, HttpInfoStore};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "vcluster")]
#[command(version = "0.1.0")]
#[command(about = "VCluster Command Line Interface", long_about = None)]
struct Cli {
    /// Info-service endpoint URL
    #[arg(long, env = "VCLUSTER_STORE_URL")]
    store_url: Option<String>,

    /// User to authorize operations as (omit for privileged access)
    #[arg(long, env = "VCLUSTER_POLICY_USER")]
    policy_user: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    format: output::OutputFormat,

    /// Named configuration profile (reads config.<name>.toml)
    #[arg(long, short)]
    config: Option<String>,

    /// Info-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Debug-level logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Manage compute resources
    Resource {
        #[command(subcommand)]
        action: ResourceCommands,
    },
    /// Manage allocations
    Allocation {
        #[command(subcommand)]
        action: AllocationCommands,
    },
    /// Manage node hardware descriptions
    Nodeinfo {
        #[command(subcommand)]
        action: NodeinfoCommands,
    },
    /// Manage nodesets
    Nodeset {
        #[command(subcommand)]
        action: NodesetCommands,
    },
    /// Manage cluster templates
    Cluster {
        #[command(subcommand)]
        action: ClusterCommands,
    },
    /// Manage software environments
    Environment {
        #[command(subcommand)]
        action: EnvironmentCommands,
    },
    /// Manage cluster-instantiation requests
    Request {
        #[command(subcommand)]
        action: RequestCommands,
    },
    /// X.509 credential pairing
    Pairing {
        #[command(subcommand)]
        action: PairingCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        name: String,
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        organization: String,
    },
    /// List all users
    List,
    /// Get user details
    Get { name: String },
    /// Delete a user
    Delete { name: String },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Create a new project
    Create {
        name: String,
        #[arg(long)]
        owner: String,
        /// Additional members (the owner is always a member)
        #[arg(long)]
        member: Vec<String>,
    },
    /// List projects
    List {
        /// Only projects owned by this user
        #[arg(long)]
        owner: Option<String>,
        /// Only projects this user is a member of
        #[arg(long)]
        member: Option<String>,
    },
    /// Get project details
    Get { name: String },
    /// Delete a project
    Delete { name: String },
    /// Add a member to a project
    AddUser { user: String, project: String },
    /// Remove a member from a project
    RemoveUser { user: String, project: String },
    /// Attach an allocation to a project
    AddAllocation { allocation: String, project: String },
    /// Detach an allocation from a project
    RemoveAllocation { allocation: String, project: String },
}

#[derive(Subcommand)]
enum ResourceCommands {
    /// Create a new resource
    Create {
        name: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        accesstype: String,
        #[arg(long)]
        accessmethod: String,
        #[arg(long)]
        accessflavor: String,
        #[arg(long)]
        accesshost: String,
        #[arg(long)]
        accessport: String,
    },
    /// List all resources
    List,
    /// Get resource details
    Get { name: String },
    /// Delete a resource
    Delete { name: String },
}

#[derive(Subcommand)]
enum AllocationCommands {
    /// Create a new allocation
    Create {
        name: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        resource: String,
        #[arg(long)]
        accountname: String,
    },
    /// List all allocations
    List,
    /// Get allocation details
    Get { name: String },
    /// Delete an allocation
    Delete { name: String },
    /// Print an allocation's decoded public token
    Pubtoken { name: String },
}

#[derive(Subcommand)]
enum NodeinfoCommands {
    /// Create a node hardware description
    Create {
        name: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        cores: Option<u32>,
        #[arg(long)]
        memory_mb: Option<u64>,
        #[arg(long)]
        storage_mb: Option<u64>,
        #[arg(long)]
        native_os: Option<String>,
    },
    /// List all node descriptions
    List,
    /// Get node description details
    Get { name: String },
    /// Delete a node description
    Delete { name: String },
}

#[derive(Subcommand)]
enum NodesetCommands {
    /// Create a nodeset
    Create {
        name: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        node_number: u32,
        #[arg(long)]
        app_type: String,
        #[arg(long, value_enum)]
        app_role: AppRoleArg,
    },
    /// List all nodesets
    List,
    /// Get nodeset details
    Get { name: String },
    /// Delete a nodeset
    Delete { name: String },
}

/// Nodeset role, command-line shape.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum AppRoleArg {
    HeadNode,
    WorkerNodes,
}

impl From<AppRoleArg> for vcluster_model::AppRole {
    fn from(arg: AppRoleArg) -> Self {
        match arg {
            AppRoleArg::HeadNode => vcluster_model::AppRole::HeadNode,
            AppRoleArg::WorkerNodes => vcluster_model::AppRole::WorkerNodes,
        }
    }
}

#[derive(Subcommand)]
enum ClusterCommands {
    /// Create a cluster template
    Create {
        name: String,
        #[arg(long)]
        owner: String,
        /// Nodeset names, in instantiation order
        #[arg(long)]
        nodeset: Vec<String>,
    },
    /// List cluster templates
    List,
    /// Get cluster details
    Get { name: String },
    /// Delete a cluster template
    Delete { name: String },
    /// Append a nodeset to a cluster
    AddNodeset { nodeset: String, cluster: String },
    /// Remove a nodeset from a cluster
    RemoveNodeset { nodeset: String, cluster: String },
}

#[derive(Subcommand)]
enum EnvironmentCommands {
    /// Create a software environment
    Create {
        name: String,
        #[arg(long)]
        owner: String,
        /// Packages to install
        #[arg(long)]
        package: Vec<String>,
        #[arg(long)]
        command: Option<String>,
        #[arg(long)]
        required_os: Option<String>,
    },
    /// List all environments
    List,
    /// Get environment details
    Get { name: String },
    /// Delete an environment
    Delete { name: String },
}

#[derive(Subcommand)]
enum RequestCommands {
    /// Create a cluster-instantiation request
    Create {
        name: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        project: String,
        #[arg(long)]
        cluster: Option<String>,
        /// Allocations to draw from (must be attached to the project)
        #[arg(long)]
        allocation: Vec<String>,
        #[arg(long)]
        environment: Vec<String>,
    },
    /// List all requests
    List,
    /// Get request details
    Get { name: String },
    /// Delete a request and its cloned cluster and nodesets
    Delete { name: String },
    /// Ask the provisioner to tear the cluster down
    Terminate { name: String },
    /// Print raw provisioning status
    Status { name: String },
    /// Print lifecycle state and reason
    State { name: String },
    /// Print a decoded embedded configuration
    Conf {
        name: String,
        #[arg(long, value_enum, default_value = "queues")]
        kind: ConfKindArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfKindArg {
    Queues,
    Auth,
}

impl From<ConfKindArg> for vcluster_client::ConfKind {
    fn from(arg: ConfKindArg) -> Self {
        match arg {
            ConfKindArg::Queues => vcluster_client::ConfKind::Queues,
            ConfKindArg::Auth => vcluster_client::ConfKind::Auth,
        }
    }
}

#[derive(Subcommand)]
enum PairingCommands {
    /// Request a pairing; prints the one-time code
    Request { common_name: String },
    /// Retrieve the certificate and key for a pairing code
    Retrieve { code: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

fn init_logging(cli: &Cli) {
    let default = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(err: &ClientError) -> i32 {
    if err.is_conflict() {
        2
    } else if err.is_missing() {
        3
    } else {
        1
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = config::Config::load(cli.config.as_deref()).unwrap_or_default();
    let store_url = cli
        .store_url
        .clone()
        .or_else(|| config.store_url.clone())
        .unwrap_or_else(|| "https://vcluster.example.org:30443".to_string());
    let policy_user = cli.policy_user.clone().or_else(|| config.policy_user.clone());
    let caller = match policy_user {
        Some(user) => Caller::User(user),
        None => Caller::System,
    };

    let api = ClientApi::new(Arc::new(HttpInfoStore::new(&store_url)));
    let format = cli.format;

    let result = match cli.command {
        Commands::User { action } => commands::user::handle(action, &api, &caller, format).await,
        Commands::Project { action } => {
            commands::project::handle(action, &api, &caller, format).await
        }
        Commands::Resource { action } => {
            commands::resource::handle(action, &api, &caller, format).await
        }
        Commands::Allocation { action } => {
            commands::allocation::handle(action, &api, &caller, format).await
        }
        Commands::Nodeinfo { action } => {
            commands::nodeinfo::handle(action, &api, &caller, format).await
        }
        Commands::Nodeset { action } => {
            commands::nodeset::handle(action, &api, &caller, format).await
        }
        Commands::Cluster { action } => {
            commands::cluster::handle(action, &api, &caller, format).await
        }
        Commands::Environment { action } => {
            commands::environment::handle(action, &api, &caller, format).await
        }
        Commands::Request { action } => {
            commands::request::handle(action, &api, &caller, format).await
        }
        Commands::Pairing { action } => commands::pairing::handle(action, &api).await,
        Commands::Config { action } => {
            if let Err(e) = commands::config::handle(action, config).await {
                eprintln!("{} {}", "Error:".red(), e);
                std::process::exit(1);
            }
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(exit_code(&e));
    }
}
